use quiz_core::model::{Quiz, QuizId, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_quiz_row, ser, write_err};
use crate::repository::{QuizRepository, StorageError};

const QUIZ_COLUMNS: &str = "id, user_id, material_id, title, description, questions, difficulty_level, time_limit, is_published, created_at";

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let questions = serde_json::to_string(quiz.questions()).map_err(ser)?;
        let published = i64::from(quiz.is_published());

        sqlx::query(
            r"
            INSERT INTO quizzes (id, user_id, material_id, title, description, questions, difficulty_level, time_limit, is_published, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(quiz.id().to_string())
        .bind(quiz.user_id().to_string())
        .bind(quiz.material_id().map(|m| m.to_string()))
        .bind(quiz.title())
        .bind(quiz.description())
        .bind(questions)
        .bind(quiz.difficulty().as_str())
        .bind(quiz.time_limit_minutes().map(i64::from))
        .bind(published)
        .bind(quiz.created_at())
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        let row = sqlx::query(&format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = ?1"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_quiz_row).transpose()
    }

    async fn list_quizzes(&self, user_id: UserId) -> Result<Vec<Quiz>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE user_id = ?1 ORDER BY created_at DESC, id ASC"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut quizzes = Vec::with_capacity(rows.len());
        for row in rows {
            quizzes.push(map_quiz_row(&row)?);
        }
        Ok(quizzes)
    }

    async fn publish_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE quizzes SET is_published = 1 WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM quizzes WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(res.rows_affected() > 0)
    }
}
