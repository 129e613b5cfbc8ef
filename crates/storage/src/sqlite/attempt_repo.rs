use quiz_core::model::{Attempt, AttemptId, QuizId, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_attempt_row, ser, write_err};
use crate::repository::{AttemptRepository, StorageError};

const ATTEMPT_COLUMNS: &str = "id, quiz_id, user_id, answers, score, total_questions, correct_answers, time_spent, completed_at";

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn insert_attempt(&self, attempt: &Attempt) -> Result<(), StorageError> {
        let answers = serde_json::to_string(attempt.answers()).map_err(ser)?;

        sqlx::query(
            r"
            INSERT INTO attempts (id, quiz_id, user_id, answers, score, total_questions, correct_answers, time_spent, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(attempt.id().to_string())
        .bind(attempt.quiz_id().to_string())
        .bind(attempt.user_id().to_string())
        .bind(answers)
        .bind(attempt.score())
        .bind(i64::from(attempt.total_questions()))
        .bind(i64::from(attempt.correct_answers()))
        .bind(i64::from(attempt.time_spent_secs()))
        .bind(attempt.completed_at())
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        Ok(())
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<Option<Attempt>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE id = ?1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_attempt_row).transpose()
    }

    async fn list_attempts_for_user(&self, user_id: UserId) -> Result<Vec<Attempt>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE user_id = ?1 ORDER BY completed_at DESC, id ASC"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_attempt_row).collect()
    }

    async fn list_attempts_for_quiz(&self, quiz_id: QuizId) -> Result<Vec<Attempt>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE quiz_id = ?1 ORDER BY completed_at DESC, id ASC"
        ))
        .bind(quiz_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_attempt_row).collect()
    }
}
