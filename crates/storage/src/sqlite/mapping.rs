use quiz_core::model::{
    Answer, Attempt, AttemptId, DifficultyLevel, Material, MaterialDraft, MaterialId,
    MaterialStatus, MediaType, Question, Quiz, QuizDraft, QuizId, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Maps a write failure, turning primary-key and foreign-key violations into
/// `Conflict` and `NotFound`.
pub(crate) fn write_err(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StorageError::Conflict;
        }
        if db.is_foreign_key_violation() {
            return StorageError::NotFound;
        }
    }
    conn(e)
}

fn uuid_from_text(field: &'static str, s: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(s).map_err(|_| StorageError::Serialization(format!("invalid {field}: {s}")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn map_material_row(row: &SqliteRow) -> Result<Material, StorageError> {
    let id = MaterialId::from_uuid(uuid_from_text(
        "material id",
        &row.try_get::<String, _>("id").map_err(ser)?,
    )?);
    let user_id = UserId::from_uuid(uuid_from_text(
        "user id",
        &row.try_get::<String, _>("user_id").map_err(ser)?,
    )?);
    let file_size = u64::try_from(row.try_get::<i64, _>("file_size").map_err(ser)?)
        .map_err(|_| StorageError::Serialization("file_size sign overflow".into()))?;
    let mime: String = row.try_get("mime_type").map_err(ser)?;
    let status: String = row.try_get("status").map_err(ser)?;

    let draft = MaterialDraft {
        user_id,
        name: row.try_get("name").map_err(ser)?,
        original_name: row.try_get("original_name").map_err(ser)?,
        file_path: row.try_get("file_path").map_err(ser)?,
        file_size,
        media_type: MediaType::parse(&mime).map_err(ser)?,
    };

    Material::from_persisted(
        id,
        draft,
        status.parse::<MaterialStatus>().map_err(ser)?,
        row.try_get("extracted_text").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_quiz_row(row: &SqliteRow) -> Result<Quiz, StorageError> {
    let id = QuizId::from_uuid(uuid_from_text(
        "quiz id",
        &row.try_get::<String, _>("id").map_err(ser)?,
    )?);
    let user_id = UserId::from_uuid(uuid_from_text(
        "user id",
        &row.try_get::<String, _>("user_id").map_err(ser)?,
    )?);
    let material_id = row
        .try_get::<Option<String>, _>("material_id")
        .map_err(ser)?
        .map(|s| uuid_from_text("material id", &s).map(MaterialId::from_uuid))
        .transpose()?;
    let questions_json: String = row.try_get("questions").map_err(ser)?;
    let questions: Vec<Question> = serde_json::from_str(&questions_json).map_err(ser)?;
    let difficulty: String = row.try_get("difficulty_level").map_err(ser)?;
    let time_limit = row
        .try_get::<Option<i64>, _>("time_limit")
        .map_err(ser)?
        .map(|v| u32_from_i64("time_limit", v))
        .transpose()?;

    let draft = QuizDraft {
        user_id,
        material_id,
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        questions,
        difficulty: difficulty.parse::<DifficultyLevel>().map_err(ser)?,
        time_limit_minutes: time_limit,
    };

    Quiz::from_persisted(
        id,
        draft,
        row.try_get::<i64, _>("is_published").map_err(ser)? != 0,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_attempt_row(row: &SqliteRow) -> Result<Attempt, StorageError> {
    let answers_json: String = row.try_get("answers").map_err(ser)?;
    let answers: Vec<Answer> = serde_json::from_str(&answers_json).map_err(ser)?;

    Attempt::from_persisted(
        AttemptId::from_uuid(uuid_from_text(
            "attempt id",
            &row.try_get::<String, _>("id").map_err(ser)?,
        )?),
        QuizId::from_uuid(uuid_from_text(
            "quiz id",
            &row.try_get::<String, _>("quiz_id").map_err(ser)?,
        )?),
        UserId::from_uuid(uuid_from_text(
            "user id",
            &row.try_get::<String, _>("user_id").map_err(ser)?,
        )?),
        answers,
        row.try_get("score").map_err(ser)?,
        u32_from_i64(
            "total_questions",
            row.try_get("total_questions").map_err(ser)?,
        )?,
        u32_from_i64(
            "correct_answers",
            row.try_get("correct_answers").map_err(ser)?,
        )?,
        u32_from_i64("time_spent", row.try_get("time_spent").map_err(ser)?)?,
        row.try_get("completed_at").map_err(ser)?,
    )
    .map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_uuid_text() {
        let err = uuid_from_text("quiz id", "not-a-uuid").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(msg) if msg.contains("quiz id")));
    }

    #[test]
    fn rejects_negative_counts() {
        assert!(u32_from_i64("time_spent", -1).is_err());
        assert_eq!(u32_from_i64("time_spent", 42).unwrap(), 42);
    }
}
