use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the versioned migrations for the current schema.
///
/// Version 1 creates materials, quizzes (questions as JSON), attempts
/// (answers as JSON) and the listing indexes.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if is_applied(pool, 1).await? {
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS materials (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                original_name TEXT NOT NULL,
                file_path TEXT NOT NULL,
                file_size INTEGER NOT NULL CHECK (file_size >= 0),
                mime_type TEXT NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('processing', 'processed', 'failed')),
                extracted_text TEXT,
                created_at TEXT NOT NULL
            );
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS quizzes (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                material_id TEXT,
                title TEXT NOT NULL,
                description TEXT,
                questions TEXT NOT NULL,
                difficulty_level TEXT NOT NULL,
                time_limit INTEGER CHECK (time_limit IS NULL OR time_limit > 0),
                is_published INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                FOREIGN KEY (material_id) REFERENCES materials(id) ON DELETE SET NULL
            );
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS attempts (
                id TEXT PRIMARY KEY,
                quiz_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                answers TEXT NOT NULL,
                score REAL NOT NULL CHECK (score BETWEEN 0 AND 100),
                total_questions INTEGER NOT NULL CHECK (total_questions > 0),
                correct_answers INTEGER NOT NULL CHECK (correct_answers >= 0),
                time_spent INTEGER NOT NULL CHECK (time_spent >= 0),
                completed_at TEXT NOT NULL,
                FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE
            );
        ",
    )
    .execute(&mut *tx)
    .await?;

    for index in [
        "CREATE INDEX IF NOT EXISTS idx_materials_user_created ON materials (user_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_quizzes_user_created ON quizzes (user_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_attempts_user_completed ON attempts (user_id, completed_at)",
        "CREATE INDEX IF NOT EXISTS idx_attempts_quiz_completed ON attempts (quiz_id, completed_at)",
    ] {
        sqlx::query(index).execute(&mut *tx).await?;
    }

    sqlx::query(
        r"
            INSERT INTO schema_migrations (version, applied_at)
            VALUES (?1, ?2)
            ON CONFLICT(version) DO NOTHING
        ",
    )
    .bind(1_i64)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(())
}
