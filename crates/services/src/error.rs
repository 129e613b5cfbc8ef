//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::grading::GradingError;
use quiz_core::model::{AttemptError, MaterialError, QuizError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by a `CompletionClient`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompletionError {
    #[error("completion client is not configured")]
    Disabled,
    #[error("completion returned an empty response")]
    EmptyResponse,
    #[error("completion request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors from reading completion settings out of the environment.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid base url {value:?}: {source}")]
    InvalidBaseUrl {
        value: String,
        source: url::ParseError,
    },
    #[error("invalid timeout {0:?}, expected whole seconds")]
    InvalidTimeout(String),
    #[error("cannot build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Errors emitted by the question generator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("invalid generation request: {0}")]
    InvalidRequest(&'static str),
    #[error("failed to generate quiz questions: {0}")]
    Completion(#[from] CompletionError),
    #[error("model reply is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("model reply has no questions array")]
    MissingQuestions,
    #[error("model reply contained no usable questions")]
    NoValidQuestions,
}

/// Errors emitted while turning an upload into plain text.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractionError {
    #[error("text extraction is not available for {0}")]
    UnsupportedMediaType(String),
    #[error("failed to read upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors emitted by `MaterialService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MaterialServiceError {
    #[error("material not found")]
    NotFound,
    #[error("upload of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Material(#[from] MaterialError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error("quiz or material not found")]
    NotFound,
    #[error("material has no extracted text to generate from")]
    NotProcessed,
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AttemptService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AttemptServiceError {
    #[error("quiz or attempt not found")]
    NotFound,
    #[error(transparent)]
    Grading(#[from] GradingError),
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AnalyticsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalyticsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
