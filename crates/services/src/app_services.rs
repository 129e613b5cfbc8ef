use std::path::PathBuf;
use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::ai::CompletionClient;
use crate::analytics_service::AnalyticsService;
use crate::attempt_service::AttemptService;
use crate::error::AppServicesError;
use crate::extraction::{FileTextExtractor, TextExtractor};
use crate::material_service::MaterialService;
use crate::question_generator::QuestionGenerator;
use crate::quiz_service::QuizService;

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    materials: Arc<MaterialService>,
    quizzes: Arc<QuizService>,
    attempts: Arc<AttemptService>,
    analytics: Arc<AnalyticsService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        upload_dir: impl Into<PathBuf>,
        clock: Clock,
        completion: Arc<dyn CompletionClient>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(
            &storage,
            upload_dir,
            clock,
            completion,
            Arc::new(FileTextExtractor),
        ))
    }

    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        upload_dir: impl Into<PathBuf>,
        clock: Clock,
        completion: Arc<dyn CompletionClient>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        let materials = Arc::new(MaterialService::new(
            clock,
            upload_dir,
            Arc::clone(&storage.materials),
            extractor,
        ));
        let quizzes = Arc::new(QuizService::new(
            clock,
            Arc::clone(&storage.materials),
            Arc::clone(&storage.quizzes),
            QuestionGenerator::new(completion),
        ));
        let attempts = Arc::new(AttemptService::new(
            clock,
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.attempts),
        ));
        let analytics = Arc::new(AnalyticsService::new(
            Arc::clone(&storage.materials),
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.attempts),
        ));

        Self {
            materials,
            quizzes,
            attempts,
            analytics,
        }
    }

    #[must_use]
    pub fn materials(&self) -> Arc<MaterialService> {
        Arc::clone(&self.materials)
    }

    #[must_use]
    pub fn quizzes(&self) -> Arc<QuizService> {
        Arc::clone(&self.quizzes)
    }

    #[must_use]
    pub fn attempts(&self) -> Arc<AttemptService> {
        Arc::clone(&self.attempts)
    }

    #[must_use]
    pub fn analytics(&self) -> Arc<AnalyticsService> {
        Arc::clone(&self.analytics)
    }
}
