use std::sync::Arc;

use quiz_core::analytics::UserStats;
use quiz_core::model::UserId;
use storage::repository::{AttemptRepository, MaterialRepository, QuizRepository};

use crate::error::AnalyticsError;

/// Per-user dashboard totals.
#[derive(Clone)]
pub struct AnalyticsService {
    materials: Arc<dyn MaterialRepository>,
    quizzes: Arc<dyn QuizRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl AnalyticsService {
    #[must_use]
    pub fn new(
        materials: Arc<dyn MaterialRepository>,
        quizzes: Arc<dyn QuizRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            materials,
            quizzes,
            attempts,
        }
    }

    /// # Errors
    ///
    /// Returns `AnalyticsError::Storage` if repository access fails.
    pub async fn stats(&self, user_id: UserId) -> Result<UserStats, AnalyticsError> {
        let materials = self.materials.list_materials(user_id).await?;
        let quizzes = self.quizzes.list_quizzes(user_id).await?;
        let attempts = self.attempts.list_attempts_for_user(user_id).await?;
        Ok(UserStats::compute(
            materials.len(),
            quizzes.len(),
            &attempts,
        ))
    }
}
