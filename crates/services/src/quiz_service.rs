use std::sync::Arc;

use quiz_core::model::{
    DifficultyLevel, MaterialId, QuestionType, Quiz, QuizDraft, QuizId, UserId,
};
use storage::repository::{MaterialRepository, QuizRepository};
use tracing::info;

use crate::Clock;
use crate::error::QuizServiceError;
use crate::question_generator::{GenerationRequest, QuestionGenerator};

pub const DEFAULT_QUESTION_COUNT: u32 = 10;
pub const MIN_QUESTION_COUNT: u32 = 5;
pub const MAX_QUESTION_COUNT: u32 = 50;
pub const DEFAULT_TITLE: &str = "Generated Quiz";
pub const DEFAULT_TIME_LIMIT_MINUTES: u32 = 30;

/// What the caller asks for; unset fields take the service defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizRequest {
    pub material_id: MaterialId,
    pub question_count: Option<u32>,
    pub question_types: Vec<QuestionType>,
    pub difficulty: Option<DifficultyLevel>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl QuizRequest {
    #[must_use]
    pub fn for_material(material_id: MaterialId) -> Self {
        Self {
            material_id,
            ..Self::default()
        }
    }

    /// Requested count clamped to the supported range.
    #[must_use]
    pub fn effective_count(&self) -> u32 {
        self.question_count
            .unwrap_or(DEFAULT_QUESTION_COUNT)
            .clamp(MIN_QUESTION_COUNT, MAX_QUESTION_COUNT)
    }

    #[must_use]
    pub fn effective_types(&self) -> Vec<QuestionType> {
        if self.question_types.is_empty() {
            vec![QuestionType::MultipleChoice]
        } else {
            self.question_types.clone()
        }
    }

    #[must_use]
    pub fn effective_title(&self) -> String {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string()
    }
}

/// Generates, stores and publishes quizzes.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    materials: Arc<dyn MaterialRepository>,
    quizzes: Arc<dyn QuizRepository>,
    generator: QuestionGenerator,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        materials: Arc<dyn MaterialRepository>,
        quizzes: Arc<dyn QuizRepository>,
        generator: QuestionGenerator,
    ) -> Self {
        Self {
            clock,
            materials,
            quizzes,
            generator,
        }
    }

    /// Generate a quiz from one of the user's processed materials and store it.
    ///
    /// Nothing is stored when generation fails.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotFound` if the material is missing or not
    /// owned by `user_id`, `NotProcessed` if it has no usable text,
    /// `Generation` if the model call or reply fails, and `Storage` on
    /// persistence failures.
    pub async fn generate(
        &self,
        user_id: UserId,
        request: QuizRequest,
    ) -> Result<Quiz, QuizServiceError> {
        let material = self
            .materials
            .get_material(request.material_id)
            .await?
            .filter(|m| m.user_id() == user_id)
            .ok_or(QuizServiceError::NotFound)?;
        let text = material.usable_text().ok_or(QuizServiceError::NotProcessed)?;

        let difficulty = request.difficulty.unwrap_or_default();
        let title = request.effective_title();
        let generation = GenerationRequest::new(
            text,
            request.effective_count(),
            request.effective_types(),
            difficulty,
            title.clone(),
        )?;
        let questions = self.generator.generate(&generation).await?;

        let quiz = QuizDraft {
            user_id,
            material_id: Some(material.id()),
            title,
            description: request.description,
            questions,
            difficulty,
            time_limit_minutes: Some(DEFAULT_TIME_LIMIT_MINUTES),
        }
        .validate(QuizId::new(), self.clock.now())?;
        self.quizzes.insert_quiz(&quiz).await?;

        info!(
            quiz = %quiz.id(),
            material = %material.id(),
            questions = quiz.questions().len(),
            "stored generated quiz"
        );
        Ok(quiz)
    }

    /// Fetch a quiz. Published quizzes are visible to everyone; unpublished
    /// ones only to their owner.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotFound` if the quiz is missing or hidden.
    pub async fn get(&self, user_id: UserId, id: QuizId) -> Result<Quiz, QuizServiceError> {
        self.quizzes
            .get_quiz(id)
            .await?
            .filter(|q| q.is_published() || q.user_id() == user_id)
            .ok_or(QuizServiceError::NotFound)
    }

    /// Quizzes owned by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Quiz>, QuizServiceError> {
        Ok(self.quizzes.list_quizzes(user_id).await?)
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::NotFound` unless `user_id` owns the quiz.
    pub async fn publish(&self, user_id: UserId, id: QuizId) -> Result<Quiz, QuizServiceError> {
        let mut quiz = self.owned(user_id, id).await?;
        self.quizzes.publish_quiz(id).await?;
        quiz.publish();
        Ok(quiz)
    }

    /// Delete a quiz and every attempt against it.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotFound` unless `user_id` owns the quiz.
    pub async fn delete(&self, user_id: UserId, id: QuizId) -> Result<(), QuizServiceError> {
        self.owned(user_id, id).await?;
        if !self.quizzes.delete_quiz(id).await? {
            return Err(QuizServiceError::NotFound);
        }
        Ok(())
    }

    async fn owned(&self, user_id: UserId, id: QuizId) -> Result<Quiz, QuizServiceError> {
        self.quizzes
            .get_quiz(id)
            .await?
            .filter(|q| q.user_id() == user_id)
            .ok_or(QuizServiceError::NotFound)
    }
}
