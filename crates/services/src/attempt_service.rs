use std::sync::Arc;

use quiz_core::grading::{SubmittedAnswer, grade};
use quiz_core::model::{Attempt, AttemptId, QuizId, UserId};
use serde::{Deserialize, Serialize};
use storage::repository::{AttemptRepository, QuizRepository, StorageError};
use tracing::info;

use crate::Clock;
use crate::error::AttemptServiceError;

/// A learner's answers for one quiz.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub answers: Vec<SubmittedAnswer>,
    /// Seconds the learner spent on the quiz.
    #[serde(default, rename = "timeSpent")]
    pub time_spent_secs: u32,
}

/// The stored attempt and the per-question feedback lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionResult {
    pub attempt: Attempt,
    pub feedback: Vec<String>,
}

/// Grades submissions against stored quizzes and keeps the results.
#[derive(Clone)]
pub struct AttemptService {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl AttemptService {
    #[must_use]
    pub fn new(
        clock: Clock,
        quizzes: Arc<dyn QuizRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            clock,
            quizzes,
            attempts,
        }
    }

    /// Grade `submission` against the stored quiz and persist the attempt.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::NotFound` if the quiz is missing or not
    /// visible to `user_id`, `Grading` if the quiz has no questions, and
    /// `Storage` if persistence fails.
    pub async fn submit(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
        submission: Submission,
    ) -> Result<SubmissionResult, AttemptServiceError> {
        let quiz = self
            .quizzes
            .get_quiz(quiz_id)
            .await?
            .filter(|q| q.is_published() || q.user_id() == user_id)
            .ok_or(AttemptServiceError::NotFound)?;

        let report = grade(quiz.questions(), &submission.answers).require_questions()?;
        let feedback = report.feedback.clone();
        let attempt = Attempt::from_report(
            AttemptId::new(),
            quiz_id,
            user_id,
            report,
            submission.time_spent_secs,
            self.clock.now(),
        )?;

        match self.attempts.insert_attempt(&attempt).await {
            Ok(()) => {}
            Err(StorageError::NotFound) => return Err(AttemptServiceError::NotFound),
            Err(e) => return Err(e.into()),
        }

        info!(
            attempt = %attempt.id(),
            quiz = %quiz_id,
            score = attempt.score(),
            "recorded attempt"
        );
        Ok(SubmissionResult { attempt, feedback })
    }

    /// # Errors
    ///
    /// Returns `AttemptServiceError::NotFound` if the attempt is missing or
    /// belongs to another user.
    pub async fn get(
        &self,
        user_id: UserId,
        id: AttemptId,
    ) -> Result<Attempt, AttemptServiceError> {
        self.attempts
            .get_attempt(id)
            .await?
            .filter(|a| a.user_id() == user_id)
            .ok_or(AttemptServiceError::NotFound)
    }

    /// The user's attempts, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::Storage` if repository access fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Attempt>, AttemptServiceError> {
        Ok(self.attempts.list_attempts_for_user(user_id).await?)
    }

    /// Every attempt against a quiz the user owns, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::NotFound` unless `user_id` owns the quiz.
    pub async fn list_for_quiz(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
    ) -> Result<Vec<Attempt>, AttemptServiceError> {
        self.quizzes
            .get_quiz(quiz_id)
            .await?
            .filter(|q| q.user_id() == user_id)
            .ok_or(AttemptServiceError::NotFound)?;
        Ok(self.attempts.list_attempts_for_quiz(quiz_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use quiz_core::grading::GradingError;
    use quiz_core::model::{DifficultyLevel, Question, QuestionType, Quiz, QuizDraft};
    use quiz_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    use super::*;

    fn quiz(owner: UserId) -> Quiz {
        QuizDraft {
            user_id: owner,
            material_id: None,
            title: "Capitals".into(),
            description: None,
            questions: vec![
                Question {
                    id: "q1".into(),
                    kind: QuestionType::TrueFalse,
                    question: "Paris is in France.".into(),
                    options: None,
                    correct_answer: "true".into(),
                    explanation: None,
                    difficulty: None,
                },
                Question {
                    id: "q2".into(),
                    kind: QuestionType::FillBlank,
                    question: "The capital of France is ____.".into(),
                    options: None,
                    correct_answer: "Paris".into(),
                    explanation: None,
                    difficulty: None,
                },
            ],
            difficulty: DifficultyLevel::Beginner,
            time_limit_minutes: Some(30),
        }
        .validate(QuizId::new(), fixed_now())
        .unwrap()
    }

    async fn setup() -> (AttemptService, UserId, Quiz) {
        let repo = Arc::new(InMemoryRepository::new());
        let owner = UserId::new();
        let q = quiz(owner);
        repo.insert_quiz(&q).await.unwrap();
        let svc = AttemptService::new(fixed_clock(), repo.clone(), repo);
        (svc, owner, q)
    }

    fn submission(pairs: &[(&str, &str)]) -> Submission {
        Submission {
            answers: pairs
                .iter()
                .map(|(id, a)| SubmittedAnswer::new(*id, *a))
                .collect(),
            time_spent_secs: 42,
        }
    }

    #[tokio::test]
    async fn submit_grades_and_persists() {
        let (svc, owner, q) = setup().await;
        let result = svc
            .submit(owner, q.id(), submission(&[("q1", "true"), ("q2", "paris")]))
            .await
            .unwrap();
        assert_eq!(result.attempt.score(), 50.0);
        assert_eq!(result.attempt.correct_answers(), 1);
        assert_eq!(result.attempt.time_spent_secs(), 42);
        assert_eq!(result.feedback.len(), 2);

        let stored = svc.get(owner, result.attempt.id()).await.unwrap();
        assert_eq!(stored, result.attempt);
        assert_eq!(svc.list_for_user(owner).await.unwrap().len(), 1);
        assert_eq!(svc.list_for_quiz(owner, q.id()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unpublished_quiz_hidden_from_others() {
        let (svc, _owner, q) = setup().await;
        let stranger = UserId::new();
        let err = svc
            .submit(stranger, q.id(), submission(&[("q1", "true")]))
            .await
            .unwrap_err();
        assert!(matches!(err, AttemptServiceError::NotFound));
    }

    #[tokio::test]
    async fn unknown_quiz_is_not_found() {
        let (svc, owner, _q) = setup().await;
        assert!(matches!(
            svc.submit(owner, QuizId::new(), Submission::default()).await,
            Err(AttemptServiceError::NotFound)
        ));
    }

    #[test]
    fn submission_decodes_wire_shape() {
        let json = r#"{"answers":[{"questionId":"q1","answer":"true"},{"questionId":"q2"}],"timeSpent":90}"#;
        let s: Submission = serde_json::from_str(json).unwrap();
        assert_eq!(s.answers[1].answer, "");
        assert_eq!(s.time_spent_secs, 90);
    }

    #[test]
    fn grading_error_converts() {
        let err: AttemptServiceError = GradingError::NoQuestions.into();
        assert!(matches!(
            err,
            AttemptServiceError::Grading(GradingError::NoQuestions)
        ));
    }
}
