use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{MaterialId, QuizId, UserId};
use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("quiz must contain at least one question")]
    NoQuestions,

    #[error("duplicate question id: {0}")]
    DuplicateQuestionId(String),

    #[error("time limit must be > 0 minutes")]
    InvalidTimeLimit,

    #[error("unknown difficulty level: {0}")]
    UnknownDifficulty(String),
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Coarse proficiency tag passed through to the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Mixed,
}

impl DifficultyLevel {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Beginner => "beginner",
            DifficultyLevel::Intermediate => "intermediate",
            DifficultyLevel::Advanced => "advanced",
            DifficultyLevel::Mixed => "mixed",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyLevel {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            "mixed" => Ok(Self::Mixed),
            other => Err(QuizError::UnknownDifficulty(other.to_string())),
        }
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// Unvalidated quiz contents, as produced by generation or read back from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizDraft {
    pub user_id: UserId,
    pub material_id: Option<MaterialId>,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<Question>,
    pub difficulty: DifficultyLevel,
    pub time_limit_minutes: Option<u32>,
}

impl QuizDraft {
    /// Validate the draft into an unpublished quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the title is blank, there are no questions,
    /// question ids repeat, or the time limit is zero.
    pub fn validate(self, id: QuizId, created_at: DateTime<Utc>) -> Result<Quiz, QuizError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        if self.questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        let mut seen = HashSet::with_capacity(self.questions.len());
        for q in &self.questions {
            if !seen.insert(q.id.as_str()) {
                return Err(QuizError::DuplicateQuestionId(q.id.clone()));
            }
        }
        if self.time_limit_minutes == Some(0) {
            return Err(QuizError::InvalidTimeLimit);
        }

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Quiz {
            id,
            user_id: self.user_id,
            material_id: self.material_id,
            title,
            description,
            questions: self.questions,
            difficulty: self.difficulty,
            time_limit_minutes: self.time_limit_minutes,
            published: false,
            created_at,
        })
    }
}

/// An ordered, immutable question list plus metadata. Publishing is the only mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    id: QuizId,
    user_id: UserId,
    material_id: Option<MaterialId>,
    title: String,
    description: Option<String>,
    questions: Vec<Question>,
    #[serde(rename = "difficultyLevel")]
    difficulty: DifficultyLevel,
    #[serde(rename = "timeLimit")]
    time_limit_minutes: Option<u32>,
    #[serde(rename = "isPublished")]
    published: bool,
    created_at: DateTime<Utc>,
}

impl Quiz {
    /// Rehydrate a quiz from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the persisted contents no longer validate.
    pub fn from_persisted(
        id: QuizId,
        draft: QuizDraft,
        published: bool,
        created_at: DateTime<Utc>,
    ) -> Result<Self, QuizError> {
        let mut quiz = draft.validate(id, created_at)?;
        quiz.published = published;
        Ok(quiz)
    }

    pub fn publish(&mut self) {
        self.published = true;
    }

    /// Forget the source material (it was deleted).
    pub fn detach_material(&mut self) {
        self.material_id = None;
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn material_id(&self) -> Option<MaterialId> {
        self.material_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn difficulty(&self) -> DifficultyLevel {
        self.difficulty
    }

    #[must_use]
    pub fn time_limit_minutes(&self) -> Option<u32> {
        self.time_limit_minutes
    }

    #[must_use]
    pub fn is_published(&self) -> bool {
        self.published
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::QuestionType;
    use crate::time::fixed_now;

    fn question(id: &str) -> Question {
        Question {
            id: id.into(),
            kind: QuestionType::FillBlank,
            question: "Fill in".into(),
            options: None,
            correct_answer: "x".into(),
            explanation: None,
            difficulty: None,
        }
    }

    fn draft(questions: Vec<Question>) -> QuizDraft {
        QuizDraft {
            user_id: UserId::new(),
            material_id: None,
            title: "  Synonyms  ".into(),
            description: Some(String::new()),
            questions,
            difficulty: DifficultyLevel::Mixed,
            time_limit_minutes: Some(30),
        }
    }

    #[test]
    fn validate_trims_and_starts_unpublished() {
        let quiz = draft(vec![question("q1")])
            .validate(QuizId::new(), fixed_now())
            .unwrap();
        assert_eq!(quiz.title(), "Synonyms");
        assert!(quiz.description().is_none());
        assert!(!quiz.is_published());
    }

    #[test]
    fn validate_rejects_empty_question_list() {
        let err = draft(Vec::new())
            .validate(QuizId::new(), fixed_now())
            .unwrap_err();
        assert_eq!(err, QuizError::NoQuestions);
    }

    #[test]
    fn validate_rejects_duplicate_question_ids() {
        let err = draft(vec![question("q1"), question("q1")])
            .validate(QuizId::new(), fixed_now())
            .unwrap_err();
        assert_eq!(err, QuizError::DuplicateQuestionId("q1".into()));
    }

    #[test]
    fn validate_rejects_zero_time_limit() {
        let mut d = draft(vec![question("q1")]);
        d.time_limit_minutes = Some(0);
        assert_eq!(
            d.validate(QuizId::new(), fixed_now()).unwrap_err(),
            QuizError::InvalidTimeLimit
        );
    }

    #[test]
    fn publish_is_the_only_toggle() {
        let mut quiz = draft(vec![question("q1")])
            .validate(QuizId::new(), fixed_now())
            .unwrap();
        quiz.publish();
        assert!(quiz.is_published());
        quiz.publish();
        assert!(quiz.is_published());
    }

    #[test]
    fn difficulty_round_trips_through_str() {
        for level in [
            DifficultyLevel::Beginner,
            DifficultyLevel::Intermediate,
            DifficultyLevel::Advanced,
            DifficultyLevel::Mixed,
        ] {
            assert_eq!(level.as_str().parse::<DifficultyLevel>().unwrap(), level);
        }
        assert!("expert".parse::<DifficultyLevel>().is_err());
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let quiz = draft(vec![question("q1")])
            .validate(QuizId::new(), fixed_now())
            .unwrap();
        let value = serde_json::to_value(&quiz).unwrap();
        assert_eq!(value["difficultyLevel"], "mixed");
        assert_eq!(value["timeLimit"], 30);
        assert_eq!(value["isPublished"], false);
        assert_eq!(value["questions"][0]["id"], "q1");
    }
}
