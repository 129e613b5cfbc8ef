use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grading::{GradeReport, score_percent};
use crate::model::ids::{AttemptId, QuizId, UserId};

/// Largest score drift tolerated when rehydrating (scores are stored to two decimals).
const SCORE_TOLERANCE: f64 = 0.005;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("attempt must cover at least one question")]
    NoQuestions,

    #[error("correct answers ({correct}) exceed total questions ({total})")]
    CountMismatch { correct: u32, total: u32 },

    #[error("attempt has {answers} answers for {total} questions")]
    AnswerCountMismatch { answers: usize, total: u32 },

    #[error("{flagged} answers are marked correct but correct answers is {correct}")]
    CorrectFlagMismatch { flagged: usize, correct: u32 },

    #[error("stored score {stored} does not match {expected}")]
    ScoreMismatch { stored: f64, expected: f64 },
}

/// A learner's graded response to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    pub answer: String,
    pub is_correct: bool,
}

/// One graded submission against a quiz. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    id: AttemptId,
    quiz_id: QuizId,
    user_id: UserId,
    answers: Vec<Answer>,
    score: f64,
    total_questions: u32,
    correct_answers: u32,
    #[serde(rename = "timeSpent")]
    time_spent_secs: u32,
    completed_at: DateTime<Utc>,
}

impl Attempt {
    /// Build an attempt from a grading report.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NoQuestions` when the report graded nothing.
    pub fn from_report(
        id: AttemptId,
        quiz_id: QuizId,
        user_id: UserId,
        report: GradeReport,
        time_spent_secs: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, AttemptError> {
        Self::from_persisted(
            id,
            quiz_id,
            user_id,
            report.answers,
            report.score,
            report.total_questions,
            report.correct_answers,
            time_spent_secs,
            completed_at,
        )
    }

    /// Rehydrate an attempt from persisted storage, re-checking the score invariant.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` when counts, answers, or score are inconsistent.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: AttemptId,
        quiz_id: QuizId,
        user_id: UserId,
        answers: Vec<Answer>,
        score: f64,
        total_questions: u32,
        correct_answers: u32,
        time_spent_secs: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, AttemptError> {
        if total_questions == 0 {
            return Err(AttemptError::NoQuestions);
        }
        if correct_answers > total_questions {
            return Err(AttemptError::CountMismatch {
                correct: correct_answers,
                total: total_questions,
            });
        }
        if answers.len() != total_questions as usize {
            return Err(AttemptError::AnswerCountMismatch {
                answers: answers.len(),
                total: total_questions,
            });
        }
        let flagged = answers.iter().filter(|a| a.is_correct).count();
        if flagged != correct_answers as usize {
            return Err(AttemptError::CorrectFlagMismatch {
                flagged,
                correct: correct_answers,
            });
        }
        let expected = score_percent(correct_answers as usize, total_questions as usize);
        if !score.is_finite() || (score - expected).abs() > SCORE_TOLERANCE {
            return Err(AttemptError::ScoreMismatch {
                stored: score,
                expected,
            });
        }

        Ok(Self {
            id,
            quiz_id,
            user_id,
            answers,
            score: expected,
            total_questions,
            correct_answers,
            time_spent_secs,
            completed_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// Percentage in `[0, 100]`, rounded to two decimals.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u32 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn answers(flags: &[bool]) -> Vec<Answer> {
        flags
            .iter()
            .enumerate()
            .map(|(i, ok)| Answer {
                question_id: format!("q{}", i + 1),
                answer: "a".into(),
                is_correct: *ok,
            })
            .collect()
    }

    fn persisted(score: f64, total: u32, correct: u32, flags: &[bool]) -> Result<Attempt, AttemptError> {
        Attempt::from_persisted(
            AttemptId::new(),
            QuizId::new(),
            UserId::new(),
            answers(flags),
            score,
            total,
            correct,
            12,
            fixed_now(),
        )
    }

    #[test]
    fn accepts_consistent_rounded_score() {
        let attempt = persisted(33.33, 3, 1, &[true, false, false]).unwrap();
        assert_eq!(attempt.score(), 33.33);
        assert_eq!(attempt.time_spent_secs(), 12);
    }

    #[test]
    fn rejects_score_that_disagrees_with_counts() {
        let err = persisted(80.0, 2, 1, &[true, false]).unwrap_err();
        assert!(matches!(err, AttemptError::ScoreMismatch { .. }));
    }

    #[test]
    fn rejects_more_correct_than_total() {
        let err = persisted(100.0, 1, 2, &[true]).unwrap_err();
        assert_eq!(err, AttemptError::CountMismatch { correct: 2, total: 1 });
    }

    #[test]
    fn rejects_answer_count_mismatch() {
        let err = persisted(50.0, 2, 1, &[true]).unwrap_err();
        assert_eq!(err, AttemptError::AnswerCountMismatch { answers: 1, total: 2 });
    }

    #[test]
    fn rejects_answers_flagged_differently_from_count() {
        let err = persisted(50.0, 2, 1, &[true, true]).unwrap_err();
        assert_eq!(err, AttemptError::CorrectFlagMismatch { flagged: 2, correct: 1 });
    }

    #[test]
    fn rejects_empty_attempt() {
        assert_eq!(persisted(0.0, 0, 0, &[]).unwrap_err(), AttemptError::NoQuestions);
    }
}
