//! Deterministic grading of a submitted attempt.
//!
//! Answers are matched to questions by question id, never by position, so a
//! client may submit answers in any order or leave some out. A missing answer
//! is graded as an empty, incorrect response; answers for ids the quiz does
//! not contain are ignored. Comparison is exact and case-sensitive.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Answer, Question};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GradingError {
    #[error("quiz has no questions to grade")]
    NoQuestions,
}

/// One answer as submitted by a learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: String,
    #[serde(default)]
    pub answer: String,
}

impl SubmittedAnswer {
    #[must_use]
    pub fn new(question_id: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            answer: answer.into(),
        }
    }
}

/// Result of grading: score, counts, and one feedback line per question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeReport {
    pub score: f64,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub feedback: Vec<String>,
    #[serde(skip)]
    pub answers: Vec<Answer>,
}

impl GradeReport {
    /// True when there was nothing to grade.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_questions == 0
    }

    /// Reject the zero-question report before anything is persisted.
    ///
    /// # Errors
    ///
    /// Returns `GradingError::NoQuestions` for an empty report.
    pub fn require_questions(self) -> Result<Self, GradingError> {
        if self.is_empty() {
            return Err(GradingError::NoQuestions);
        }
        Ok(self)
    }
}

/// Grade `submitted` against `questions`, in question order.
///
/// Never fails: an empty question list yields a score of `0.0` with no
/// feedback (see [`GradeReport::require_questions`]).
#[must_use]
pub fn grade(questions: &[Question], submitted: &[SubmittedAnswer]) -> GradeReport {
    let mut by_id: HashMap<&str, &str> = HashMap::with_capacity(submitted.len());
    for s in submitted {
        // First answer for an id wins.
        by_id
            .entry(s.question_id.as_str())
            .or_insert(s.answer.as_str());
    }

    let mut correct = 0_usize;
    let mut feedback = Vec::with_capacity(questions.len());
    let mut answers = Vec::with_capacity(questions.len());

    for (index, question) in questions.iter().enumerate() {
        let given = by_id.get(question.id.as_str()).copied().unwrap_or("");
        let is_correct = question.is_correct(given);
        if is_correct {
            correct += 1;
        }
        feedback.push(feedback_line(index + 1, question, is_correct));
        answers.push(Answer {
            question_id: question.id.clone(),
            answer: given.to_string(),
            is_correct,
        });
    }

    GradeReport {
        score: score_percent(correct, questions.len()),
        correct_answers: saturating_u32(correct),
        total_questions: saturating_u32(questions.len()),
        feedback,
        answers,
    }
}

/// `correct / total * 100`, rounded to two decimals; `0.0` when `total` is zero.
#[must_use]
pub fn score_percent(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = correct as f64 / total as f64;
    round_to_hundredths(ratio * 100.0)
}

#[must_use]
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn feedback_line(number: usize, question: &Question, is_correct: bool) -> String {
    let mut line = if is_correct {
        format!("Question {number}: Correct!")
    } else {
        format!(
            "Question {number}: Incorrect. The correct answer is \"{}\".",
            question.correct_answer
        )
    };
    if let Some(explanation) = question.explanation.as_deref().filter(|e| !e.is_empty()) {
        line.push(' ');
        line.push_str(explanation);
    }
    line
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
