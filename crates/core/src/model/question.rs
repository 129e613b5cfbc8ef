use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id cannot be empty")]
    EmptyId,

    #[error("question {id} has no prompt text")]
    EmptyPrompt { id: String },

    #[error("question {id} has no correct answer")]
    EmptyAnswer { id: String },

    #[error("multiple-choice question {id} has no options")]
    MissingOptions { id: String },

    #[error("correct answer of question {id} is not one of its options")]
    AnswerNotInOptions { id: String },

    #[error("true/false question {id} has answer {answer:?}, expected \"true\" or \"false\"")]
    InvalidTrueFalseAnswer { id: String, answer: String },

    #[error("unknown question type: {0}")]
    UnknownType(String),
}

//
// ─── QUESTION TYPE ─────────────────────────────────────────────────────────────
//

/// Kind of quiz item; serialized with the snake-case wire tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    FillBlank,
}

impl QuestionType {
    pub const ALL: [QuestionType; 3] = [
        QuestionType::MultipleChoice,
        QuestionType::TrueFalse,
        QuestionType::FillBlank,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::TrueFalse => "true_false",
            QuestionType::FillBlank => "fill_blank",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "multiple_choice" => Ok(Self::MultipleChoice),
            "true_false" => Ok(Self::TrueFalse),
            "fill_blank" => Ok(Self::FillBlank),
            other => Err(QuestionError::UnknownType(other.to_string())),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One quiz item, in the same JSON shape the model is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

impl Question {
    /// Check the question is gradable and normalize what can be repaired.
    ///
    /// True/false answers are case-folded (`"True"` becomes `"true"`) and
    /// blank explanations are dropped. Options on non multiple-choice
    /// questions are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the id, prompt or answer is blank, when a
    /// multiple-choice answer is missing from its options, or when a
    /// true/false answer is neither `true` nor `false`.
    pub fn validate(mut self) -> Result<Self, QuestionError> {
        if self.id.trim().is_empty() {
            return Err(QuestionError::EmptyId);
        }
        if self.question.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt { id: self.id });
        }
        if self.correct_answer.is_empty() {
            return Err(QuestionError::EmptyAnswer { id: self.id });
        }

        match self.kind {
            QuestionType::MultipleChoice => {
                let Some(options) = self.options.as_ref().filter(|o| !o.is_empty()) else {
                    return Err(QuestionError::MissingOptions { id: self.id });
                };
                if !options.iter().any(|o| *o == self.correct_answer) {
                    return Err(QuestionError::AnswerNotInOptions { id: self.id });
                }
            }
            QuestionType::TrueFalse => {
                let folded = self.correct_answer.trim().to_ascii_lowercase();
                if folded != "true" && folded != "false" {
                    return Err(QuestionError::InvalidTrueFalseAnswer {
                        id: self.id,
                        answer: self.correct_answer,
                    });
                }
                self.correct_answer = folded;
            }
            QuestionType::FillBlank => {}
        }

        self.explanation = self
            .explanation
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        Ok(self)
    }

    /// Returns true when `answer` exactly matches the correct answer.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }
}
