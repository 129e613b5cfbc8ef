//! Builds a prompt from document text, asks the completion client for a
//! quiz, and turns the reply into validated questions.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;

use quiz_core::model::{DifficultyLevel, Question, QuestionType};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::ai::CompletionClient;
use crate::error::GenerationError;

/// Characters of source text forwarded to the model.
pub const MAX_SOURCE_CHARS: usize = 4000;
pub const TEMPERATURE: f32 = 0.7;

const SYSTEM_PROMPT: &str =
    "You are an assistant that generates quiz questions based only on provided material.";

/// Parameters for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    source_text: String,
    question_count: u32,
    question_types: Vec<QuestionType>,
    difficulty: DifficultyLevel,
    title: String,
}

impl GenerationRequest {
    /// # Errors
    ///
    /// Returns `GenerationError::InvalidRequest` for blank source text, a zero
    /// count, or an empty type list.
    pub fn new(
        source_text: impl Into<String>,
        question_count: u32,
        question_types: Vec<QuestionType>,
        difficulty: DifficultyLevel,
        title: impl Into<String>,
    ) -> Result<Self, GenerationError> {
        let source_text = source_text.into();
        if source_text.trim().is_empty() {
            return Err(GenerationError::InvalidRequest("source text is empty"));
        }
        if question_count == 0 {
            return Err(GenerationError::InvalidRequest("question count must be positive"));
        }
        if question_types.is_empty() {
            return Err(GenerationError::InvalidRequest("no question types requested"));
        }
        let mut seen = HashSet::new();
        let question_types = question_types
            .into_iter()
            .filter(|t| seen.insert(*t))
            .collect();

        Ok(Self {
            source_text,
            question_count,
            question_types,
            difficulty,
            title: title.into(),
        })
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn question_types(&self) -> &[QuestionType] {
        &self.question_types
    }

    #[must_use]
    pub fn difficulty(&self) -> DifficultyLevel {
        self.difficulty
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Turns material into questions through a `CompletionClient`.
#[derive(Clone)]
pub struct QuestionGenerator {
    client: Arc<dyn CompletionClient>,
}

impl QuestionGenerator {
    #[must_use]
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Make one completion call and return the questions that survive validation.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` if the call fails, the reply is not a JSON
    /// object with a `questions` array, or no question is usable.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<Question>, GenerationError> {
        let prompt = build_prompt(request);
        let raw = self
            .client
            .generate_completion(SYSTEM_PROMPT, &prompt, TEMPERATURE)
            .await?;
        debug!(reply = %raw, "model reply");
        parse_questions(&raw, request.question_count)
    }
}

/// First `MAX_SOURCE_CHARS` characters with line breaks collapsed to spaces.
#[must_use]
pub fn sanitize_source(text: &str) -> String {
    let mut out = String::with_capacity(text.len().min(MAX_SOURCE_CHARS));
    let mut in_break = false;
    for c in text.chars().take(MAX_SOURCE_CHARS) {
        if c == '\r' || c == '\n' {
            if !in_break {
                out.push(' ');
                in_break = true;
            }
        } else {
            out.push(c);
            in_break = false;
        }
    }
    out.trim().to_string()
}

#[must_use]
pub fn build_prompt(request: &GenerationRequest) -> String {
    let types = request
        .question_types
        .iter()
        .map(QuestionType::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let mut prompt = String::new();
    let _ = writeln!(prompt, "Your task:");
    let _ = writeln!(prompt, "- ONLY use the material provided below.");
    let _ = writeln!(
        prompt,
        "- DO NOT invent facts, general trivia, or content unrelated to the material."
    );
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Instructions:");
    let _ = writeln!(
        prompt,
        "- Generate exactly {} questions.",
        request.question_count
    );
    let _ = writeln!(prompt, "- Question types allowed: {types}.");
    let _ = writeln!(prompt, "- Difficulty level: {}.", request.difficulty);
    let _ = writeln!(prompt, "- Quiz title: \"{}\"", request.title);
    let _ = writeln!(
        prompt,
        "- Multiple choice questions must list their options and the correct answer must be one of them."
    );
    let _ = writeln!(
        prompt,
        "- True/false questions must use \"true\" or \"false\" as the correct answer."
    );
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Return a valid JSON object in this format:");
    let _ = writeln!(prompt);
    let _ = writeln!(
        prompt,
        r#"{{
  "questions": [
    {{
      "id": "q1",
      "type": "multiple_choice",
      "question": "Which organelle carries out photosynthesis?",
      "options": ["Chloroplast", "Nucleus", "Ribosome", "Vacuole"],
      "correctAnswer": "Chloroplast",
      "explanation": "Chloroplasts contain the chlorophyll that captures light.",
      "difficulty": "beginner"
    }}
  ]
}}"#
    );
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Material content:");
    let _ = writeln!(prompt, "\"\"\"");
    let _ = writeln!(prompt, "{}", sanitize_source(&request.source_text));
    let _ = write!(prompt, "\"\"\"");
    prompt
}

/// Remove a leading code fence (with optional language tag) and a trailing fence.
#[must_use]
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.find('\n') {
            Some(newline) if rest[..newline].trim().chars().all(char::is_alphanumeric) => {
                &rest[newline + 1..]
            }
            _ => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Decode a model reply and keep at most `limit` valid questions.
///
/// # Errors
///
/// Returns `GenerationError::Malformed` for non-JSON, `MissingQuestions` when
/// the object lacks a `questions` array, `NoValidQuestions` when every record
/// is dropped.
pub fn parse_questions(raw: &str, limit: u32) -> Result<Vec<Question>, GenerationError> {
    let value: Value = serde_json::from_str(strip_code_fence(raw))?;
    let Some(records) = value.get("questions").and_then(Value::as_array) else {
        return Err(GenerationError::MissingQuestions);
    };

    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    let mut seen = HashSet::new();
    let mut questions = Vec::with_capacity(records.len().min(limit));

    for (index, record) in records.iter().enumerate() {
        if questions.len() == limit {
            info!(
                dropped = records.len() - index,
                "truncating questions beyond requested count"
            );
            break;
        }
        let question = match serde_json::from_value::<Question>(record.clone()) {
            Ok(q) => q,
            Err(e) => {
                warn!(index, error = %e, "dropping undecodable question");
                continue;
            }
        };
        let question = match question.validate() {
            Ok(q) => q,
            Err(e) => {
                warn!(index, error = %e, "dropping invalid question");
                continue;
            }
        };
        if !seen.insert(question.id.clone()) {
            warn!(index, id = %question.id, "dropping question with duplicate id");
            continue;
        }
        questions.push(question);
    }

    if questions.is_empty() {
        return Err(GenerationError::NoValidQuestions);
    }
    if questions.len() < limit {
        info!(
            requested = limit,
            kept = questions.len(),
            "model returned fewer usable questions than requested"
        );
    }
    Ok(questions)
}
