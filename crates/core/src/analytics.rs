use serde::Serialize;

use crate::grading::round_to_hundredths;
use crate::model::Attempt;

/// Per-user totals shown on the results dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_materials: usize,
    pub total_quizzes: usize,
    pub total_attempts: usize,
    pub avg_score: f64,
}

impl UserStats {
    #[must_use]
    pub fn compute(total_materials: usize, total_quizzes: usize, attempts: &[Attempt]) -> Self {
        Self {
            total_materials,
            total_quizzes,
            total_attempts: attempts.len(),
            avg_score: average_score(attempts),
        }
    }
}

/// Mean attempt score rounded to two decimals, or `0.0` with no attempts.
#[must_use]
pub fn average_score(attempts: &[Attempt]) -> f64 {
    if attempts.is_empty() {
        return 0.0;
    }
    let sum: f64 = attempts.iter().map(Attempt::score).sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = sum / attempts.len() as f64;
    round_to_hundredths(mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::{SubmittedAnswer, grade};
    use crate::model::{AttemptId, Question, QuestionType, QuizId, UserId};
    use crate::time::fixed_now;

    fn attempt(correct: usize, total: usize) -> Attempt {
        let questions: Vec<Question> = (0..total)
            .map(|i| Question {
                id: format!("q{i}"),
                kind: QuestionType::FillBlank,
                question: "?".into(),
                options: None,
                correct_answer: "yes".into(),
                explanation: None,
                difficulty: None,
            })
            .collect();
        let answers: Vec<SubmittedAnswer> = (0..correct)
            .map(|i| SubmittedAnswer::new(format!("q{i}"), "yes"))
            .collect();
        Attempt::from_report(
            AttemptId::new(),
            QuizId::new(),
            UserId::new(),
            grade(&questions, &answers),
            0,
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn no_attempts_average_zero() {
        let stats = UserStats::compute(2, 1, &[]);
        assert_eq!(stats.total_attempts, 0);
        assert_eq!(stats.avg_score, 0.0);
    }

    #[test]
    fn averages_and_rounds() {
        let attempts = vec![attempt(1, 3), attempt(2, 2), attempt(0, 4)];
        // (33.33 + 100 + 0) / 3 = 44.443...
        assert_eq!(average_score(&attempts), 44.44);
        let stats = UserStats::compute(1, 3, &attempts);
        assert_eq!(stats.total_attempts, 3);
        assert_eq!(stats.total_quizzes, 3);
    }
}
