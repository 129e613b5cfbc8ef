mod attempt;
mod ids;
mod material;
mod question;
mod quiz;

pub use ids::{AttemptId, MaterialId, ParseIdError, QuizId, UserId};

pub use attempt::{Answer, Attempt, AttemptError};
pub use material::{
    Material, MaterialDraft, MaterialError, MaterialStatus, MediaType, format_file_size,
};
pub use question::{Question, QuestionError, QuestionType};
pub use quiz::{DifficultyLevel, Quiz, QuizDraft, QuizError};
