#![forbid(unsafe_code)]

pub mod ai;
pub mod analytics_service;
pub mod app_services;
pub mod attempt_service;
pub mod error;
pub mod extraction;
pub mod material_service;
pub mod question_generator;
pub mod quiz_service;

pub use quiz_core::Clock;

pub use ai::{CompletionClient, CompletionConfig, OpenAiClient};
pub use analytics_service::AnalyticsService;
pub use app_services::AppServices;
pub use attempt_service::{AttemptService, Submission, SubmissionResult};
pub use error::{
    AnalyticsError, AppServicesError, AttemptServiceError, CompletionError, ConfigError,
    ExtractionError, GenerationError, MaterialServiceError, QuizServiceError,
};
pub use extraction::{FileTextExtractor, TextExtractor};
pub use material_service::{MaterialService, Upload};
pub use question_generator::{GenerationRequest, QuestionGenerator};
pub use quiz_service::{QuizRequest, QuizService};
