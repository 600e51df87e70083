pub mod attempt_service;
pub mod exam_service;
pub mod expiry_sweeper;
pub mod grading_service;
pub mod performance_service;
pub mod question_bank_service;
pub mod recommendation_service;
pub mod text_generation;

pub use attempt_service::AttemptService;
pub use exam_service::ExamService;
pub use expiry_sweeper::ExpirySweeper;
pub use grading_service::GradingEngine;
pub use performance_service::{PerformanceRefresher, PerformanceService};
pub use question_bank_service::QuestionBankService;
pub use recommendation_service::RecommendationService;
pub use text_generation::{OpenAiTextGenerator, TextGenerator};
