pub mod attempt_service;
pub mod grading;
pub mod question_service;
pub mod quiz_service;
pub mod visibility;

pub use attempt_service::AttemptService;
pub use question_service::QuestionService;
pub use quiz_service::QuizService;
