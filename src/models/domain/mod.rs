pub mod question;
pub mod quiz;
pub mod quiz_attempt;

pub use question::{Question, QuestionBody, QuestionKind};
pub use quiz::{Quiz, QuizStatus};
pub use quiz_attempt::{AttemptQuestion, AttemptStatus, QuestionResponse, QuizAttempt};
