pub mod course_repository;
pub mod question_repository;
pub mod quiz_attempt_repository;
pub mod quiz_repository;

pub use course_repository::{CourseRepository, MongoCourseRepository};
pub use question_repository::{MongoQuestionRepository, QuestionRepository};
pub use quiz_attempt_repository::{MongoQuizAttemptRepository, QuizAttemptRepository};
pub use quiz_repository::{MongoQuizRepository, QuizRepository};
