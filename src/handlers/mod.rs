pub mod attempt_handler;
pub mod question_handler;
pub mod quiz_handler;

pub use attempt_handler::{add_feedback, get_attempt, list_attempts, start_attempt, submit_attempt};
pub use question_handler::{
    create_question, delete_question, get_question, list_questions, update_question,
};
pub use quiz_handler::{
    create_quiz, get_quiz, health_check, health_check_live, health_check_ready,
    list_course_quizzes, update_quiz,
};
