use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    auth::{AccessPolicy, Claims},
    errors::{AppError, AppResult},
    models::domain::question::{MAX_POINTS, MIN_POINTS},
    models::domain::{Question, QuestionBody, QuestionKind, Quiz},
    models::dto::request::{CreateQuestionRequest, UpdateQuestionRequest},
    repositories::{QuestionRepository, QuizRepository},
};

pub struct QuestionService {
    questions: Arc<dyn QuestionRepository>,
    quizzes: Arc<dyn QuizRepository>,
    policy: Arc<AccessPolicy>,
}

impl QuestionService {
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        quizzes: Arc<dyn QuizRepository>,
        policy: Arc<AccessPolicy>,
    ) -> Self {
        Self {
            questions,
            quizzes,
            policy,
        }
    }

    pub async fn create_question(
        &self,
        quiz_id: &str,
        claims: &Claims,
        request: CreateQuestionRequest,
    ) -> AppResult<Question> {
        request.validate()?;

        let quiz = self.get_managed_quiz(quiz_id, claims).await?;

        let body = build_body(request.kind, &request)?;
        let mut question = Question::new(&quiz.id, &request.prompt, body);

        if let Some(difficulty) = request.difficulty {
            question.difficulty = difficulty;
        }
        question.tags = request.tags;
        if let Some(points) = request.points {
            question.points = points;
        }
        question.explanation = request.explanation;

        validate_question(&question)?;

        self.questions.create(question).await
    }

    /// Partial update. Past attempt snapshots are never touched; they carry
    /// their own frozen copy of the question.
    pub async fn update_question(
        &self,
        question_id: &str,
        claims: &Claims,
        request: UpdateQuestionRequest,
    ) -> AppResult<Question> {
        request.validate()?;

        let mut question = self.require_question(question_id).await?;
        self.get_managed_quiz(&question.quiz_id, claims).await?;

        question.body = patched_body(question.body, &request)?;

        if let Some(prompt) = request.prompt {
            question.prompt = prompt;
        }
        if let Some(difficulty) = request.difficulty {
            question.difficulty = difficulty;
        }
        if let Some(tags) = request.tags {
            question.tags = tags;
        }
        if let Some(points) = request.points {
            question.points = points;
        }
        // An explicit null clears the explanation; an absent field keeps it.
        if let Some(explanation) = request.explanation {
            question.explanation = explanation;
        }

        question.modified_at = Some(Utc::now());

        validate_question(&question)?;

        self.questions.update(question).await
    }

    /// Deletion never cascades into historical attempts.
    pub async fn delete_question(&self, question_id: &str, claims: &Claims) -> AppResult<()> {
        let question = self.require_question(question_id).await?;
        self.get_managed_quiz(&question.quiz_id, claims).await?;

        let deleted = self.questions.delete(question_id).await?;
        if !deleted {
            return Err(AppError::NotFound(format!(
                "Question with id '{}' not found",
                question_id
            )));
        }
        Ok(())
    }

    pub async fn get_question(&self, question_id: &str, claims: &Claims) -> AppResult<Question> {
        let question = self.require_question(question_id).await?;
        self.get_managed_quiz(&question.quiz_id, claims).await?;
        Ok(question)
    }

    /// Bank listing includes reference answers, so it is staff-only.
    /// Learners only ever see questions through attempt snapshots.
    pub async fn list_questions(&self, quiz_id: &str, claims: &Claims) -> AppResult<Vec<Question>> {
        self.get_managed_quiz(quiz_id, claims).await?;
        self.questions.find_by_quiz(quiz_id).await
    }

    async fn require_question(&self, question_id: &str) -> AppResult<Question> {
        self.questions
            .find_by_id(question_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Question with id '{}' not found", question_id))
            })
    }

    async fn get_managed_quiz(&self, quiz_id: &str, claims: &Claims) -> AppResult<Quiz> {
        let quiz = self
            .quizzes
            .find_by_id(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", quiz_id)))?;

        self.policy.ensure_can_manage(claims, &quiz).await?;
        Ok(quiz)
    }
}

fn build_body(kind: QuestionKind, request: &CreateQuestionRequest) -> AppResult<QuestionBody> {
    match kind {
        QuestionKind::MultipleChoice => request
            .options
            .clone()
            .map(|options| QuestionBody::MultipleChoice { options })
            .ok_or_else(|| {
                AppError::ValidationError(
                    "options: required for multiple-choice questions".to_string(),
                )
            }),
        QuestionKind::TrueFalse => request
            .answer
            .map(|answer| QuestionBody::TrueFalse { answer })
            .ok_or_else(|| {
                AppError::ValidationError("answer: required for true/false questions".to_string())
            }),
        QuestionKind::ShortAnswer => request
            .text_answer
            .clone()
            .map(|answer| QuestionBody::ShortAnswer { answer })
            .ok_or_else(|| {
                AppError::ValidationError(
                    "textAnswer: required for short-answer questions".to_string(),
                )
            }),
        QuestionKind::Matching => request
            .pairs
            .clone()
            .map(|pairs| QuestionBody::Matching { pairs })
            .ok_or_else(|| {
                AppError::ValidationError("pairs: required for matching questions".to_string())
            }),
    }
}

/// Apply a partial update to the kind-specific payload. The question's kind
/// is fixed at creation; payload fields for other kinds are ignored.
fn patched_body(body: QuestionBody, request: &UpdateQuestionRequest) -> AppResult<QuestionBody> {
    Ok(match body {
        QuestionBody::MultipleChoice { options } => QuestionBody::MultipleChoice {
            options: request.options.clone().unwrap_or(options),
        },
        QuestionBody::TrueFalse { answer } => QuestionBody::TrueFalse {
            answer: request.answer.unwrap_or(answer),
        },
        QuestionBody::ShortAnswer { answer } => QuestionBody::ShortAnswer {
            answer: request.text_answer.clone().unwrap_or(answer),
        },
        QuestionBody::Matching { pairs } => QuestionBody::Matching {
            pairs: request.pairs.clone().unwrap_or(pairs),
        },
    })
}

/// Kind-specific invariants plus the point-value range.
pub fn validate_question(question: &Question) -> AppResult<()> {
    if !(MIN_POINTS..=MAX_POINTS).contains(&question.points) {
        return Err(AppError::ValidationError(format!(
            "points: must be between {} and {}",
            MIN_POINTS, MAX_POINTS
        )));
    }

    if question.prompt.trim().is_empty() {
        return Err(AppError::ValidationError(
            "prompt: must not be blank".to_string(),
        ));
    }

    match &question.body {
        QuestionBody::MultipleChoice { options } => {
            if options.is_empty() {
                return Err(AppError::ValidationError(
                    "options: multiple-choice questions need at least one option".to_string(),
                ));
            }
            if !options.iter().any(|option| option.correct) {
                return Err(AppError::ValidationError(
                    "options: at least one option must be marked correct".to_string(),
                ));
            }
        }
        QuestionBody::TrueFalse { .. } => {}
        QuestionBody::ShortAnswer { answer } => {
            if answer.trim().is_empty() {
                return Err(AppError::ValidationError(
                    "answer: short-answer reference must not be blank".to_string(),
                ));
            }
        }
        QuestionBody::Matching { pairs } => {
            if pairs.is_empty() {
                return Err(AppError::ValidationError(
                    "pairs: matching questions need at least one pair".to_string(),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserRole;
    use crate::models::domain::question::AnswerOption;
    use crate::repositories::course_repository::MockCourseRepository;
    use crate::repositories::question_repository::MockQuestionRepository;
    use crate::repositories::quiz_repository::MockQuizRepository;

    fn mc_question(options: Vec<AnswerOption>) -> Question {
        Question::new("quiz-1", "Pick one", QuestionBody::MultipleChoice { options })
    }

    fn option(id: &str, correct: bool) -> AnswerOption {
        AnswerOption {
            id: id.to_string(),
            text: id.to_string(),
            correct,
        }
    }

    #[test]
    fn multiple_choice_needs_options_and_a_correct_one() {
        let no_options = mc_question(vec![]);
        assert!(matches!(
            validate_question(&no_options),
            Err(AppError::ValidationError(msg)) if msg.starts_with("options:")
        ));

        let no_correct = mc_question(vec![option("a", false)]);
        assert!(matches!(
            validate_question(&no_correct),
            Err(AppError::ValidationError(msg)) if msg.contains("correct")
        ));

        let valid = mc_question(vec![option("a", true), option("b", false)]);
        assert!(validate_question(&valid).is_ok());
    }

    #[test]
    fn short_answer_reference_must_not_be_blank() {
        let question = Question::new(
            "quiz-1",
            "Name the keyword",
            QuestionBody::ShortAnswer {
                answer: "   ".to_string(),
            },
        );

        assert!(matches!(
            validate_question(&question),
            Err(AppError::ValidationError(msg)) if msg.starts_with("answer:")
        ));
    }

    #[test]
    fn matching_needs_at_least_one_pair() {
        let question = Question::new(
            "quiz-1",
            "Match them",
            QuestionBody::Matching { pairs: vec![] },
        );

        assert!(matches!(
            validate_question(&question),
            Err(AppError::ValidationError(msg)) if msg.starts_with("pairs:")
        ));
    }

    #[test]
    fn point_value_is_range_checked() {
        let mut question = mc_question(vec![option("a", true)]);

        question.points = 0.25;
        assert!(validate_question(&question).is_err());

        question.points = 150.0;
        assert!(validate_question(&question).is_err());

        question.points = 0.5;
        assert!(validate_question(&question).is_ok());
    }

    #[tokio::test]
    async fn update_rewrites_prompt_and_payload_in_one_call() {
        let mut questions = MockQuestionRepository::new();
        questions.expect_find_by_id().returning(|_| {
            let mut question = Question::new(
                "quiz-1",
                "Old prompt",
                QuestionBody::TrueFalse { answer: true },
            );
            question.id = "q1".to_string();
            question.explanation = Some("Stale note".to_string());
            Ok(Some(question))
        });
        questions.expect_update().returning(|question| Ok(question));

        let mut quizzes = MockQuizRepository::new();
        quizzes
            .expect_find_by_id()
            .returning(|_| Ok(Some(Quiz::new("course-1", "Basics", "basics", 70.0))));

        let service = QuestionService::new(
            Arc::new(questions),
            Arc::new(quizzes),
            Arc::new(AccessPolicy::new(Arc::new(MockCourseRepository::new()))),
        );

        let request = UpdateQuestionRequest {
            prompt: Some("New prompt".to_string()),
            difficulty: None,
            tags: None,
            points: None,
            explanation: Some(None),
            options: None,
            answer: Some(false),
            text_answer: None,
            pairs: None,
        };

        let updated = service
            .update_question("q1", &Claims::new("root", UserRole::Admin, 1), request)
            .await
            .expect("update should succeed");

        assert_eq!(updated.prompt, "New prompt");
        assert_eq!(updated.body, QuestionBody::TrueFalse { answer: false });
        assert!(updated.explanation.is_none());
    }

    #[test]
    fn patched_body_keeps_kind_fixed() {
        let body = QuestionBody::TrueFalse { answer: true };
        let request = UpdateQuestionRequest {
            prompt: None,
            difficulty: None,
            tags: None,
            points: None,
            explanation: None,
            options: Some(vec![option("a", true)]),
            answer: Some(false),
            text_answer: None,
            pairs: None,
        };

        let patched = patched_body(body, &request).unwrap();
        assert_eq!(patched, QuestionBody::TrueFalse { answer: false });
    }
}
