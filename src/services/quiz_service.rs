use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use validator::Validate;

use crate::{
    auth::{AccessPolicy, Claims},
    errors::{AppError, AppResult},
    models::domain::{Quiz, QuizStatus},
    models::dto::request::{CreateQuizRequest, UpdateQuizRequest},
    repositories::QuizRepository,
};

static NON_SLUG_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("NON_SLUG_CHARS is a valid regex pattern"));

/// Lowercase, hyphen-separated slug derived from a quiz title.
pub fn derive_slug(title: &str) -> String {
    NON_SLUG_CHARS
        .replace_all(&title.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

pub struct QuizService {
    quizzes: Arc<dyn QuizRepository>,
    policy: Arc<AccessPolicy>,
}

impl QuizService {
    pub fn new(quizzes: Arc<dyn QuizRepository>, policy: Arc<AccessPolicy>) -> Self {
        Self { quizzes, policy }
    }

    pub async fn create_quiz(&self, claims: &Claims, request: CreateQuizRequest) -> AppResult<Quiz> {
        request.validate()?;

        let slug = request
            .slug
            .clone()
            .unwrap_or_else(|| derive_slug(&request.title));
        if slug.is_empty() {
            return Err(AppError::ValidationError(
                "slug: cannot derive a slug from this title".to_string(),
            ));
        }

        let mut quiz = Quiz::new(
            &request.course_id,
            &request.title,
            &slug,
            request.passing_score.unwrap_or(0.0),
        );

        self.policy.ensure_can_manage(claims, &quiz).await?;

        quiz.description = request.description;
        quiz.instructions = request.instructions;
        quiz.time_limit_minutes = request.time_limit_minutes.filter(|minutes| *minutes > 0);
        if let Some(retakes) = request.retakes {
            quiz.retakes = retakes;
        }
        quiz.randomize_questions = request.randomize_questions.unwrap_or(false);
        quiz.shuffle_answers = request.shuffle_answers.unwrap_or(false);
        quiz.questions_per_attempt = clamp_pool_size(request.questions_per_attempt);
        quiz.show_explanations = request.show_explanations.unwrap_or(false);
        quiz.allow_review = request.allow_review.unwrap_or(false);

        self.quizzes.create(quiz).await
    }

    pub async fn update_quiz(
        &self,
        quiz_id: &str,
        claims: &Claims,
        request: UpdateQuizRequest,
    ) -> AppResult<Quiz> {
        request.validate()?;

        let mut quiz = self.require_quiz(quiz_id).await?;
        self.policy.ensure_can_manage(claims, &quiz).await?;

        if let Some(title) = request.title {
            quiz.title = title;
            if request.slug.is_none() {
                quiz.slug = derive_slug(&quiz.title);
            }
        }
        if let Some(slug) = request.slug {
            quiz.slug = slug;
        }
        if let Some(status) = request.status {
            quiz.status = status;
        }
        if let Some(description) = request.description {
            quiz.description = Some(description);
        }
        if let Some(instructions) = request.instructions {
            quiz.instructions = Some(instructions);
        }
        if let Some(passing_score) = request.passing_score {
            quiz.passing_score = passing_score;
        }
        if let Some(minutes) = request.time_limit_minutes {
            quiz.time_limit_minutes = Some(minutes).filter(|m| *m > 0);
        }
        if let Some(retakes) = request.retakes {
            quiz.retakes = retakes;
        }
        if let Some(randomize) = request.randomize_questions {
            quiz.randomize_questions = randomize;
        }
        if let Some(shuffle) = request.shuffle_answers {
            quiz.shuffle_answers = shuffle;
        }
        if request.questions_per_attempt.is_some() {
            quiz.questions_per_attempt = clamp_pool_size(request.questions_per_attempt);
        }
        if let Some(show) = request.show_explanations {
            quiz.show_explanations = show;
        }
        if let Some(allow) = request.allow_review {
            quiz.allow_review = allow;
        }
        quiz.modified_at = Some(Utc::now());

        self.quizzes.update(quiz).await
    }

    /// Drafts are only visible to their managing staff; everyone else gets
    /// a 404 rather than a hint that the quiz exists.
    pub async fn get_quiz(&self, quiz_id: &str, claims: &Claims) -> AppResult<Quiz> {
        let quiz = self.require_quiz(quiz_id).await?;

        if quiz.status == QuizStatus::Draft
            && self.policy.ensure_can_manage(claims, &quiz).await.is_err()
        {
            return Err(AppError::NotFound(format!(
                "Quiz with id '{}' not found",
                quiz_id
            )));
        }

        Ok(quiz)
    }

    /// Learners only see published quizzes. The filter runs in the store so
    /// drafts never occupy page slots and `total` reflects the visible set.
    pub async fn list_quizzes_by_course(
        &self,
        course_id: &str,
        claims: &Claims,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Quiz>, i64)> {
        let published_only = !claims.role.is_staff();
        self.quizzes
            .list_by_course(course_id, published_only, offset, limit)
            .await
    }

    async fn require_quiz(&self, quiz_id: &str) -> AppResult<Quiz> {
        self.quizzes
            .find_by_id(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", quiz_id)))
    }
}

/// A pool size outside 1..=u32::MAX means "serve the whole bank".
fn clamp_pool_size(requested: Option<i64>) -> Option<u32> {
    requested
        .filter(|size| *size >= 1)
        .and_then(|size| u32::try_from(size).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserRole;
    use crate::repositories::course_repository::MockCourseRepository;
    use crate::repositories::quiz_repository::MockQuizRepository;

    fn service(quizzes: MockQuizRepository) -> QuizService {
        QuizService::new(
            Arc::new(quizzes),
            Arc::new(AccessPolicy::new(Arc::new(MockCourseRepository::new()))),
        )
    }

    #[tokio::test]
    async fn learner_listing_filters_to_published_in_the_store() {
        let mut quizzes = MockQuizRepository::new();
        quizzes
            .expect_list_by_course()
            .withf(|_, published_only, _, _| *published_only)
            .returning(|_, _, _, _| Ok((vec![], 0)));

        let (items, total) = service(quizzes)
            .list_quizzes_by_course("course-1", &Claims::new("stud-1", UserRole::Student, 1), 0, 20)
            .await
            .expect("list should succeed");
        assert!(items.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn staff_listing_includes_drafts() {
        let mut quizzes = MockQuizRepository::new();
        quizzes
            .expect_list_by_course()
            .withf(|_, published_only, _, _| !published_only)
            .returning(|_, _, _, _| Ok((vec![Quiz::new("course-1", "Basics", "basics", 70.0)], 1)));

        let (items, total) = service(quizzes)
            .list_quizzes_by_course("course-1", &Claims::new("teach-1", UserRole::Instructor, 1), 0, 20)
            .await
            .expect("list should succeed");
        assert_eq!(items.len(), 1);
        assert_eq!(total, 1);
    }

    #[test]
    fn slug_is_derived_from_title() {
        assert_eq!(derive_slug("Intro to Rust!"), "intro-to-rust");
        assert_eq!(derive_slug("  Module 3:  Ownership & Borrowing "), "module-3-ownership-borrowing");
        assert_eq!(derive_slug("---"), "");
    }

    #[test]
    fn pool_size_outside_range_clamps_to_unset() {
        assert_eq!(clamp_pool_size(Some(0)), None);
        assert_eq!(clamp_pool_size(Some(-3)), None);
        assert_eq!(clamp_pool_size(Some(5)), Some(5));
        assert_eq!(clamp_pool_size(None), None);

        // A value that would wrap to zero as u32 must not become Some(0).
        assert_eq!(clamp_pool_size(Some(u32::MAX as i64 + 1)), None);
        assert_eq!(clamp_pool_size(Some(u32::MAX as i64)), Some(u32::MAX));
    }
}
