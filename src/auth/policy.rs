use std::sync::Arc;

use crate::{
    auth::claims::{Claims, UserRole},
    errors::{AppError, AppResult},
    models::domain::{Quiz, QuizAttempt},
    repositories::CourseRepository,
};

/// Who may start, view, list, or grade. Admins act on anything; instructors
/// only on courses they own; learners only on their own attempts.
pub struct AccessPolicy {
    courses: Arc<dyn CourseRepository>,
}

impl AccessPolicy {
    pub fn new(courses: Arc<dyn CourseRepository>) -> Self {
        Self { courses }
    }

    /// Instructor must own the quiz's course; admin always passes.
    pub async fn ensure_can_manage(&self, claims: &Claims, quiz: &Quiz) -> AppResult<()> {
        match claims.role {
            UserRole::Admin => Ok(()),
            UserRole::Instructor => {
                let owner = self
                    .courses
                    .instructor_for_course(&quiz.course_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Course '{}' not found", quiz.course_id))
                    })?;

                if owner == claims.sub {
                    Ok(())
                } else {
                    Err(AppError::Forbidden(
                        "You do not manage this course".to_string(),
                    ))
                }
            }
            UserRole::Student => Err(AppError::Forbidden(
                "Students cannot manage quizzes or questions".to_string(),
            )),
        }
    }

    /// A learner may only see their own attempt. Another learner's attempt
    /// is reported as missing rather than forbidden, so its existence is
    /// never leaked.
    pub async fn ensure_can_view_attempt(
        &self,
        claims: &Claims,
        attempt: &QuizAttempt,
        quiz: &Quiz,
    ) -> AppResult<()> {
        if attempt.user_id == claims.sub {
            return Ok(());
        }

        match claims.role {
            UserRole::Admin => Ok(()),
            UserRole::Instructor => self.ensure_can_manage(claims, quiz).await,
            UserRole::Student => Err(AppError::NotFound(format!(
                "Attempt with id '{}' not found",
                attempt.id
            ))),
        }
    }

    /// Staff-only operations on attempts (grading feedback, filtered lists).
    pub async fn ensure_can_grade(&self, claims: &Claims, quiz: &Quiz) -> AppResult<()> {
        match claims.role {
            UserRole::Admin => Ok(()),
            UserRole::Instructor => self.ensure_can_manage(claims, quiz).await,
            UserRole::Student => Err(AppError::Forbidden(
                "Students cannot grade attempts".to_string(),
            )),
        }
    }
}
