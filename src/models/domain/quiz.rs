use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A configured assessment belonging to a course. The metadata block is
/// recomputed by the analytics collaborator; this service only stores it.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Quiz {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub slug: String,
    pub status: QuizStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub passing_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<i64>,
    pub retakes: i32,
    pub randomize_questions: bool,
    pub shuffle_answers: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions_per_attempt: Option<u32>,
    pub show_explanations: bool,
    pub allow_review: bool,
    pub metadata: QuizMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizStatus {
    Draft,
    Published,
}

impl QuizStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizStatus::Draft => "draft",
            QuizStatus::Published => "published",
        }
    }
}

/// Aggregate stats, written by the external analytics collaborator.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct QuizMetadata {
    pub question_count: u32,
    pub attempt_count: u32,
    pub average_score: f64,
    pub pass_rate: f64,
}

/// Unlimited graded attempts.
pub const UNLIMITED_RETAKES: i32 = -1;

impl Quiz {
    pub fn new(course_id: &str, title: &str, slug: &str, passing_score: f64) -> Self {
        Quiz {
            id: Uuid::new_v4().to_string(),
            course_id: course_id.to_string(),
            title: title.to_string(),
            slug: slug.to_string(),
            status: QuizStatus::Draft,
            description: None,
            instructions: None,
            passing_score,
            time_limit_minutes: None,
            retakes: UNLIMITED_RETAKES,
            randomize_questions: false,
            shuffle_answers: false,
            questions_per_attempt: None,
            show_explanations: false,
            allow_review: false,
            metadata: QuizMetadata::default(),
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == QuizStatus::Published
    }

    /// Untimed when no limit is stored or the stored limit is zero.
    pub fn effective_time_limit(&self) -> Option<i64> {
        self.time_limit_minutes.filter(|minutes| *minutes > 0)
    }

    pub fn allows_unlimited_retakes(&self) -> bool {
        self.retakes == UNLIMITED_RETAKES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_quiz_starts_as_unpublished_draft() {
        let quiz = Quiz::new("course-1", "Basics", "basics", 70.0);

        assert_eq!(quiz.status, QuizStatus::Draft);
        assert!(!quiz.is_published());
        assert!(quiz.allows_unlimited_retakes());
        assert_eq!(quiz.metadata, QuizMetadata::default());
    }

    #[test]
    fn zero_time_limit_means_untimed() {
        let mut quiz = Quiz::new("course-1", "Basics", "basics", 70.0);
        assert_eq!(quiz.effective_time_limit(), None);

        quiz.time_limit_minutes = Some(0);
        assert_eq!(quiz.effective_time_limit(), None);

        quiz.time_limit_minutes = Some(30);
        assert_eq!(quiz.effective_time_limit(), Some(30));
    }

    #[test]
    fn quiz_status_serializes_lowercase() {
        let json = serde_json::to_string(&QuizStatus::Published).expect("status should serialize");
        assert_eq!(json, "\"published\"");
    }
}
