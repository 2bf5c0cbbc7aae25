use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::quiz_attempt::{AttemptStatus, QuestionResponse, QuizAttempt};

/// Attempt payload as returned to callers. Solution and explanation fields
/// are `Option` so the visibility layer can omit them entirely for learners.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptDto {
    pub id: String,
    pub quiz_id: String,
    pub user_id: String,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<i64>,
    pub attempt_number: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub questions: Vec<AttemptQuestionDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptQuestionDto {
    pub question_id: String,
    pub prompt: String,
    #[serde(flatten)]
    pub body: AttemptQuestionBodyDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub points_possible: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<QuestionResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_earned: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,
}

/// Question body with solution data representable as absent.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AttemptQuestionBodyDto {
    MultipleChoice { options: Vec<AnswerOptionDto> },
    TrueFalse {
        #[serde(skip_serializing_if = "Option::is_none")]
        answer: Option<bool>,
    },
    ShortAnswer {
        #[serde(skip_serializing_if = "Option::is_none")]
        answer: Option<String>,
    },
    Matching { pairs: Vec<MatchPairDto> },
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerOptionDto {
    pub id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchPairDto {
    pub id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

/// List row; question snapshots are never included in list views.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptSummaryDto {
    pub id: String,
    pub quiz_id: String,
    pub user_id: String,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub attempt_number: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
}

impl AttemptSummaryDto {
    pub fn from_attempt(attempt: &QuizAttempt) -> Self {
        let terminal = attempt.status.is_terminal();

        AttemptSummaryDto {
            id: attempt.id.clone(),
            quiz_id: attempt.quiz_id.clone(),
            user_id: attempt.user_id.clone(),
            status: attempt.status,
            started_at: attempt.started_at,
            completed_at: attempt.completed_at,
            attempt_number: attempt.attempt_number,
            score: terminal.then_some(attempt.score),
            percentage: terminal.then_some(attempt.percentage),
            passed: terminal.then_some(attempt.passed),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
}
