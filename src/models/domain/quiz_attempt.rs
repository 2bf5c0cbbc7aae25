use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::question::{Question, QuestionBody};

/// One learner's graded instance of a quiz. Questions are frozen copies
/// taken at start time, so later bank edits never change historical grades.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct QuizAttempt {
    pub id: String,
    pub user_id: String,
    pub quiz_id: String,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Copied from the quiz at start time; immune to later quiz edits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<i64>,
    pub attempt_number: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
    pub score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub questions: Vec<AttemptQuestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AttemptStatus {
    InProgress,
    Completed,
    TimedOut,
}

impl AttemptStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttemptStatus::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "inProgress",
            AttemptStatus::Completed => "completed",
            AttemptStatus::TimedOut => "timedOut",
        }
    }
}

/// Frozen copy of a served question plus the learner's response and grade.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AttemptQuestion {
    pub question_id: String,
    pub prompt: String,
    #[serde(flatten)]
    pub body: QuestionBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub points_possible: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<QuestionResponse>,
    pub points_earned: f64,
    pub correct: bool,
}

/// What the learner submitted for one question, shaped per kind.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum QuestionResponse {
    Selected { option_ids: Vec<String> },
    Boolean { value: bool },
    Text { value: String },
    Matches { matches: HashMap<String, String> },
}

impl AttemptQuestion {
    /// Snapshot a bank question as it exists right now.
    pub fn snapshot(question: &Question) -> Self {
        AttemptQuestion {
            question_id: question.id.clone(),
            prompt: question.prompt.clone(),
            body: question.body.clone(),
            explanation: question.explanation.clone(),
            points_possible: question.points,
            response: None,
            points_earned: 0.0,
            correct: false,
        }
    }
}

impl QuizAttempt {
    pub fn start(
        user_id: &str,
        quiz_id: &str,
        time_limit_minutes: Option<i64>,
        attempt_number: i32,
        questions: Vec<AttemptQuestion>,
    ) -> Self {
        let max_score = questions.iter().map(|q| q.points_possible).sum();

        QuizAttempt {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            quiz_id: quiz_id.to_string(),
            status: AttemptStatus::InProgress,
            started_at: Utc::now(),
            completed_at: None,
            time_limit_minutes,
            attempt_number,
            duration_seconds: None,
            score: 0.0,
            max_score,
            percentage: 0.0,
            passed: false,
            feedback: None,
            questions,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    /// Deadline derived from the time-limit snapshot; untimed attempts
    /// never expire.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.time_limit_minutes
            .filter(|minutes| *minutes > 0)
            .map(|minutes| self.started_at + Duration::minutes(minutes))
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.status == AttemptStatus::InProgress
            && self.deadline().map(|deadline| now > deadline).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::question::QuestionBody;

    fn snapshot(question_id: &str, points: f64) -> AttemptQuestion {
        AttemptQuestion {
            question_id: question_id.to_string(),
            prompt: "Is water wet?".to_string(),
            body: QuestionBody::TrueFalse { answer: true },
            explanation: None,
            points_possible: points,
            response: None,
            points_earned: 0.0,
            correct: false,
        }
    }

    #[test]
    fn start_sums_max_score_from_snapshots() {
        let attempt = QuizAttempt::start(
            "user-1",
            "quiz-1",
            Some(30),
            1,
            vec![snapshot("q1", 5.0), snapshot("q2", 2.5)],
        );

        assert_eq!(attempt.status, AttemptStatus::InProgress);
        assert_eq!(attempt.max_score, 7.5);
        assert_eq!(attempt.score, 0.0);
        assert!(!attempt.passed);
    }

    #[test]
    fn untimed_attempt_never_expires() {
        let attempt = QuizAttempt::start("user-1", "quiz-1", None, 1, vec![snapshot("q1", 1.0)]);

        assert_eq!(attempt.deadline(), None);
        assert!(!attempt.is_expired_at(Utc::now() + Duration::days(365)));
    }

    #[test]
    fn timed_attempt_expires_after_deadline() {
        let attempt = QuizAttempt::start("user-1", "quiz-1", Some(10), 1, vec![snapshot("q1", 1.0)]);

        assert!(!attempt.is_expired_at(attempt.started_at + Duration::minutes(5)));
        assert!(attempt.is_expired_at(attempt.started_at + Duration::minutes(11)));
    }

    #[test]
    fn terminal_statuses_are_terminal() {
        assert!(!AttemptStatus::InProgress.is_terminal());
        assert!(AttemptStatus::Completed.is_terminal());
        assert!(AttemptStatus::TimedOut.is_terminal());
    }

    #[test]
    fn attempt_round_trip_serialization_preserves_grading_fields() {
        let mut attempt =
            QuizAttempt::start("user-1", "quiz-1", Some(30), 2, vec![snapshot("q1", 5.0)]);
        attempt.score = 5.0;
        attempt.percentage = 100.0;
        attempt.passed = true;
        attempt.status = AttemptStatus::Completed;

        let json = serde_json::to_string(&attempt).expect("attempt should serialize");
        let parsed: QuizAttempt = serde_json::from_str(&json).expect("attempt should deserialize");

        assert_eq!(parsed.attempt_number, 2);
        assert_eq!(parsed.score, 5.0);
        assert_eq!(parsed.status, AttemptStatus::Completed);
        assert!(parsed.passed);
    }
}
