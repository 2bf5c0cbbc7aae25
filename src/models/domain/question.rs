use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reusable question in a quiz's bank. The kind-specific data lives in
/// [`QuestionBody`] so grading and masking can match exhaustively.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub quiz_id: String,
    pub prompt: String,
    #[serde(flatten)]
    pub body: QuestionBody,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub points: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

/// Kind-specific payload. Adding a variant forces every grading and masking
/// match to be revisited.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum QuestionBody {
    MultipleChoice { options: Vec<AnswerOption> },
    TrueFalse { answer: bool },
    ShortAnswer { answer: String },
    Matching { pairs: Vec<MatchPair> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    Matching,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AnswerOption {
    pub id: String,
    pub text: String,
    pub correct: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MatchPair {
    pub id: String,
    pub text: String,
    pub expected: String,
}

pub const MIN_POINTS: f64 = 0.5;
pub const MAX_POINTS: f64 = 100.0;
pub const DEFAULT_POINTS: f64 = 1.0;

impl QuestionBody {
    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionBody::MultipleChoice { .. } => QuestionKind::MultipleChoice,
            QuestionBody::TrueFalse { .. } => QuestionKind::TrueFalse,
            QuestionBody::ShortAnswer { .. } => QuestionKind::ShortAnswer,
            QuestionBody::Matching { .. } => QuestionKind::Matching,
        }
    }
}

impl Question {
    pub fn new(quiz_id: &str, prompt: &str, body: QuestionBody) -> Self {
        Question {
            id: Uuid::new_v4().to_string(),
            quiz_id: quiz_id.to_string(),
            prompt: prompt.to_string(),
            body,
            difficulty: Difficulty::Medium,
            tags: Vec::new(),
            points: DEFAULT_POINTS,
            explanation: None,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    pub fn kind(&self) -> QuestionKind {
        self.body.kind()
    }
}
