use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use validator::Validate;

use crate::models::domain::question::{AnswerOption, Difficulty, MatchPair};
use crate::models::domain::quiz_attempt::QuestionResponse;
use crate::models::domain::QuestionKind;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub prompt: String,

    pub kind: QuestionKind,

    pub difficulty: Option<Difficulty>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub points: Option<f64>,

    pub explanation: Option<String>,

    // Kind-specific payload; the service validates the right one is present.
    pub options: Option<Vec<AnswerOption>>,
    pub answer: Option<bool>,
    pub text_answer: Option<String>,
    pub pairs: Option<Vec<MatchPair>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub prompt: Option<String>,

    pub difficulty: Option<Difficulty>,

    pub tags: Option<Vec<String>>,

    pub points: Option<f64>,

    /// Absent keeps the stored explanation; an explicit null clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub explanation: Option<Option<String>>,

    pub options: Option<Vec<AnswerOption>>,
    pub answer: Option<bool>,
    pub text_answer: Option<String>,
    pub pairs: Option<Vec<MatchPair>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 200))]
    pub slug: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub course_id: String,

    pub description: Option<String>,
    pub instructions: Option<String>,

    #[validate(range(min = 0.0, max = 100.0))]
    pub passing_score: Option<f64>,

    pub time_limit_minutes: Option<i64>,

    #[validate(range(min = -1))]
    pub retakes: Option<i32>,

    pub randomize_questions: Option<bool>,
    pub shuffle_answers: Option<bool>,
    pub questions_per_attempt: Option<i64>,
    pub show_explanations: Option<bool>,
    pub allow_review: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 200))]
    pub slug: Option<String>,

    pub status: Option<crate::models::domain::QuizStatus>,

    pub description: Option<String>,
    pub instructions: Option<String>,

    #[validate(range(min = 0.0, max = 100.0))]
    pub passing_score: Option<f64>,

    pub time_limit_minutes: Option<i64>,

    #[validate(range(min = -1))]
    pub retakes: Option<i32>,

    pub randomize_questions: Option<bool>,
    pub shuffle_answers: Option<bool>,
    pub questions_per_attempt: Option<i64>,
    pub show_explanations: Option<bool>,
    pub allow_review: Option<bool>,
}

/// Distinguishes a field that was absent from one explicitly set to null.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// One learner answer in a submission. Only the field matching the
/// question's kind is read; the rest are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerInput {
    pub question_id: String,
    pub selected_option_ids: Option<Vec<String>>,
    pub value: Option<bool>,
    pub text: Option<String>,
    pub matches: Option<HashMap<String, String>>,
}

impl AnswerInput {
    /// Shape the raw input into the response form the snapshot's kind
    /// expects. A missing or mismatched payload stays ungraded.
    pub fn into_response(self, kind: QuestionKind) -> Option<QuestionResponse> {
        match kind {
            QuestionKind::MultipleChoice => self
                .selected_option_ids
                .map(|option_ids| QuestionResponse::Selected { option_ids }),
            QuestionKind::TrueFalse => self.value.map(|value| QuestionResponse::Boolean { value }),
            QuestionKind::ShortAnswer => self.text.map(|value| QuestionResponse::Text { value }),
            QuestionKind::Matching => self.matches.map(|matches| QuestionResponse::Matches { matches }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAttemptRequest {
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AttemptFeedbackRequest {
    #[validate(length(min = 1, max = 5000))]
    pub feedback: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AttemptListQuery {
    /// Staff-only filter; ignored for learners.
    pub user_id: Option<String>,

    #[validate(range(min = 0))]
    pub offset: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

impl AttemptListQuery {
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).min(100)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaginationParams {
    #[validate(range(min = 0))]
    pub offset: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            offset: Some(0),
            limit: Some(20),
        }
    }
}

impl PaginationParams {
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).min(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_input_shapes_by_kind() {
        let input = AnswerInput {
            question_id: "q1".to_string(),
            selected_option_ids: Some(vec!["o1".to_string()]),
            value: Some(true),
            text: Some("ferris".to_string()),
            matches: None,
        };

        let shaped = input.clone().into_response(QuestionKind::MultipleChoice);
        assert_eq!(
            shaped,
            Some(QuestionResponse::Selected {
                option_ids: vec!["o1".to_string()]
            })
        );

        let shaped = input.clone().into_response(QuestionKind::TrueFalse);
        assert_eq!(shaped, Some(QuestionResponse::Boolean { value: true }));

        // No matches payload supplied, so a matching question stays ungraded.
        let shaped = input.into_response(QuestionKind::Matching);
        assert_eq!(shaped, None);
    }

    #[test]
    fn update_question_distinguishes_null_from_absent_explanation() {
        let absent: UpdateQuestionRequest =
            serde_json::from_str(r#"{"prompt":"New prompt"}"#).expect("request should parse");
        assert_eq!(absent.explanation, None);

        let cleared: UpdateQuestionRequest =
            serde_json::from_str(r#"{"explanation":null}"#).expect("request should parse");
        assert_eq!(cleared.explanation, Some(None));

        let replaced: UpdateQuestionRequest =
            serde_json::from_str(r#"{"explanation":"Because two divides it"}"#)
                .expect("request should parse");
        assert_eq!(
            replaced.explanation,
            Some(Some("Because two divides it".to_string()))
        );
    }

    #[test]
    fn attempt_list_query_clamps_limit() {
        let query = AttemptListQuery {
            user_id: None,
            offset: None,
            limit: Some(500),
        };

        assert_eq!(query.offset(), 0);
        assert_eq!(query.limit(), 100);
    }

    #[test]
    fn create_quiz_request_validates_passing_score_range() {
        let request = CreateQuizRequest {
            title: "Basics".to_string(),
            slug: None,
            course_id: "course-1".to_string(),
            description: None,
            instructions: None,
            passing_score: Some(120.0),
            time_limit_minutes: None,
            retakes: None,
            randomize_questions: None,
            shuffle_answers: None,
            questions_per_attempt: None,
            show_explanations: None,
            allow_review: None,
        };

        assert!(request.validate().is_err());
    }
}
