use std::collections::HashSet;

use crate::errors::{AppError, AppResult};
use crate::models::domain::quiz_attempt::{AttemptQuestion, QuestionResponse};
use crate::models::domain::QuestionBody;

/// Aggregate result of grading one attempt's snapshots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeSummary {
    pub score: f64,
    pub max_score: f64,
    pub percentage: f64,
}

/// Grade every snapshot in place and aggregate. Deterministic: the same
/// snapshots and responses always produce the same summary.
pub fn grade_attempt(questions: &mut [AttemptQuestion]) -> AppResult<GradeSummary> {
    let mut score = 0.0;
    let mut max_score = 0.0;

    for question in questions.iter_mut() {
        let (correct, earned) = grade_question(question)?;
        question.correct = correct;
        question.points_earned = earned;

        score += earned;
        max_score += question.points_possible;
    }

    let percentage = if max_score > 0.0 {
        100.0 * score / max_score
    } else {
        0.0
    };

    Ok(GradeSummary {
        score,
        max_score,
        percentage,
    })
}

/// Pure per-question grading, keyed by kind. A snapshot that cannot be
/// graded at all (no options, no correct option, empty reference) is a
/// configuration fault and aborts the whole submission.
pub fn grade_question(question: &AttemptQuestion) -> AppResult<(bool, f64)> {
    let possible = question.points_possible;

    match &question.body {
        QuestionBody::MultipleChoice { options } => {
            let correct_ids: HashSet<&str> = options
                .iter()
                .filter(|opt| opt.correct)
                .map(|opt| opt.id.as_str())
                .collect();

            if options.is_empty() || correct_ids.is_empty() {
                return Err(AppError::GradingInvariantViolation(format!(
                    "Multiple-choice question '{}' has no correct options",
                    question.question_id
                )));
            }

            let Some(QuestionResponse::Selected { option_ids }) = &question.response else {
                return Ok((false, 0.0));
            };

            let selected_ids: HashSet<&str> = option_ids.iter().map(|id| id.as_str()).collect();

            // All-or-nothing: any subset or superset mismatch scores zero.
            let correct = selected_ids == correct_ids;
            Ok((correct, if correct { possible } else { 0.0 }))
        }

        QuestionBody::TrueFalse { answer } => {
            let Some(QuestionResponse::Boolean { value }) = &question.response else {
                return Ok((false, 0.0));
            };

            let correct = value == answer;
            Ok((correct, if correct { possible } else { 0.0 }))
        }

        QuestionBody::ShortAnswer { answer } => {
            let reference = answer.trim().to_lowercase();
            if reference.is_empty() {
                return Err(AppError::GradingInvariantViolation(format!(
                    "Short-answer question '{}' has a blank reference answer",
                    question.question_id
                )));
            }

            let Some(QuestionResponse::Text { value }) = &question.response else {
                return Ok((false, 0.0));
            };

            // Reference must appear as a case-insensitive substring of the
            // trimmed response.
            let correct = value.trim().to_lowercase().contains(&reference);
            Ok((correct, if correct { possible } else { 0.0 }))
        }

        QuestionBody::Matching { pairs } => {
            if pairs.is_empty() {
                return Err(AppError::GradingInvariantViolation(format!(
                    "Matching question '{}' has no pairs",
                    question.question_id
                )));
            }

            let Some(QuestionResponse::Matches { matches }) = &question.response else {
                return Ok((false, 0.0));
            };

            let total = pairs.len();
            let matched = pairs
                .iter()
                .filter(|pair| {
                    matches
                        .get(&pair.id)
                        .map(|submitted| *submitted == pair.expected)
                        .unwrap_or(false)
                })
                .count();

            // Prorated credit; fully correct only when every pair matches.
            let earned = possible * matched as f64 / total as f64;
            Ok((matched == total, earned))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::models::domain::question::{AnswerOption, MatchPair};

    fn snapshot(body: QuestionBody, points: f64, response: Option<QuestionResponse>) -> AttemptQuestion {
        AttemptQuestion {
            question_id: "q1".to_string(),
            prompt: "prompt".to_string(),
            body,
            explanation: None,
            points_possible: points,
            response,
            points_earned: 0.0,
            correct: false,
        }
    }

    fn mc_body() -> QuestionBody {
        QuestionBody::MultipleChoice {
            options: vec![
                AnswerOption {
                    id: "a".to_string(),
                    text: "2".to_string(),
                    correct: true,
                },
                AnswerOption {
                    id: "b".to_string(),
                    text: "4".to_string(),
                    correct: true,
                },
                AnswerOption {
                    id: "c".to_string(),
                    text: "5".to_string(),
                    correct: false,
                },
            ],
        }
    }

    fn selected(ids: &[&str]) -> Option<QuestionResponse> {
        Some(QuestionResponse::Selected {
            option_ids: ids.iter().map(|id| id.to_string()).collect(),
        })
    }

    #[test]
    fn multiple_choice_requires_exact_set_equality() {
        let exact = snapshot(mc_body(), 4.0, selected(&["a", "b"]));
        assert_eq!(grade_question(&exact).unwrap(), (true, 4.0));

        // Order does not matter, only the set.
        let reordered = snapshot(mc_body(), 4.0, selected(&["b", "a"]));
        assert_eq!(grade_question(&reordered).unwrap(), (true, 4.0));

        let subset = snapshot(mc_body(), 4.0, selected(&["a"]));
        assert_eq!(grade_question(&subset).unwrap(), (false, 0.0));

        let superset = snapshot(mc_body(), 4.0, selected(&["a", "b", "c"]));
        assert_eq!(grade_question(&superset).unwrap(), (false, 0.0));

        let unanswered = snapshot(mc_body(), 4.0, None);
        assert_eq!(grade_question(&unanswered).unwrap(), (false, 0.0));
    }

    #[test]
    fn multiple_choice_with_no_correct_option_is_fatal() {
        let body = QuestionBody::MultipleChoice {
            options: vec![AnswerOption {
                id: "a".to_string(),
                text: "2".to_string(),
                correct: false,
            }],
        };
        let question = snapshot(body, 1.0, selected(&["a"]));

        let result = grade_question(&question);
        assert!(matches!(
            result,
            Err(AppError::GradingInvariantViolation(_))
        ));
    }

    #[test]
    fn true_false_matches_reference_boolean() {
        let right = snapshot(
            QuestionBody::TrueFalse { answer: true },
            2.0,
            Some(QuestionResponse::Boolean { value: true }),
        );
        assert_eq!(grade_question(&right).unwrap(), (true, 2.0));

        let wrong = snapshot(
            QuestionBody::TrueFalse { answer: true },
            2.0,
            Some(QuestionResponse::Boolean { value: false }),
        );
        assert_eq!(grade_question(&wrong).unwrap(), (false, 0.0));
    }

    #[test]
    fn short_answer_is_case_insensitive_substring() {
        let body = QuestionBody::ShortAnswer {
            answer: "Ownership".to_string(),
        };

        let exact = snapshot(
            body.clone(),
            1.0,
            Some(QuestionResponse::Text {
                value: "  ownership  ".to_string(),
            }),
        );
        assert_eq!(grade_question(&exact).unwrap(), (true, 1.0));

        let embedded = snapshot(
            body.clone(),
            1.0,
            Some(QuestionResponse::Text {
                value: "the OWNERSHIP model".to_string(),
            }),
        );
        assert_eq!(grade_question(&embedded).unwrap(), (true, 1.0));

        let miss = snapshot(
            body,
            1.0,
            Some(QuestionResponse::Text {
                value: "borrowing".to_string(),
            }),
        );
        assert_eq!(grade_question(&miss).unwrap(), (false, 0.0));
    }

    #[test]
    fn matching_prorates_by_correct_pair_count() {
        let body = QuestionBody::Matching {
            pairs: vec![
                MatchPair {
                    id: "p1".to_string(),
                    text: "Rust".to_string(),
                    expected: "2015".to_string(),
                },
                MatchPair {
                    id: "p2".to_string(),
                    text: "Go".to_string(),
                    expected: "2009".to_string(),
                },
                MatchPair {
                    id: "p3".to_string(),
                    text: "C".to_string(),
                    expected: "1972".to_string(),
                },
                MatchPair {
                    id: "p4".to_string(),
                    text: "Java".to_string(),
                    expected: "1995".to_string(),
                },
            ],
        };

        let mut matches = HashMap::new();
        matches.insert("p1".to_string(), "2015".to_string());
        matches.insert("p2".to_string(), "2009".to_string());
        matches.insert("p3".to_string(), "1972".to_string());
        matches.insert("p4".to_string(), "1889".to_string());

        let question = snapshot(
            body,
            10.0,
            Some(QuestionResponse::Matches { matches }),
        );

        // 3 of 4 pairs: prorated, but not fully correct.
        assert_eq!(grade_question(&question).unwrap(), (false, 7.5));
    }

    #[test]
    fn matching_with_all_pairs_correct_is_fully_correct() {
        let body = QuestionBody::Matching {
            pairs: vec![MatchPair {
                id: "p1".to_string(),
                text: "Rust".to_string(),
                expected: "2015".to_string(),
            }],
        };

        let mut matches = HashMap::new();
        matches.insert("p1".to_string(), "2015".to_string());

        let question = snapshot(body, 3.0, Some(QuestionResponse::Matches { matches }));
        assert_eq!(grade_question(&question).unwrap(), (true, 3.0));
    }

    #[test]
    fn mismatched_response_shape_scores_zero() {
        // A text response against a true/false snapshot is ungradable, not fatal.
        let question = snapshot(
            QuestionBody::TrueFalse { answer: true },
            2.0,
            Some(QuestionResponse::Text {
                value: "true".to_string(),
            }),
        );
        assert_eq!(grade_question(&question).unwrap(), (false, 0.0));
    }

    #[test]
    fn grade_attempt_aggregates_scenario_from_passing_rules() {
        // Two 5-point questions: trueFalse correct, shortAnswer incorrect.
        let mut questions = vec![
            snapshot(
                QuestionBody::TrueFalse { answer: false },
                5.0,
                Some(QuestionResponse::Boolean { value: false }),
            ),
            snapshot(
                QuestionBody::ShortAnswer {
                    answer: "lifetime".to_string(),
                },
                5.0,
                Some(QuestionResponse::Text {
                    value: "generics".to_string(),
                }),
            ),
        ];

        let summary = grade_attempt(&mut questions).unwrap();

        assert_eq!(summary.score, 5.0);
        assert_eq!(summary.max_score, 10.0);
        assert_eq!(summary.percentage, 50.0);
        assert!(questions[0].correct);
        assert!(!questions[1].correct);
    }

    #[test]
    fn grade_attempt_is_deterministic() {
        let make = || {
            vec![snapshot(
                mc_body(),
                4.0,
                selected(&["a", "b"]),
            )]
        };

        let mut first = make();
        let mut second = make();

        let summary_one = grade_attempt(&mut first).unwrap();
        let summary_two = grade_attempt(&mut second).unwrap();

        assert_eq!(summary_one, summary_two);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_attempt_grades_to_zero_percentage() {
        let mut questions: Vec<AttemptQuestion> = vec![];
        let summary = grade_attempt(&mut questions).unwrap();

        assert_eq!(summary.max_score, 0.0);
        assert_eq!(summary.percentage, 0.0);
    }
}
