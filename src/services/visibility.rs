use crate::models::domain::question::QuestionBody;
use crate::models::domain::quiz_attempt::AttemptQuestion;
use crate::models::domain::{Quiz, QuizAttempt};
use crate::models::dto::response::{
    AnswerOptionDto, AttemptDto, AttemptQuestionBodyDto, AttemptQuestionDto, MatchPairDto,
};

/// What a learner may see of their own attempt right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityFlags {
    pub reveal_solutions: bool,
    pub reveal_explanations: bool,
}

pub fn flags_for(attempt: &QuizAttempt, quiz: &Quiz) -> VisibilityFlags {
    let reveal_solutions = attempt.status.is_terminal() && quiz.allow_review;
    VisibilityFlags {
        reveal_solutions,
        reveal_explanations: reveal_solutions && quiz.show_explanations,
    }
}

/// Attempt payload for the owning learner, redacted per quiz policy and
/// attempt state.
pub fn learner_view(attempt: &QuizAttempt, quiz: &Quiz) -> AttemptDto {
    let flags = flags_for(attempt, quiz);
    build_view(attempt, flags)
}

/// Unredacted payload for instructors and admins.
pub fn staff_view(attempt: &QuizAttempt) -> AttemptDto {
    build_view(
        attempt,
        VisibilityFlags {
            reveal_solutions: true,
            reveal_explanations: true,
        },
    )
}

fn build_view(attempt: &QuizAttempt, flags: VisibilityFlags) -> AttemptDto {
    let terminal = attempt.status.is_terminal();

    AttemptDto {
        id: attempt.id.clone(),
        quiz_id: attempt.quiz_id.clone(),
        user_id: attempt.user_id.clone(),
        status: attempt.status,
        started_at: attempt.started_at,
        completed_at: attempt.completed_at,
        time_limit_minutes: attempt.time_limit_minutes,
        attempt_number: attempt.attempt_number,
        duration_seconds: attempt.duration_seconds,
        // Aggregates are hidden while the attempt is still in progress.
        score: terminal.then_some(attempt.score),
        max_score: terminal.then_some(attempt.max_score),
        percentage: terminal.then_some(attempt.percentage),
        passed: terminal.then_some(attempt.passed),
        feedback: attempt.feedback.clone(),
        questions: attempt
            .questions
            .iter()
            .map(|question| question_view(question, flags))
            .collect(),
    }
}

fn question_view(question: &AttemptQuestion, flags: VisibilityFlags) -> AttemptQuestionDto {
    let body = match &question.body {
        QuestionBody::MultipleChoice { options } => AttemptQuestionBodyDto::MultipleChoice {
            options: options
                .iter()
                .map(|option| AnswerOptionDto {
                    id: option.id.clone(),
                    text: option.text.clone(),
                    correct: flags.reveal_solutions.then_some(option.correct),
                })
                .collect(),
        },
        QuestionBody::TrueFalse { answer } => AttemptQuestionBodyDto::TrueFalse {
            answer: flags.reveal_solutions.then_some(*answer),
        },
        QuestionBody::ShortAnswer { answer } => AttemptQuestionBodyDto::ShortAnswer {
            answer: flags.reveal_solutions.then(|| answer.clone()),
        },
        QuestionBody::Matching { pairs } => AttemptQuestionBodyDto::Matching {
            pairs: pairs
                .iter()
                .map(|pair| MatchPairDto {
                    id: pair.id.clone(),
                    text: pair.text.clone(),
                    expected: flags.reveal_solutions.then(|| pair.expected.clone()),
                })
                .collect(),
        },
    };

    AttemptQuestionDto {
        question_id: question.question_id.clone(),
        prompt: question.prompt.clone(),
        body,
        explanation: if flags.reveal_explanations {
            question.explanation.clone()
        } else {
            None
        },
        points_possible: question.points_possible,
        response: question.response.clone(),
        points_earned: flags.reveal_solutions.then_some(question.points_earned),
        correct: flags.reveal_solutions.then_some(question.correct),
    }
}
