use std::sync::Arc;

use chrono::Utc;
use rand::seq::SliceRandom;

use crate::{
    auth::{AccessPolicy, Claims},
    errors::{AppError, AppResult},
    models::domain::quiz_attempt::{AttemptQuestion, AttemptStatus},
    models::domain::{Question, QuestionBody, Quiz, QuizAttempt},
    models::dto::request::{AnswerInput, AttemptListQuery},
    models::dto::response::{AttemptDto, AttemptSummaryDto, PaginatedResponse},
    repositories::{QuestionRepository, QuizAttemptRepository, QuizRepository},
    services::{grading, visibility},
};

pub struct AttemptService {
    attempts: Arc<dyn QuizAttemptRepository>,
    quizzes: Arc<dyn QuizRepository>,
    questions: Arc<dyn QuestionRepository>,
    policy: Arc<AccessPolicy>,
}

impl AttemptService {
    pub fn new(
        attempts: Arc<dyn QuizAttemptRepository>,
        quizzes: Arc<dyn QuizRepository>,
        questions: Arc<dyn QuestionRepository>,
        policy: Arc<AccessPolicy>,
    ) -> Self {
        Self {
            attempts,
            quizzes,
            questions,
            policy,
        }
    }

    /// Start a new attempt: enforce publish/retake policy, draw and shuffle
    /// the served question set, and freeze it into snapshots.
    pub async fn start_attempt(&self, quiz_id: &str, claims: &Claims) -> AppResult<AttemptDto> {
        let quiz = self.require_quiz(quiz_id).await?;

        if !quiz.is_published() {
            return Err(AppError::QuizNotPublished(format!(
                "Quiz '{}' is not open for attempts",
                quiz_id
            )));
        }

        if !quiz.allows_unlimited_retakes() {
            let graded = self
                .attempts
                .count_graded_attempts(&claims.sub, quiz_id)
                .await?;
            if graded >= quiz.retakes as i64 {
                return Err(AppError::RetakeLimitExceeded(format!(
                    "Quiz '{}' allows {} graded attempts",
                    quiz_id, quiz.retakes
                )));
            }
        }

        let bank = self.questions.find_by_quiz(quiz_id).await?;
        if bank.is_empty() {
            return Err(AppError::ValidationError(
                "quiz: has no questions to serve".to_string(),
            ));
        }

        let snapshots = build_served_set(&quiz, bank);

        // Two racing starts compute the same attempt number; the storage
        // layer's unique index rejects the second insert.
        let prior = self.attempts.count_attempts(&claims.sub, quiz_id).await?;
        let attempt = QuizAttempt::start(
            &claims.sub,
            quiz_id,
            quiz.effective_time_limit(),
            (prior + 1) as i32,
            snapshots,
        );

        let attempt = self.attempts.create(attempt).await?;
        Ok(self.view_for(claims, &attempt, &quiz))
    }

    /// Submit responses and finalize. The status transition goes through the
    /// repository's compare-and-set, so a race between a learner submission
    /// and a timeout finalization yields exactly one terminal result.
    pub async fn submit_attempt(
        &self,
        attempt_id: &str,
        claims: &Claims,
        answers: Vec<AnswerInput>,
    ) -> AppResult<AttemptDto> {
        let attempt = self.require_attempt(attempt_id).await?;
        let quiz = self.require_quiz(&attempt.quiz_id).await?;
        self.policy
            .ensure_can_view_attempt(claims, &attempt, &quiz)
            .await?;

        if attempt.status.is_terminal() {
            return Err(AppError::AttemptAlreadyFinalized(format!(
                "Attempt '{}' has already been finalized",
                attempt_id
            )));
        }

        let now = Utc::now();
        let timed_out = attempt.is_expired_at(now);
        let attempt = self.finalize(attempt, &quiz, answers, timed_out).await?;

        Ok(self.view_for(claims, &attempt, &quiz))
    }

    /// Fetch one attempt. An expired in-progress attempt is finalized on
    /// read, as a deferred timeout submission with no new answers.
    pub async fn get_attempt(&self, attempt_id: &str, claims: &Claims) -> AppResult<AttemptDto> {
        let mut attempt = self.require_attempt(attempt_id).await?;
        let quiz = self.require_quiz(&attempt.quiz_id).await?;
        self.policy
            .ensure_can_view_attempt(claims, &attempt, &quiz)
            .await?;

        if attempt.is_expired_at(Utc::now()) {
            attempt = match self.finalize(attempt, &quiz, Vec::new(), true).await {
                Ok(finalized) => finalized,
                // Lost the race against a concurrent submission; the stored
                // terminal attempt is the authoritative one.
                Err(AppError::AttemptAlreadyFinalized(_)) => {
                    self.require_attempt(attempt_id).await?
                }
                Err(err) => return Err(err),
            };
        }

        Ok(self.view_for(claims, &attempt, &quiz))
    }

    /// List attempts for a quiz. Learners only ever see their own; staff may
    /// filter by user. Question snapshots are never included in list rows.
    pub async fn list_attempts(
        &self,
        quiz_id: &str,
        claims: &Claims,
        query: AttemptListQuery,
    ) -> AppResult<PaginatedResponse<AttemptSummaryDto>> {
        let quiz = self.require_quiz(quiz_id).await?;

        let user_filter = if claims.role.is_staff() {
            self.policy.ensure_can_grade(claims, &quiz).await?;
            query.user_id.clone()
        } else {
            Some(claims.sub.clone())
        };

        let (attempts, total) = self
            .attempts
            .list_for_quiz(quiz_id, user_filter, query.offset(), query.limit())
            .await?;

        Ok(PaginatedResponse {
            items: attempts.iter().map(AttemptSummaryDto::from_attempt).collect(),
            total,
            offset: query.offset(),
            limit: query.limit(),
        })
    }

    /// Instructor feedback on a graded attempt; never touches grading state.
    pub async fn add_feedback(
        &self,
        attempt_id: &str,
        claims: &Claims,
        feedback: String,
    ) -> AppResult<AttemptDto> {
        let mut attempt = self.require_attempt(attempt_id).await?;
        let quiz = self.require_quiz(&attempt.quiz_id).await?;
        self.policy.ensure_can_grade(claims, &quiz).await?;

        if !attempt.status.is_terminal() {
            return Err(AppError::ValidationError(
                "feedback: attempt has not been graded yet".to_string(),
            ));
        }

        attempt.feedback = Some(feedback);
        attempt.modified_at = Some(Utc::now());
        let attempt = self.attempts.update(attempt).await?;

        Ok(visibility::staff_view(&attempt))
    }

    async fn finalize(
        &self,
        mut attempt: QuizAttempt,
        quiz: &Quiz,
        answers: Vec<AnswerInput>,
        timed_out: bool,
    ) -> AppResult<QuizAttempt> {
        merge_answers(&mut attempt.questions, answers);

        let summary = grading::grade_attempt(&mut attempt.questions)?;
        let now = Utc::now();

        attempt.score = summary.score;
        attempt.max_score = summary.max_score;
        attempt.percentage = summary.percentage;
        attempt.passed = summary.percentage >= quiz.passing_score;
        attempt.completed_at = Some(now);
        attempt.duration_seconds = Some((now - attempt.started_at).num_seconds());
        attempt.status = if timed_out {
            AttemptStatus::TimedOut
        } else {
            AttemptStatus::Completed
        };
        attempt.modified_at = Some(now);

        self.attempts.finalize(attempt).await
    }

    fn view_for(&self, claims: &Claims, attempt: &QuizAttempt, quiz: &Quiz) -> AttemptDto {
        if claims.role.is_staff() {
            visibility::staff_view(attempt)
        } else {
            visibility::learner_view(attempt, quiz)
        }
    }

    async fn require_quiz(&self, quiz_id: &str) -> AppResult<Quiz> {
        self.quizzes
            .find_by_id(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", quiz_id)))
    }

    async fn require_attempt(&self, attempt_id: &str) -> AppResult<QuizAttempt> {
        self.attempts
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Attempt with id '{}' not found", attempt_id))
            })
    }
}

/// Draw the served subset and apply the quiz's randomization flags.
fn build_served_set(quiz: &Quiz, bank: Vec<Question>) -> Vec<AttemptQuestion> {
    let mut rng = rand::thread_rng();

    // A stored pool size of zero is treated as unset, never as "serve nothing".
    let pool = quiz.questions_per_attempt.filter(|size| *size > 0);
    let mut served: Vec<Question> = match pool {
        Some(pool_size) => {
            let pool_size = (pool_size as usize).min(bank.len());
            // Sample without replacement, then restore storage order; only
            // the randomize flag below is allowed to reorder.
            let mut indices: Vec<usize> = (0..bank.len()).collect();
            indices.shuffle(&mut rng);
            indices.truncate(pool_size);
            indices.sort_unstable();

            let mut bank = bank;
            let mut picked = Vec::with_capacity(pool_size);
            for index in indices.into_iter().rev() {
                picked.push(bank.swap_remove(index));
            }
            picked.reverse();
            picked
        }
        None => bank,
    };

    if quiz.randomize_questions {
        served.shuffle(&mut rng);
    }

    let mut snapshots: Vec<AttemptQuestion> =
        served.iter().map(AttemptQuestion::snapshot).collect();

    if quiz.shuffle_answers {
        for snapshot in &mut snapshots {
            match &mut snapshot.body {
                QuestionBody::MultipleChoice { options } => options.shuffle(&mut rng),
                QuestionBody::Matching { pairs } => pairs.shuffle(&mut rng),
                QuestionBody::TrueFalse { .. } | QuestionBody::ShortAnswer { .. } => {}
            }
        }
    }

    snapshots
}

/// Merge submitted answers into the snapshots. Unknown question ids are
/// ignored; snapshots without a matching answer stay ungraded.
fn merge_answers(snapshots: &mut [AttemptQuestion], answers: Vec<AnswerInput>) {
    for answer in answers {
        if let Some(snapshot) = snapshots
            .iter_mut()
            .find(|snapshot| snapshot.question_id == answer.question_id)
        {
            if let Some(response) = answer.into_response(snapshot.body.kind()) {
                snapshot.response = Some(response);
            }
        }
    }
}
