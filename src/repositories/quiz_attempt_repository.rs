use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::FindOptions, options::IndexOptions, Collection, IndexModel};

#[cfg(test)]
use mockall::automock;

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::{quiz_attempt::AttemptStatus, QuizAttempt},
};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait QuizAttemptRepository: Send + Sync {
    async fn create(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>>;
    /// Every attempt by this user at this quiz, terminal or not.
    async fn count_attempts(&self, user_id: &str, quiz_id: &str) -> AppResult<i64>;
    /// Terminal attempts only; this is what the retake cap counts.
    async fn count_graded_attempts(&self, user_id: &str, quiz_id: &str) -> AppResult<i64>;
    async fn list_for_quiz(
        &self,
        quiz_id: &str,
        user_id: Option<String>,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<QuizAttempt>, i64)>;
    /// Compare-and-set on attempt status: replaces the stored attempt only
    /// while it is still in progress. The loser of a double submission gets
    /// `AttemptAlreadyFinalized`.
    async fn finalize(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt>;
    /// Plain replace for non-state-machine fields (instructor feedback).
    async fn update(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt>;
}

pub struct MongoQuizAttemptRepository {
    collection: Collection<QuizAttempt>,
}

impl MongoQuizAttemptRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("quiz_attempts");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quiz_attempts collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        // Two concurrent starts compute the same attempt_number; the unique
        // index rejects the second insert.
        let attempt_number_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "quiz_id": 1, "attempt_number": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_quiz_attempt_number_unique".to_string())
                    .build(),
            )
            .build();

        let quiz_index = IndexModel::builder()
            .keys(doc! { "quiz_id": 1 })
            .options(IndexOptions::builder().name("quiz_id".to_string()).build())
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(attempt_number_index).await?;
        self.collection.create_index(quiz_index).await?;

        log::info!("Successfully created indexes for quiz_attempts collection");
        Ok(())
    }
}

#[async_trait]
impl QuizAttemptRepository for MongoQuizAttemptRepository {
    async fn create(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt> {
        self.collection.insert_one(&attempt).await.map_err(|err| {
            if err.to_string().contains("E11000") {
                AppError::AlreadyExists(format!(
                    "Attempt #{} already exists for this user and quiz",
                    attempt.attempt_number
                ))
            } else {
                AppError::from(err)
            }
        })?;
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>> {
        let attempt = self.collection.find_one(doc! { "id": id }).await?;
        Ok(attempt)
    }

    async fn count_attempts(&self, user_id: &str, quiz_id: &str) -> AppResult<i64> {
        let count = self
            .collection
            .count_documents(doc! { "user_id": user_id, "quiz_id": quiz_id })
            .await?;
        Ok(count as i64)
    }

    async fn count_graded_attempts(&self, user_id: &str, quiz_id: &str) -> AppResult<i64> {
        let count = self
            .collection
            .count_documents(doc! {
                "user_id": user_id,
                "quiz_id": quiz_id,
                "status": { "$ne": AttemptStatus::InProgress.as_str() },
            })
            .await?;
        Ok(count as i64)
    }

    async fn list_for_quiz(
        &self,
        quiz_id: &str,
        user_id: Option<String>,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<QuizAttempt>, i64)> {
        let mut filter = doc! { "quiz_id": quiz_id };
        if let Some(uid) = user_id {
            filter.insert("user_id", uid);
        }

        let total = self.collection.count_documents(filter.clone()).await? as i64;

        let find_options = FindOptions::builder()
            .skip(Some(offset as u64))
            .limit(Some(limit))
            .sort(doc! { "started_at": -1 })
            .build();

        let attempts = self
            .collection
            .find(filter)
            .with_options(find_options)
            .await?
            .try_collect()
            .await?;

        Ok((attempts, total))
    }

    async fn finalize(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt> {
        let result = self
            .collection
            .replace_one(
                doc! {
                    "id": &attempt.id,
                    "status": AttemptStatus::InProgress.as_str(),
                },
                &attempt,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::AttemptAlreadyFinalized(format!(
                "Attempt '{}' has already been finalized",
                attempt.id
            )));
        }

        Ok(attempt)
    }

    async fn update(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt> {
        self.collection
            .replace_one(doc! { "id": &attempt.id }, &attempt)
            .await?;
        Ok(attempt)
    }
}
