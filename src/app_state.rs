use std::sync::Arc;

use crate::{
    auth::AccessPolicy,
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        MongoCourseRepository, MongoQuestionRepository, MongoQuizAttemptRepository,
        MongoQuizRepository,
    },
    services::{AttemptService, QuestionService, QuizService},
};

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: Arc<QuizService>,
    pub question_service: Arc<QuestionService>,
    pub attempt_service: Arc<AttemptService>,
    pub config: Arc<Config>,
    pub db: Database,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let quiz_repository = Arc::new(MongoQuizRepository::new(&db));
        quiz_repository.ensure_indexes().await?;

        let question_repository = Arc::new(MongoQuestionRepository::new(&db));
        question_repository.ensure_indexes().await?;

        let attempt_repository = Arc::new(MongoQuizAttemptRepository::new(&db));
        attempt_repository.ensure_indexes().await?;

        let course_repository = Arc::new(MongoCourseRepository::new(&db));
        let policy = Arc::new(AccessPolicy::new(course_repository));

        let quiz_service = Arc::new(QuizService::new(quiz_repository.clone(), policy.clone()));
        let question_service = Arc::new(QuestionService::new(
            question_repository.clone(),
            quiz_repository.clone(),
            policy.clone(),
        ));
        let attempt_service = Arc::new(AttemptService::new(
            attempt_repository,
            quiz_repository,
            question_repository,
            policy,
        ));

        Ok(Self {
            quiz_service,
            question_service,
            attempt_service,
            config: Arc::new(config),
            db,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_cloneable() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }
}
