use actix_web::{get, patch, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::request::{AttemptFeedbackRequest, AttemptListQuery, SubmitAttemptRequest},
};

#[post("/api/quizzes/{quiz_id}/attempts")]
pub async fn start_attempt(
    state: web::Data<AppState>,
    quiz_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state
        .attempt_service
        .start_attempt(&quiz_id, &auth.0)
        .await?;
    Ok(HttpResponse::Created().json(attempt))
}

#[get("/api/quizzes/{quiz_id}/attempts")]
pub async fn list_attempts(
    state: web::Data<AppState>,
    quiz_id: web::Path<String>,
    query: web::Query<AttemptListQuery>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let page = state
        .attempt_service
        .list_attempts(&quiz_id, &auth.0, query.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/api/quizzes/{quiz_id}/attempts/{attempt_id}")]
pub async fn get_attempt(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (_, attempt_id) = path.into_inner();
    let attempt = state.attempt_service.get_attempt(&attempt_id, &auth.0).await?;
    Ok(HttpResponse::Ok().json(attempt))
}

#[patch("/api/quizzes/{quiz_id}/attempts/{attempt_id}")]
pub async fn submit_attempt(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<SubmitAttemptRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (_, attempt_id) = path.into_inner();
    let attempt = state
        .attempt_service
        .submit_attempt(&attempt_id, &auth.0, request.into_inner().answers)
        .await?;
    Ok(HttpResponse::Ok().json(attempt))
}

#[patch("/api/quizzes/{quiz_id}/attempts/{attempt_id}/feedback")]
pub async fn add_feedback(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<AttemptFeedbackRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    use validator::Validate;
    let request = request.into_inner();
    request.validate()?;

    let (_, attempt_id) = path.into_inner();
    let attempt = state
        .attempt_service
        .add_feedback(&attempt_id, &auth.0, request.feedback)
        .await?;
    Ok(HttpResponse::Ok().json(attempt))
}
