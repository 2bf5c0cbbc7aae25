use actix_web::{get, patch, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::request::{CreateQuizRequest, PaginationParams, UpdateQuizRequest},
};

#[post("/api/quizzes")]
pub async fn create_quiz(
    state: web::Data<AppState>,
    request: web::Json<CreateQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state
        .quiz_service
        .create_quiz(&auth.0, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(quiz))
}

#[get("/api/quizzes/{id}")]
pub async fn get_quiz(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state.quiz_service.get_quiz(&id, &auth.0).await?;
    Ok(HttpResponse::Ok().json(quiz))
}

#[patch("/api/quizzes/{id}")]
pub async fn update_quiz(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<UpdateQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state
        .quiz_service
        .update_quiz(&id, &auth.0, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(quiz))
}

#[get("/api/courses/{course_id}/quizzes")]
pub async fn list_course_quizzes(
    state: web::Data<AppState>,
    course_id: web::Path<String>,
    query: web::Query<PaginationParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let pagination = query.into_inner();
    let (quizzes, total) = state
        .quiz_service
        .list_quizzes_by_course(&course_id, &auth.0, pagination.offset(), pagination.limit())
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "items": quizzes,
        "total": total,
        "offset": pagination.offset(),
        "limit": pagination.limit(),
    })))
}

#[get("/health")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[get("/health/live")]
pub async fn health_check_live() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness includes a storage round trip.
#[get("/health/ready")]
pub async fn health_check_ready(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    state.db.health_check().await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ready",
        "version": env!("CARGO_PKG_VERSION")
    })))
}
