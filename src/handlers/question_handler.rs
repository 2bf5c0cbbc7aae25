use actix_web::{delete, get, patch, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::request::{CreateQuestionRequest, UpdateQuestionRequest},
};

#[post("/api/quizzes/{quiz_id}/questions")]
pub async fn create_question(
    state: web::Data<AppState>,
    quiz_id: web::Path<String>,
    request: web::Json<CreateQuestionRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let question = state
        .question_service
        .create_question(&quiz_id, &auth.0, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(question))
}

#[get("/api/quizzes/{quiz_id}/questions")]
pub async fn list_questions(
    state: web::Data<AppState>,
    quiz_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let questions = state
        .question_service
        .list_questions(&quiz_id, &auth.0)
        .await?;
    Ok(HttpResponse::Ok().json(questions))
}

#[get("/api/questions/{id}")]
pub async fn get_question(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let question = state.question_service.get_question(&id, &auth.0).await?;
    Ok(HttpResponse::Ok().json(question))
}

#[patch("/api/questions/{id}")]
pub async fn update_question(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<UpdateQuestionRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let question = state
        .question_service
        .update_question(&id, &auth.0, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(question))
}

#[delete("/api/questions/{id}")]
pub async fn delete_question(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    state
        .question_service
        .delete_question(&id, &auth.0)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
