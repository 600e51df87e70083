use actix_web::{get, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::request::{
        FlagQuestionRequest, RecordAnswerRequest, StartAttemptRequest, SubmitAttemptRequest,
    },
};

#[post("/attempts")]
async fn start_attempt(
    state: web::Data<AppState>,
    request: web::Json<StartAttemptRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state
        .attempt_service
        .start_attempt(auth.id(), request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(attempt))
}

#[get("/attempts")]
async fn list_attempts(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempts = state.attempt_service.list_attempts(auth.id()).await?;
    Ok(HttpResponse::Ok().json(attempts))
}

#[post("/attempts/{id}/answer")]
async fn record_answer(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<RecordAnswerRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let answer = state
        .attempt_service
        .record_answer(auth.id(), &id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(answer))
}

#[post("/attempts/{id}/flag")]
async fn flag_question(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<FlagQuestionRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let answer = state
        .attempt_service
        .flag_question(auth.id(), &id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(answer))
}

/// An empty body submits with the answers already recorded.
#[post("/attempts/{id}/submit")]
async fn submit_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: Option<web::Json<SubmitAttemptRequest>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let request = request.map(web::Json::into_inner).unwrap_or_default();
    let result = state.attempt_service.submit(auth.id(), &id, request).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[post("/attempts/{id}/abandon")]
async fn abandon_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state.attempt_service.abandon(auth.id(), &id).await?;
    Ok(HttpResponse::Ok().json(attempt))
}

#[post("/attempts/{id}/expire")]
async fn expire_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let result = state.attempt_service.expire(auth.id(), &id).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[post("/attempts/{id}/regrade")]
async fn regrade_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let result = state.attempt_service.regrade(auth.id(), &id).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[get("/attempts/{id}/results")]
async fn attempt_results(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let results = state.attempt_service.get_results(auth.id(), &id).await?;
    Ok(HttpResponse::Ok().json(results))
}
