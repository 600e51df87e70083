use actix_web::{get, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::request::{AttachQuestionsRequest, CreateExamRequest, GenerateExamRequest},
};

#[post("/exams")]
async fn create_exam(
    state: web::Data<AppState>,
    request: web::Json<CreateExamRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let exam = state
        .exam_service
        .create_exam(auth.id(), request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(exam))
}

#[post("/exams/generate")]
async fn generate_exam(
    state: web::Data<AppState>,
    request: web::Json<GenerateExamRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let exam = state
        .exam_service
        .generate_exam(auth.id(), request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(exam))
}

#[get("/exams")]
async fn list_exams(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let exams = state.exam_service.list_exams(auth.id()).await?;
    Ok(HttpResponse::Ok().json(exams))
}

#[get("/exams/{id}")]
async fn get_exam(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let exam = state.exam_service.get_exam(auth.id(), &id).await?;
    Ok(HttpResponse::Ok().json(exam))
}

#[get("/exams/{id}/take")]
async fn exam_for_taking(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let exam = state.exam_service.exam_for_taking(auth.id(), &id).await?;
    Ok(HttpResponse::Ok().json(exam))
}

#[post("/exams/{id}/questions")]
async fn attach_questions(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<AttachQuestionsRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let exam = state
        .exam_service
        .attach_questions(auth.id(), &id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(exam))
}
