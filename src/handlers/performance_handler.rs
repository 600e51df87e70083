use actix_web::{get, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::response::PerformanceDto,
};

#[get("/performance")]
async fn list_performance(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let rows = state.performance_service.list_performance(auth.id()).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Synchronous recompute for one subject of the caller.
#[post("/performance/{subject_id}/refresh")]
async fn refresh_performance(
    state: web::Data<AppState>,
    subject_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let subject = state.question_bank.get_subject(&subject_id).await?;
    let performance = state
        .performance_service
        .refresh(auth.id(), &subject.id)
        .await?;
    Ok(HttpResponse::Ok().json(PerformanceDto::new(performance, subject.name)))
}
