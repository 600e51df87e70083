use actix_web::{get, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::request::{GenerateRecommendationsRequest, RecommendationQuery},
};

#[get("/recommendations")]
async fn list_recommendations(
    state: web::Data<AppState>,
    query: web::Query<RecommendationQuery>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let unread_only = query.unread_only.unwrap_or(false);
    let recommendations = state
        .recommendation_service
        .list(auth.id(), unread_only)
        .await?;
    Ok(HttpResponse::Ok().json(recommendations))
}

#[post("/recommendations/generate")]
async fn generate_recommendations(
    state: web::Data<AppState>,
    request: web::Json<GenerateRecommendationsRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let created = state
        .recommendation_service
        .generate(auth.id(), request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(created))
}

#[post("/recommendations/{id}/read")]
async fn mark_recommendation_read(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let recommendation = state
        .recommendation_service
        .mark_read(auth.id(), &id)
        .await?;
    Ok(HttpResponse::Ok().json(recommendation))
}
