use std::sync::Arc;

use validator::Validate;

use crate::{
    auth::require_owner,
    errors::{AppError, AppResult},
    models::{
        domain::Recommendation,
        dto::{request::GenerateRecommendationsRequest, response::{PerformanceDto, RecommendationDto}},
    },
    repositories::RecommendationRepository,
    services::{performance_service::PerformanceService, text_generation::TextGenerator},
};

/// One line per subject, weakest first.
pub fn build_performance_summary(rows: &[PerformanceDto]) -> String {
    if rows.is_empty() {
        return "No completed exams yet; no per-subject data is available.".to_string();
    }

    let mut sorted: Vec<&PerformanceDto> = rows.iter().collect();
    sorted.sort_by(|a, b| {
        a.strength_level
            .review_rank()
            .cmp(&b.strength_level.review_rank())
            .then(a.average_score.total_cmp(&b.average_score))
            .then(a.subject_name.cmp(&b.subject_name))
    });

    sorted
        .iter()
        .map(|p| {
            format!(
                "- {}: {} ({:.0}% correct over {} graded questions)",
                p.subject_name,
                p.strength_level.as_str(),
                p.average_score,
                p.total_questions
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct RecommendationService {
    recommendations: Arc<dyn RecommendationRepository>,
    performance: Arc<PerformanceService>,
    text_generator: Arc<dyn TextGenerator>,
    recommendation_count: usize,
}

impl RecommendationService {
    pub fn new(
        recommendations: Arc<dyn RecommendationRepository>,
        performance: Arc<PerformanceService>,
        text_generator: Arc<dyn TextGenerator>,
        recommendation_count: usize,
    ) -> Self {
        Self {
            recommendations,
            performance,
            text_generator,
            recommendation_count: recommendation_count.max(1),
        }
    }

    /// Best effort: an unavailable or unparsable model yields an empty list.
    pub async fn generate(
        &self,
        user_id: &str,
        request: GenerateRecommendationsRequest,
    ) -> AppResult<Vec<RecommendationDto>> {
        request.validate()?;
        let rows = self.performance.list_performance(user_id).await?;
        let summary = build_performance_summary(&rows);

        let generated = match self
            .text_generator
            .synthesize_recommendations(&summary, &request.target_exam, self.recommendation_count)
            .await
        {
            Ok(generated) => generated,
            Err(e) => {
                log::warn!("Recommendation generation for user {} failed: {}", user_id, e);
                return Ok(Vec::new());
            }
        };

        let recommendations: Vec<Recommendation> = generated
            .into_iter()
            .filter(|g| !g.title.trim().is_empty())
            .take(self.recommendation_count)
            .map(|g| {
                Recommendation::new(
                    user_id,
                    g.recommendation_type,
                    &g.title,
                    &g.description,
                    g.priority,
                )
            })
            .collect();

        let saved = self.recommendations.create_many(recommendations).await?;
        log::info!("Generated {} recommendations for user {}", saved.len(), user_id);
        Ok(saved.into_iter().map(RecommendationDto::from).collect())
    }

    pub async fn list(&self, user_id: &str, unread_only: bool) -> AppResult<Vec<RecommendationDto>> {
        Ok(self
            .recommendations
            .list_by_user(user_id, unread_only)
            .await?
            .into_iter()
            .map(RecommendationDto::from)
            .collect())
    }

    pub async fn mark_read(&self, caller_id: &str, recommendation_id: &str) -> AppResult<RecommendationDto> {
        let mut recommendation = self
            .recommendations
            .find_by_id(recommendation_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Recommendation with id '{}' not found", recommendation_id))
            })?;
        require_owner(caller_id, &recommendation.user_id)?;

        if !self.recommendations.mark_read(&recommendation.id).await? {
            return Err(AppError::NotFound(format!(
                "Recommendation with id '{}' not found",
                recommendation_id
            )));
        }
        recommendation.is_read = true;
        Ok(recommendation.into())
    }
}
