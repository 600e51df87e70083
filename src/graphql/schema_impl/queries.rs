use async_graphql::{Context, Object, ID};

use crate::{
    graphql::helpers::{gql, state_and_caller},
    models::{
        domain::{Attempt, Exam},
        dto::response::{AttemptResults, ExamForTaking, PerformanceDto, RecommendationDto},
    },
};

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn exams(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Exam>> {
        let (state, claims) = state_and_caller(ctx)?;
        gql(state.exam_service.list_exams(claims.user_id()).await)
    }

    /// Full exam including correct answers; owner only.
    async fn exam(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<Exam> {
        let (state, claims) = state_and_caller(ctx)?;
        gql(state.exam_service.get_exam(claims.user_id(), &id).await)
    }

    async fn exam_for_taking(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<ExamForTaking> {
        let (state, claims) = state_and_caller(ctx)?;
        gql(state.exam_service.exam_for_taking(claims.user_id(), &id).await)
    }

    async fn attempts(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Attempt>> {
        let (state, claims) = state_and_caller(ctx)?;
        gql(state.attempt_service.list_attempts(claims.user_id()).await)
    }

    async fn attempt(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<Attempt> {
        let (state, claims) = state_and_caller(ctx)?;
        gql(state.attempt_service.get_attempt(claims.user_id(), &id).await)
    }

    async fn attempt_results(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<AttemptResults> {
        let (state, claims) = state_and_caller(ctx)?;
        gql(state.attempt_service.get_results(claims.user_id(), &id).await)
    }

    async fn performance(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<PerformanceDto>> {
        let (state, claims) = state_and_caller(ctx)?;
        gql(state.performance_service.list_performance(claims.user_id()).await)
    }

    async fn recommendations(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] unread_only: bool,
    ) -> async_graphql::Result<Vec<RecommendationDto>> {
        let (state, claims) = state_and_caller(ctx)?;
        gql(state.recommendation_service.list(claims.user_id(), unread_only).await)
    }
}
