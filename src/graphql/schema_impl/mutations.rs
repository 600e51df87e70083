use async_graphql::{Context, Object, ID};

use crate::{
    graphql::helpers::{gql, state_and_caller},
    models::{
        domain::{Answer, Attempt, Exam},
        dto::{
            request::{
                AttachQuestionsRequest, CreateExamRequest, FlagQuestionRequest, GenerateExamRequest,
                GenerateRecommendationsRequest, RecordAnswerRequest, StartAttemptRequest,
                SubmitAttemptRequest,
            },
            response::{PerformanceDto, RecommendationDto, SubmissionResult},
        },
    },
};

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_exam(&self, ctx: &Context<'_>, input: CreateExamRequest) -> async_graphql::Result<Exam> {
        let (state, claims) = state_and_caller(ctx)?;
        gql(state.exam_service.create_exam(claims.user_id(), input).await)
    }

    async fn generate_exam(&self, ctx: &Context<'_>, input: GenerateExamRequest) -> async_graphql::Result<Exam> {
        let (state, claims) = state_and_caller(ctx)?;
        gql(state.exam_service.generate_exam(claims.user_id(), input).await)
    }

    async fn attach_questions(
        &self,
        ctx: &Context<'_>,
        exam_id: ID,
        input: AttachQuestionsRequest,
    ) -> async_graphql::Result<Exam> {
        let (state, claims) = state_and_caller(ctx)?;
        gql(state
            .exam_service
            .attach_questions(claims.user_id(), &exam_id, input)
            .await)
    }

    async fn start_attempt(&self, ctx: &Context<'_>, input: StartAttemptRequest) -> async_graphql::Result<Attempt> {
        let (state, claims) = state_and_caller(ctx)?;
        gql(state.attempt_service.start_attempt(claims.user_id(), input).await)
    }

    async fn record_answer(
        &self,
        ctx: &Context<'_>,
        attempt_id: ID,
        input: RecordAnswerRequest,
    ) -> async_graphql::Result<Answer> {
        let (state, claims) = state_and_caller(ctx)?;
        gql(state
            .attempt_service
            .record_answer(claims.user_id(), &attempt_id, input)
            .await)
    }

    async fn flag_question(
        &self,
        ctx: &Context<'_>,
        attempt_id: ID,
        input: FlagQuestionRequest,
    ) -> async_graphql::Result<Answer> {
        let (state, claims) = state_and_caller(ctx)?;
        gql(state
            .attempt_service
            .flag_question(claims.user_id(), &attempt_id, input)
            .await)
    }

    async fn submit_attempt(
        &self,
        ctx: &Context<'_>,
        attempt_id: ID,
        input: Option<SubmitAttemptRequest>,
    ) -> async_graphql::Result<SubmissionResult> {
        let (state, claims) = state_and_caller(ctx)?;
        gql(state
            .attempt_service
            .submit(claims.user_id(), &attempt_id, input.unwrap_or_default())
            .await)
    }

    async fn abandon_attempt(&self, ctx: &Context<'_>, attempt_id: ID) -> async_graphql::Result<Attempt> {
        let (state, claims) = state_and_caller(ctx)?;
        gql(state.attempt_service.abandon(claims.user_id(), &attempt_id).await)
    }

    async fn expire_attempt(&self, ctx: &Context<'_>, attempt_id: ID) -> async_graphql::Result<SubmissionResult> {
        let (state, claims) = state_and_caller(ctx)?;
        gql(state.attempt_service.expire(claims.user_id(), &attempt_id).await)
    }

    async fn regrade_attempt(&self, ctx: &Context<'_>, attempt_id: ID) -> async_graphql::Result<SubmissionResult> {
        let (state, claims) = state_and_caller(ctx)?;
        gql(state.attempt_service.regrade(claims.user_id(), &attempt_id).await)
    }

    async fn refresh_performance(&self, ctx: &Context<'_>, subject_id: ID) -> async_graphql::Result<PerformanceDto> {
        let (state, claims) = state_and_caller(ctx)?;
        let subject = gql(state.question_bank.get_subject(&subject_id).await)?;
        let performance = gql(state
            .performance_service
            .refresh(claims.user_id(), &subject.id)
            .await)?;
        Ok(PerformanceDto::new(performance, subject.name))
    }

    async fn generate_recommendations(
        &self,
        ctx: &Context<'_>,
        input: GenerateRecommendationsRequest,
    ) -> async_graphql::Result<Vec<RecommendationDto>> {
        let (state, claims) = state_and_caller(ctx)?;
        gql(state.recommendation_service.generate(claims.user_id(), input).await)
    }

    async fn mark_recommendation_read(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<RecommendationDto> {
        let (state, claims) = state_and_caller(ctx)?;
        gql(state.recommendation_service.mark_read(claims.user_id(), &id).await)
    }
}
