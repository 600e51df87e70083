use std::sync::Arc;

use crate::{
    auth::JwtService,
    config::{Config, StorageBackend},
    db::Database,
    errors::AppResult,
    repositories::Repositories,
    services::{
        AttemptService, ExamService, ExpirySweeper, GradingEngine, OpenAiTextGenerator,
        PerformanceRefresher, PerformanceService, QuestionBankService, RecommendationService,
        TextGenerator,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub question_bank: Arc<QuestionBankService>,
    pub exam_service: Arc<ExamService>,
    pub attempt_service: Arc<AttemptService>,
    pub performance_service: Arc<PerformanceService>,
    pub recommendation_service: Arc<RecommendationService>,
    pub expiry_sweeper: Arc<ExpirySweeper>,
    pub jwt_service: Arc<JwtService>,
    pub database: Option<Database>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let text_generator: Arc<dyn TextGenerator> = Arc::new(OpenAiTextGenerator::new(&config));

        match config.storage_backend {
            StorageBackend::Mongo => {
                let db = Database::connect(&config).await?;
                let repositories = Repositories::mongo(&db).await?;
                Ok(Self::assemble(config, repositories, text_generator, Some(db)))
            }
            StorageBackend::Memory => {
                log::warn!("Using in-memory storage; all data is lost on restart");
                Ok(Self::assemble(
                    config,
                    Repositories::in_memory(),
                    text_generator,
                    None,
                ))
            }
        }
    }

    /// Wires services over the given repositories and text generator.
    pub fn with_repositories(
        config: Config,
        repositories: Repositories,
        text_generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self::assemble(config, repositories, text_generator, None)
    }

    fn assemble(
        config: Config,
        repos: Repositories,
        text_generator: Arc<dyn TextGenerator>,
        database: Option<Database>,
    ) -> Self {
        let question_bank = Arc::new(QuestionBankService::new(
            repos.questions.clone(),
            repos.subjects.clone(),
        ));
        let exam_service = Arc::new(ExamService::new(
            repos.exams.clone(),
            question_bank.clone(),
            text_generator.clone(),
        ));
        let performance_service = Arc::new(PerformanceService::new(
            repos.attempts.clone(),
            repos.answers.clone(),
            repos.questions.clone(),
            repos.performance.clone(),
            question_bank.clone(),
        ));
        let refresher = PerformanceRefresher::new(
            performance_service.clone(),
            config.aggregation_max_retries,
        );
        let grading = Arc::new(GradingEngine::new(
            text_generator.clone(),
            config.essay_pass_threshold,
        ));
        let attempt_service = Arc::new(AttemptService::new(
            repos.attempts.clone(),
            repos.answers.clone(),
            exam_service.clone(),
            question_bank.clone(),
            grading,
            refresher,
            config.essay_grading_concurrency,
        ));
        let recommendation_service = Arc::new(RecommendationService::new(
            repos.recommendations.clone(),
            performance_service.clone(),
            text_generator,
            config.recommendation_count,
        ));
        let expiry_sweeper = Arc::new(ExpirySweeper::new(
            attempt_service.clone(),
            config.expiry_sweep_interval_seconds,
        ));
        let jwt_service = Arc::new(JwtService::new(
            &config.jwt_secret,
            config.jwt_expiration_hours,
        ));

        Self {
            question_bank,
            exam_service,
            attempt_service,
            performance_service,
            recommendation_service,
            expiry_sweeper,
            jwt_service,
            database,
            config: Arc::new(config),
        }
    }

    /// Storage reachability for the readiness probe.
    pub async fn readiness(&self) -> AppResult<()> {
        match &self.database {
            Some(db) => db.health_check().await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::text_generation::MockTextGenerator;

    fn state(config: Config) -> AppState {
        AppState::with_repositories(
            config,
            Repositories::in_memory(),
            Arc::new(MockTextGenerator::new()),
        )
    }

    #[test]
    fn test_app_state_is_cloneable() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[tokio::test]
    async fn in_memory_state_is_ready() {
        let app_state = state(Config::test_config());
        assert!(app_state.database.is_none());
        assert!(app_state.readiness().await.is_ok());
    }

    #[tokio::test]
    async fn sweeper_with_zero_interval_never_starts() {
        let app_state = state(Config::test_config());
        assert!(!app_state.expiry_sweeper.is_enabled());

        app_state.expiry_sweeper.start_worker().await;
        assert!(!app_state.expiry_sweeper.is_running().await);
    }

    #[tokio::test]
    async fn sweeper_starts_and_stops() {
        let mut config = Config::test_config();
        config.expiry_sweep_interval_seconds = 3600;
        let app_state = state(config);

        app_state.expiry_sweeper.start_worker().await;
        assert!(app_state.expiry_sweeper.is_running().await);

        app_state.expiry_sweeper.stop_worker().await;
        assert!(!app_state.expiry_sweeper.is_running().await);
    }
}
