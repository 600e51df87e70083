pub mod answer_repository;
pub mod attempt_repository;
pub mod exam_repository;
pub mod in_memory;
pub mod performance_repository;
pub mod question_repository;
pub mod recommendation_repository;
pub mod subject_repository;

use std::sync::Arc;

pub use answer_repository::{AnswerRepository, MongoAnswerRepository};
pub use attempt_repository::{AttemptRepository, MongoAttemptRepository};
pub use exam_repository::{ExamRepository, MongoExamRepository};
pub use performance_repository::{MongoPerformanceRepository, PerformanceRepository};
pub use question_repository::{MongoQuestionRepository, QuestionRepository};
pub use recommendation_repository::{MongoRecommendationRepository, RecommendationRepository};
pub use subject_repository::{MongoSubjectRepository, SubjectRepository};

use crate::{db::Database, errors::AppResult};

/// The persistence boundary: one handle per entity, all behind traits so the
/// storage backend can be swapped without touching the services.
#[derive(Clone)]
pub struct Repositories {
    pub subjects: Arc<dyn SubjectRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub exams: Arc<dyn ExamRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
    pub answers: Arc<dyn AnswerRepository>,
    pub performance: Arc<dyn PerformanceRepository>,
    pub recommendations: Arc<dyn RecommendationRepository>,
}

impl Repositories {
    pub async fn mongo(db: &Database) -> AppResult<Self> {
        let subjects = MongoSubjectRepository::new(db);
        subjects.ensure_indexes().await?;
        let questions = MongoQuestionRepository::new(db);
        questions.ensure_indexes().await?;
        let exams = MongoExamRepository::new(db);
        exams.ensure_indexes().await?;
        let attempts = MongoAttemptRepository::new(db);
        attempts.ensure_indexes().await?;
        let answers = MongoAnswerRepository::new(db);
        answers.ensure_indexes().await?;
        let performance = MongoPerformanceRepository::new(db);
        performance.ensure_indexes().await?;
        let recommendations = MongoRecommendationRepository::new(db);
        recommendations.ensure_indexes().await?;

        Ok(Self {
            subjects: Arc::new(subjects),
            questions: Arc::new(questions),
            exams: Arc::new(exams),
            attempts: Arc::new(attempts),
            answers: Arc::new(answers),
            performance: Arc::new(performance),
            recommendations: Arc::new(recommendations),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            subjects: Arc::new(in_memory::InMemorySubjectRepository::new()),
            questions: Arc::new(in_memory::InMemoryQuestionRepository::new()),
            exams: Arc::new(in_memory::InMemoryExamRepository::new()),
            attempts: Arc::new(in_memory::InMemoryAttemptRepository::new()),
            answers: Arc::new(in_memory::InMemoryAnswerRepository::new()),
            performance: Arc::new(in_memory::InMemoryPerformanceRepository::new()),
            recommendations: Arc::new(in_memory::InMemoryRecommendationRepository::new()),
        }
    }
}
