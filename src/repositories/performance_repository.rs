use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{IndexOptions, ReplaceOptions},
    Collection, IndexModel,
};

use crate::{db::{collections, Database}, errors::AppResult, models::domain::SubjectPerformance};

#[async_trait]
pub trait PerformanceRepository: Send + Sync {
    async fn find(&self, user_id: &str, subject_id: &str) -> AppResult<Option<SubjectPerformance>>;
    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<SubjectPerformance>>;
    /// Last writer wins; every writer computes the row from the same answers.
    async fn upsert(&self, performance: SubjectPerformance) -> AppResult<SubjectPerformance>;
}

pub struct MongoPerformanceRepository {
    collection: Collection<SubjectPerformance>,
}

impl MongoPerformanceRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(collections::SUBJECT_PERFORMANCE);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for subject_performance collection");

        let user_subject_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "subject_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_subject_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(user_subject_index).await?;

        log::info!("Successfully created indexes for subject_performance collection");
        Ok(())
    }
}

#[async_trait]
impl PerformanceRepository for MongoPerformanceRepository {
    async fn find(&self, user_id: &str, subject_id: &str) -> AppResult<Option<SubjectPerformance>> {
        let performance = self
            .collection
            .find_one(doc! { "user_id": user_id, "subject_id": subject_id })
            .await?;
        Ok(performance)
    }

    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<SubjectPerformance>> {
        let rows = self
            .collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "average_score": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(rows)
    }

    async fn upsert(&self, performance: SubjectPerformance) -> AppResult<SubjectPerformance> {
        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(
                doc! { "user_id": &performance.user_id, "subject_id": &performance.subject_id },
                &performance,
            )
            .with_options(options)
            .await?;
        Ok(performance)
    }
}
