use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{db::{collections, Database}, errors::AppResult, models::domain::Recommendation};

#[async_trait]
pub trait RecommendationRepository: Send + Sync {
    async fn create_many(&self, recommendations: Vec<Recommendation>) -> AppResult<Vec<Recommendation>>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Recommendation>>;
    /// Ordered by priority, then newest first.
    async fn list_by_user(&self, user_id: &str, unread_only: bool) -> AppResult<Vec<Recommendation>>;
    async fn mark_read(&self, id: &str) -> AppResult<bool>;
}

pub struct MongoRecommendationRepository {
    collection: Collection<Recommendation>,
}

impl MongoRecommendationRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(collections::RECOMMENDATIONS);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for recommendations collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let user_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "is_read": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_read".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(user_index).await?;

        log::info!("Successfully created indexes for recommendations collection");
        Ok(())
    }
}

#[async_trait]
impl RecommendationRepository for MongoRecommendationRepository {
    async fn create_many(&self, recommendations: Vec<Recommendation>) -> AppResult<Vec<Recommendation>> {
        if recommendations.is_empty() {
            return Ok(recommendations);
        }

        self.collection.insert_many(&recommendations).await?;
        Ok(recommendations)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Recommendation>> {
        let recommendation = self.collection.find_one(doc! { "id": id }).await?;
        Ok(recommendation)
    }

    async fn list_by_user(&self, user_id: &str, unread_only: bool) -> AppResult<Vec<Recommendation>> {
        let mut filter = doc! { "user_id": user_id };
        if unread_only {
            filter.insert("is_read", false);
        }

        let recommendations = self
            .collection
            .find(filter)
            .sort(doc! { "priority": 1, "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(recommendations)
    }

    async fn mark_read(&self, id: &str) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(doc! { "id": id }, doc! { "$set": { "is_read": true } })
            .await?;
        Ok(result.matched_count == 1)
    }
}
