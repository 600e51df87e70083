use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::{collections, Database},
    errors::AppResult,
    models::domain::{Attempt, AttemptCompletion, AttemptStatus},
};

/// Attempt storage. The status transitions are compare-and-set: each returns
/// `true` only if the stored status matched the expected one and was changed.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    async fn create(&self, attempt: Attempt) -> AppResult<Attempt>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>>;
    /// Newest first.
    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<Attempt>>;
    async fn list_completed_by_user(&self, user_id: &str) -> AppResult<Vec<Attempt>>;
    /// Every in-progress attempt across users, for the expiry sweeper.
    async fn list_in_progress(&self) -> AppResult<Vec<Attempt>>;
    async fn complete_if_in_progress(
        &self,
        id: &str,
        completion: &AttemptCompletion,
    ) -> AppResult<bool>;
    async fn abandon_if_in_progress(&self, id: &str, abandoned_at: DateTime<Utc>) -> AppResult<bool>;
    async fn update_score_if_completed(
        &self,
        id: &str,
        score: f64,
        correct_count: i32,
        incorrect_count: i32,
    ) -> AppResult<bool>;
}

pub struct MongoAttemptRepository {
    collection: Collection<Attempt>,
}

impl MongoAttemptRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(collections::ATTEMPTS);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for attempts collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let user_status_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "status": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_status".to_string())
                    .build(),
            )
            .build();

        let status_index = IndexModel::builder()
            .keys(doc! { "status": 1 })
            .options(
                IndexOptions::builder()
                    .name("status".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(user_status_index).await?;
        self.collection.create_index(status_index).await?;

        log::info!("Successfully created indexes for attempts collection");
        Ok(())
    }
}

#[async_trait]
impl AttemptRepository for MongoAttemptRepository {
    async fn create(&self, attempt: Attempt) -> AppResult<Attempt> {
        self.collection.insert_one(&attempt).await?;
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>> {
        let attempt = self.collection.find_one(doc! { "id": id }).await?;
        Ok(attempt)
    }

    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<Attempt>> {
        let attempts = self
            .collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "started_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn list_completed_by_user(&self, user_id: &str) -> AppResult<Vec<Attempt>> {
        let attempts = self
            .collection
            .find(doc! {
                "user_id": user_id,
                "status": AttemptStatus::Completed.as_str(),
            })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn list_in_progress(&self) -> AppResult<Vec<Attempt>> {
        let attempts = self
            .collection
            .find(doc! { "status": AttemptStatus::InProgress.as_str() })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn complete_if_in_progress(
        &self,
        id: &str,
        completion: &AttemptCompletion,
    ) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "id": id, "status": AttemptStatus::InProgress.as_str() },
                doc! {
                    "$set": {
                        "status": AttemptStatus::Completed.as_str(),
                        "completed_at": to_bson(&completion.completed_at)?,
                        "score": completion.score,
                        "correct_count": completion.correct_count,
                        "incorrect_count": completion.incorrect_count,
                        "time_spent": completion.time_spent,
                    }
                },
            )
            .await?;
        Ok(result.modified_count == 1)
    }

    async fn abandon_if_in_progress(&self, id: &str, abandoned_at: DateTime<Utc>) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "id": id, "status": AttemptStatus::InProgress.as_str() },
                doc! {
                    "$set": {
                        "status": AttemptStatus::Abandoned.as_str(),
                        "abandoned_at": to_bson(&abandoned_at)?,
                    }
                },
            )
            .await?;
        Ok(result.modified_count == 1)
    }

    async fn update_score_if_completed(
        &self,
        id: &str,
        score: f64,
        correct_count: i32,
        incorrect_count: i32,
    ) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "id": id, "status": AttemptStatus::Completed.as_str() },
                doc! {
                    "$set": {
                        "score": score,
                        "correct_count": correct_count,
                        "incorrect_count": incorrect_count,
                    }
                },
            )
            .await?;
        Ok(result.matched_count == 1)
    }
}
