use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{db::{collections, Database}, errors::AppResult, models::domain::Subject};

#[async_trait]
pub trait SubjectRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Subject>>;
    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<Subject>>;
    async fn create(&self, subject: Subject) -> AppResult<Subject>;
}

pub struct MongoSubjectRepository {
    collection: Collection<Subject>,
}

impl MongoSubjectRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(collections::SUBJECTS);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for subjects collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;

        log::info!("Successfully created indexes for subjects collection");
        Ok(())
    }
}

#[async_trait]
impl SubjectRepository for MongoSubjectRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Subject>> {
        let subject = self.collection.find_one(doc! { "id": id }).await?;
        Ok(subject)
    }

    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<Subject>> {
        let subjects = self
            .collection
            .find(doc! { "id": { "$in": ids.to_vec() } })
            .await?
            .try_collect()
            .await?;
        Ok(subjects)
    }

    async fn create(&self, subject: Subject) -> AppResult<Subject> {
        self.collection.insert_one(&subject).await?;
        Ok(subject)
    }
}
