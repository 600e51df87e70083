use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{IndexOptions, ReplaceOptions},
    Collection, IndexModel,
};

use crate::{db::{collections, Database}, errors::AppResult, models::domain::Answer};

#[async_trait]
pub trait AnswerRepository: Send + Sync {
    async fn find(&self, attempt_id: &str, question_id: &str) -> AppResult<Option<Answer>>;
    async fn list_by_attempt(&self, attempt_id: &str) -> AppResult<Vec<Answer>>;
    async fn list_by_attempts(&self, attempt_ids: &[String]) -> AppResult<Vec<Answer>>;
    /// Inserts or replaces the single row for (attempt_id, question_id).
    async fn upsert(&self, answer: Answer) -> AppResult<Answer>;
}

pub struct MongoAnswerRepository {
    collection: Collection<Answer>,
}

impl MongoAnswerRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(collections::ANSWERS);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for answers collection");

        let attempt_question_index = IndexModel::builder()
            .keys(doc! { "attempt_id": 1, "question_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("attempt_question_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(attempt_question_index).await?;

        log::info!("Successfully created indexes for answers collection");
        Ok(())
    }
}

#[async_trait]
impl AnswerRepository for MongoAnswerRepository {
    async fn find(&self, attempt_id: &str, question_id: &str) -> AppResult<Option<Answer>> {
        let answer = self
            .collection
            .find_one(doc! { "attempt_id": attempt_id, "question_id": question_id })
            .await?;
        Ok(answer)
    }

    async fn list_by_attempt(&self, attempt_id: &str) -> AppResult<Vec<Answer>> {
        let answers = self
            .collection
            .find(doc! { "attempt_id": attempt_id })
            .await?
            .try_collect()
            .await?;
        Ok(answers)
    }

    async fn list_by_attempts(&self, attempt_ids: &[String]) -> AppResult<Vec<Answer>> {
        if attempt_ids.is_empty() {
            return Ok(Vec::new());
        }

        let answers = self
            .collection
            .find(doc! { "attempt_id": { "$in": attempt_ids.to_vec() } })
            .await?
            .try_collect()
            .await?;
        Ok(answers)
    }

    async fn upsert(&self, answer: Answer) -> AppResult<Answer> {
        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(
                doc! { "attempt_id": &answer.attempt_id, "question_id": &answer.question_id },
                &answer,
            )
            .with_options(options)
            .await?;
        Ok(answer)
    }
}
