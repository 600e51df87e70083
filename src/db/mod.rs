use std::time::Duration;

use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection,
};

use crate::{config::Config, errors::AppResult};

/// Collection names, one per persisted entity.
pub mod collections {
    pub const SUBJECTS: &str = "subjects";
    pub const QUESTIONS: &str = "questions";
    pub const EXAMS: &str = "exams";
    pub const ATTEMPTS: &str = "attempts";
    pub const ANSWERS: &str = "answers";
    pub const SUBJECT_PERFORMANCE: &str = "subject_performance";
    pub const RECOMMENDATIONS: &str = "recommendations";

    pub const ALL: [&str; 7] = [
        SUBJECTS,
        QUESTIONS,
        EXAMS,
        ATTEMPTS,
        ANSWERS,
        SUBJECT_PERFORMANCE,
        RECOMMENDATIONS,
    ];
}

const APP_NAME: &str = "exam-prep-server";

/// Handle to the exam database. Cheap to clone; clones share one pool.
#[derive(Clone)]
pub struct Database {
    client: Client,
    db_name: String,
}

impl Database {
    /// Connects and pings once so a bad connection string fails at startup
    /// rather than on the first request.
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let options = client_options(&config.mongo_conn_string).await?;
        let database = Self {
            client: Client::with_options(options)?,
            db_name: config.mongo_db_name.clone(),
        };
        database.ping().await?;

        log::info!("Connected to MongoDB database '{}'", database.db_name);
        Ok(database)
    }

    pub fn get_collection<T>(&self, collection_name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.client
            .database(&self.db_name)
            .collection(collection_name)
    }

    /// Used by the readiness check.
    pub async fn health_check(&self) -> AppResult<()> {
        self.ping().await.map_err(|e| {
            log::warn!("MongoDB readiness check failed for '{}': {}", self.db_name, e);
            e
        })
    }

    async fn ping(&self) -> AppResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}

async fn client_options(conn_string: &str) -> AppResult<ClientOptions> {
    let mut options = ClientOptions::parse(conn_string).await?;
    options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
    options.app_name = Some(APP_NAME.to_string());
    options.max_pool_size = Some(10);
    options.min_pool_size = Some(2);
    options.connect_timeout = Some(Duration::from_secs(5));
    options.server_selection_timeout = Some(Duration::from_secs(5));
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn database_handle_is_shareable() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<Database>();
    }

    #[test]
    fn collection_names_are_distinct() {
        let names: HashSet<&str> = collections::ALL.iter().copied().collect();
        assert_eq!(names.len(), collections::ALL.len());
    }

    #[tokio::test]
    async fn client_options_apply_pool_and_timeouts() {
        let options = client_options("mongodb://localhost:27017").await.unwrap();

        assert_eq!(options.app_name.as_deref(), Some(APP_NAME));
        assert_eq!(options.max_pool_size, Some(10));
        assert_eq!(options.connect_timeout, Some(Duration::from_secs(5)));
        assert!(options.server_api.is_some());
    }

    #[tokio::test]
    async fn malformed_connection_string_is_rejected() {
        assert!(client_options("not-a-mongo-uri").await.is_err());
    }
}
