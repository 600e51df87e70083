use std::env;
use std::str::FromStr;

use secrecy::SecretString;

/// Pass mark (out of 10) for AI-scored essay answers.
pub const ESSAY_PASS_THRESHOLD: f64 = 6.0;

/// Upper bound for `AGGREGATION_MAX_RETRIES`; backoff doubles per retry.
pub const MAX_AGGREGATION_RETRIES: u32 = 10;

const DEFAULT_JWT_SECRET: &str = "dev_secret_key_change_in_production";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
            "memory" | "in_memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub storage_backend: StorageBackend,
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub jwt_secret: SecretString,
    pub jwt_expiration_hours: i64,
    pub openai_api_key: SecretString,
    pub openai_api_base: String,
    pub llm_model: String,
    pub llm_timeout_seconds: u64,
    pub essay_pass_threshold: f64,
    pub essay_grading_concurrency: usize,
    pub recommendation_count: usize,
    pub expiry_sweep_interval_seconds: u64,
    pub aggregation_max_retries: u32,
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Essay pass mark from its raw setting. Unparseable or non-finite values
/// fall back to the default; the rest are held to the 0-10 scale.
fn essay_threshold(raw: Option<&str>) -> f64 {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(ESSAY_PASS_THRESHOLD)
        .clamp(0.0, 10.0)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            storage_backend: env::var("STORAGE_BACKEND")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(StorageBackend::Mongo),
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME").unwrap_or_else(|_| "exam-prep-local".to_string()),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: parsed_or("WEB_SERVER_PORT", 8080),
            jwt_secret: SecretString::from(
                env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            ),
            jwt_expiration_hours: parsed_or("JWT_EXPIRATION_HOURS", 24),
            openai_api_key: SecretString::from(env::var("OPENAI_API_KEY").unwrap_or_default()),
            openai_api_base: env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            llm_timeout_seconds: parsed_or("LLM_TIMEOUT_SECONDS", 45),
            essay_pass_threshold: essay_threshold(env::var("ESSAY_PASS_THRESHOLD").ok().as_deref()),
            essay_grading_concurrency: parsed_or("ESSAY_GRADING_CONCURRENCY", 4usize).clamp(1, 8),
            recommendation_count: parsed_or("RECOMMENDATION_COUNT", 5usize).clamp(1, 10),
            expiry_sweep_interval_seconds: parsed_or("EXPIRY_SWEEP_INTERVAL_SECONDS", 60),
            aggregation_max_retries: parsed_or("AGGREGATION_MAX_RETRIES", 3u32)
                .min(MAX_AGGREGATION_RETRIES),
        }
    }

    /// Validate that production-critical configuration is set
    /// Panics if required secrets are using default values
    pub fn validate_for_production(&self) {
        use secrecy::ExposeSecret;

        let jwt_secret = self.jwt_secret.expose_secret();

        if jwt_secret == DEFAULT_JWT_SECRET {
            panic!(
                "FATAL: JWT_SECRET is using default value! Set JWT_SECRET environment variable to a secure random string."
            );
        }

        if jwt_secret.len() < 32 {
            panic!(
                "FATAL: JWT_SECRET is too short ({}). Must be at least 32 characters for security.",
                jwt_secret.len()
            );
        }

        if self.openai_api_key.expose_secret().is_empty() {
            panic!("FATAL: OPENAI_API_KEY is not set! Essay grading and recommendations need it.");
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            storage_backend: StorageBackend::Memory,
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "exam-prep-test".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            jwt_secret: SecretString::from("test_jwt_secret_key".to_string()),
            jwt_expiration_hours: 1,
            openai_api_key: SecretString::from("sk-test".to_string()),
            openai_api_base: "http://localhost:9999/v1".to_string(),
            llm_model: "test-model".to_string(),
            llm_timeout_seconds: 5,
            essay_pass_threshold: ESSAY_PASS_THRESHOLD,
            essay_grading_concurrency: 2,
            recommendation_count: 5,
            expiry_sweep_interval_seconds: 0,
            aggregation_max_retries: 1,
        }
    }
}
