use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use secrecy::ExposeSecret;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    config::Config,
    constants::prompts::{ESSAY_EVALUATION_PROMPT, QUESTION_GENERATION_PROMPT, RECOMMENDATION_PROMPT},
    errors::{AppError, AppResult},
    models::domain::{Difficulty, QuestionOption, QuestionType, RecommendationType},
};

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*```$").expect("CODE_FENCE is a valid regex pattern")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EssayEvaluation {
    /// 0 to 10 inclusive.
    pub score: f64,
    pub evaluation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedQuestion {
    pub question_type: QuestionType,
    pub content: String,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedRecommendation {
    pub recommendation_type: RecommendationType,
    pub title: String,
    pub description: String,
    pub priority: i32,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GeneratedQuestionSet {
    questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GeneratedRecommendationSet {
    recommendations: Vec<GeneratedRecommendation>,
}

/// Boundary to the language model. Every call may fail or time out; callers
/// decide whether a failure is fatal or degrades to a fallback.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_questions(
        &self,
        content: &str,
        subject_name: &str,
        count: usize,
        difficulty: Difficulty,
    ) -> AppResult<Vec<GeneratedQuestion>>;

    async fn evaluate_essay(
        &self,
        question: &str,
        answer: &str,
        subject_name: &str,
    ) -> AppResult<EssayEvaluation>;

    async fn synthesize_recommendations(
        &self,
        performance_summary: &str,
        target_exam: &str,
        count: usize,
    ) -> AppResult<Vec<GeneratedRecommendation>>;
}

pub struct OpenAiTextGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiTextGenerator {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.openai_api_key.expose_secret())
            .with_api_base(&config.openai_api_base);

        Self {
            client: Client::with_config(openai_config),
            model: config.llm_model.clone(),
            timeout: Duration::from_secs(config.llm_timeout_seconds),
        }
    }

    async fn complete_json<T>(&self, system_prompt: &str, user_prompt: String) -> AppResult<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let schema = serde_json::to_string(&schemars::schema_for!(T))?;
        let system_message = format!(
            "{}\n\n## JSON SCHEMA\nThe response must validate against:\n{}",
            system_prompt, schema
        );

        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_message)
                    .build()?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_prompt)
                    .build()?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.2)
            .build()?;

        log::debug!("Calling text generation model '{}'", self.model);

        let chat = self.client.chat();
        let response = tokio::time::timeout(self.timeout, chat.create(request))
            .await
            .map_err(|_| {
                AppError::UpstreamUnavailable(format!(
                    "Text generation timed out after {}s",
                    self.timeout.as_secs()
                ))
            })??;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                AppError::UpstreamUnavailable("Text generation returned no content".to_string())
            })?;

        parse_model_json(&content)
    }
}

#[async_trait]
impl TextGenerator for OpenAiTextGenerator {
    async fn generate_questions(
        &self,
        content: &str,
        subject_name: &str,
        count: usize,
        difficulty: Difficulty,
    ) -> AppResult<Vec<GeneratedQuestion>> {
        let user_prompt = format!(
            "Subject: {}\nDifficulty: {:?}\nNumber of questions: {}\n\n## MATERIAL\n{}",
            subject_name, difficulty, count, content
        );
        let set: GeneratedQuestionSet = self.complete_json(QUESTION_GENERATION_PROMPT, user_prompt).await?;
        Ok(set.questions)
    }

    async fn evaluate_essay(
        &self,
        question: &str,
        answer: &str,
        subject_name: &str,
    ) -> AppResult<EssayEvaluation> {
        let user_prompt = format!(
            "Subject: {}\n\n## QUESTION\n{}\n\n## STUDENT ANSWER\n{}",
            subject_name, question, answer
        );
        self.complete_json(ESSAY_EVALUATION_PROMPT, user_prompt).await
    }

    async fn synthesize_recommendations(
        &self,
        performance_summary: &str,
        target_exam: &str,
        count: usize,
    ) -> AppResult<Vec<GeneratedRecommendation>> {
        let user_prompt = format!(
            "Target exam: {}\nMaximum recommendations: {}\n\n## PERFORMANCE\n{}",
            target_exam, count, performance_summary
        );
        let set: GeneratedRecommendationSet =
            self.complete_json(RECOMMENDATION_PROMPT, user_prompt).await?;
        Ok(set.recommendations)
    }
}

/// Models often wrap JSON in a markdown fence even when told not to.
pub fn parse_model_json<T: DeserializeOwned>(raw: &str) -> AppResult<T> {
    let trimmed = raw.trim();
    let body = CODE_FENCE
        .captures(trimmed)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    serde_json::from_str(body).map_err(|e| {
        AppError::UpstreamUnavailable(format!("Text generation returned malformed JSON: {}", e))
    })
}
