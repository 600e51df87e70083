use std::collections::HashSet;

use async_graphql::{Enum, SimpleObject};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, SimpleObject)]
pub struct Question {
    pub id: String,
    pub subject_id: String,
    pub content: String,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub options: Vec<QuestionOption>, // empty for essays
    pub correct_answer: Option<String>, // option letter, objective only
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject, JsonSchema)]
pub struct QuestionOption {
    pub letter: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, Enum, Copy, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Objective, // single correct letter
    Essay,     // AI-scored free text
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Enum, Copy, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Question {
    pub fn new_objective(
        subject_id: &str,
        content: &str,
        difficulty: Difficulty,
        options: Vec<QuestionOption>,
        correct_answer: &str,
    ) -> Self {
        Question {
            id: Uuid::new_v4().to_string(),
            subject_id: subject_id.to_string(),
            content: content.to_string(),
            question_type: QuestionType::Objective,
            difficulty,
            options,
            correct_answer: Some(correct_answer.trim().to_uppercase()),
            explanation: None,
            created_at: Some(Utc::now()),
        }
    }

    pub fn new_essay(
        subject_id: &str,
        content: &str,
        difficulty: Difficulty,
        explanation: Option<String>,
    ) -> Self {
        Question {
            id: Uuid::new_v4().to_string(),
            subject_id: subject_id.to_string(),
            content: content.to_string(),
            question_type: QuestionType::Essay,
            difficulty,
            options: Vec::new(),
            correct_answer: None,
            explanation,
            created_at: Some(Utc::now()),
        }
    }

    pub fn is_essay(&self) -> bool {
        self.question_type == QuestionType::Essay
    }

    /// Checks the option/answer shape for the question type.
    pub fn validate_shape(&self) -> AppResult<()> {
        if self.content.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Question content cannot be empty".to_string(),
            ));
        }

        match self.question_type {
            QuestionType::Objective => {
                if self.options.len() < 2 {
                    return Err(AppError::ValidationError(format!(
                        "Objective question '{}' needs at least two options",
                        self.id
                    )));
                }

                let mut seen = HashSet::new();
                for option in &self.options {
                    let letter = option.letter.trim().to_uppercase();
                    if letter.is_empty() {
                        return Err(AppError::ValidationError(format!(
                            "Question '{}' has an option without a letter",
                            self.id
                        )));
                    }
                    if !seen.insert(letter) {
                        return Err(AppError::ValidationError(format!(
                            "Question '{}' repeats option letter '{}'",
                            self.id, option.letter
                        )));
                    }
                }

                let correct = self
                    .correct_answer
                    .as_deref()
                    .map(|c| c.trim().to_uppercase())
                    .unwrap_or_default();
                if !seen.contains(&correct) {
                    return Err(AppError::ValidationError(format!(
                        "Question '{}' correct answer must be one of its option letters",
                        self.id
                    )));
                }
            }
            QuestionType::Essay => {
                if !self.options.is_empty() {
                    return Err(AppError::ValidationError(format!(
                        "Essay question '{}' cannot have options",
                        self.id
                    )));
                }
            }
        }

        Ok(())
    }
}
