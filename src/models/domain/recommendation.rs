use async_graphql::{Enum, SimpleObject};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const HIGHEST_PRIORITY: i32 = 1;
pub const LOWEST_PRIORITY: i32 = 5;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
pub struct Recommendation {
    pub id: String,
    pub user_id: String,
    pub recommendation_type: RecommendationType,
    pub title: String,
    pub description: String,
    pub priority: i32, // 1 = most urgent
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Enum, Copy, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    StudyFocus,
    Material,
    Exam,
}

impl Recommendation {
    pub fn new(
        user_id: &str,
        recommendation_type: RecommendationType,
        title: &str,
        description: &str,
        priority: i32,
    ) -> Self {
        Recommendation {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            recommendation_type,
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            priority: priority.clamp(HIGHEST_PRIORITY, LOWEST_PRIORITY),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    /// Display label for the numeric priority.
    pub fn priority_label(&self) -> &'static str {
        priority_label(self.priority)
    }
}

pub fn priority_label(priority: i32) -> &'static str {
    match priority {
        i32::MIN..=2 => "high",
        3 => "medium",
        _ => "low",
    }
}
