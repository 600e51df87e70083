use async_graphql::{Enum, SimpleObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rolling per-subject statistics, keyed by (user_id, subject_id).
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, SimpleObject)]
pub struct SubjectPerformance {
    pub user_id: String,
    pub subject_id: String,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub average_score: f64,
    pub last_studied: Option<DateTime<Utc>>,
    pub strength_level: StrengthLevel,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Enum, Copy)]
#[serde(rename_all = "snake_case")]
pub enum StrengthLevel {
    Weak,
    Medium,
    Strong,
    Unknown,
}

impl StrengthLevel {
    pub const WEAK_BELOW: f64 = 60.0;
    pub const STRONG_FROM: f64 = 80.0;

    pub fn from_average(total_questions: i64, average_score: f64) -> Self {
        if total_questions == 0 {
            StrengthLevel::Unknown
        } else if average_score < Self::WEAK_BELOW {
            StrengthLevel::Weak
        } else if average_score < Self::STRONG_FROM {
            StrengthLevel::Medium
        } else {
            StrengthLevel::Strong
        }
    }

    /// Order in which subjects need attention: weakest first, subjects
    /// with no data ahead of strong ones.
    pub fn review_rank(&self) -> u8 {
        match self {
            StrengthLevel::Weak => 0,
            StrengthLevel::Medium => 1,
            StrengthLevel::Unknown => 2,
            StrengthLevel::Strong => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrengthLevel::Weak => "weak",
            StrengthLevel::Medium => "medium",
            StrengthLevel::Strong => "strong",
            StrengthLevel::Unknown => "unknown",
        }
    }
}
