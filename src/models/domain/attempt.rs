use async_graphql::{Enum, SimpleObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, SimpleObject)]
pub struct Attempt {
    pub id: String,
    pub user_id: String,
    pub exam_id: String,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub score: Option<f64>, // 0-100, full precision
    pub correct_count: Option<i32>,
    pub incorrect_count: Option<i32>,
    pub time_spent: Option<i64>, // seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abandoned_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Enum, Copy)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::Completed => "completed",
            AttemptStatus::Abandoned => "abandoned",
        }
    }
}

impl std::fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fields written by the single in_progress -> completed transition.
#[derive(Clone, Debug, PartialEq)]
pub struct AttemptCompletion {
    pub completed_at: DateTime<Utc>,
    pub score: f64,
    pub correct_count: i32,
    pub incorrect_count: i32,
    pub time_spent: i64,
}

impl Attempt {
    pub fn start(user_id: &str, exam_id: &str) -> Self {
        Attempt {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            exam_id: exam_id.to_string(),
            status: AttemptStatus::InProgress,
            started_at: Utc::now(),
            completed_at: None,
            score: None,
            correct_count: None,
            incorrect_count: None,
            time_spent: None,
            abandoned_at: None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == AttemptStatus::InProgress
    }

    pub fn apply_completion(&mut self, completion: &AttemptCompletion) {
        self.status = AttemptStatus::Completed;
        self.completed_at = Some(completion.completed_at);
        self.score = Some(completion.score);
        self.correct_count = Some(completion.correct_count);
        self.incorrect_count = Some(completion.incorrect_count);
        self.time_spent = Some(completion.time_spent);
    }

    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_seconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn started_attempt_has_no_results_yet() {
        let attempt = Attempt::start("user-1", "exam-1");

        assert!(attempt.is_in_progress());
        assert!(attempt.completed_at.is_none());
        assert!(attempt.score.is_none());
        assert!(attempt.correct_count.is_none());
        assert!(attempt.time_spent.is_none());
    }

    #[test]
    fn status_serializes_as_snake_case() {
        let json = serde_json::to_string(&AttemptStatus::InProgress).expect("serialize");
        assert_eq!(json, "\"in_progress\"");
        assert_eq!(AttemptStatus::Abandoned.to_string(), "abandoned");
    }

    #[test]
    fn apply_completion_fills_every_result_field() {
        let mut attempt = Attempt::start("user-1", "exam-1");
        let completion = AttemptCompletion {
            completed_at: Utc::now(),
            score: 70.0,
            correct_count: 7,
            incorrect_count: 3,
            time_spent: 600,
        };

        attempt.apply_completion(&completion);

        assert_eq!(attempt.status, AttemptStatus::Completed);
        assert_eq!(attempt.score, Some(70.0));
        assert_eq!(attempt.correct_count, Some(7));
        assert_eq!(attempt.incorrect_count, Some(3));
        assert_eq!(attempt.time_spent, Some(600));
    }
}
