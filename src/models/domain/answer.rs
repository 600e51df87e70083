use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row per (attempt, question).
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, SimpleObject)]
pub struct Answer {
    pub id: String,
    pub attempt_id: String,
    pub question_id: String,
    pub user_answer: Option<String>,
    pub is_correct: Option<bool>, // None until graded, or while an essay grading is pending
    pub ai_score: Option<f64>,    // 0-10, essays only
    pub ai_evaluation: Option<String>,
    pub time_spent: i64,
    #[serde(default)]
    pub flagged: bool, // marked for review by the test taker
    pub graded_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grading_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Answer {
    pub fn new(attempt_id: &str, question_id: &str) -> Self {
        Answer {
            id: Uuid::new_v4().to_string(),
            attempt_id: attempt_id.to_string(),
            question_id: question_id.to_string(),
            user_answer: None,
            is_correct: None,
            ai_score: None,
            ai_evaluation: None,
            time_spent: 0,
            flagged: false,
            graded_at: None,
            grading_error: None,
            modified_at: Some(Utc::now()),
        }
    }

    /// Normalised answer text; blank input counts as unanswered.
    pub fn answer_text(&self) -> Option<&str> {
        self.user_answer
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn is_graded(&self) -> bool {
        self.graded_at.is_some() && self.is_correct.is_some()
    }

    /// Grading was attempted and failed; excluded from the score until regraded.
    pub fn is_pending(&self) -> bool {
        self.graded_at.is_none() && self.grading_error.is_some()
    }

    /// Overwrites the answer text (latest wins) and accumulates time spent.
    pub fn record(&mut self, user_answer: Option<String>, time_spent_delta: i64) {
        self.user_answer = user_answer;
        self.time_spent += time_spent_delta.max(0);
        self.is_correct = None;
        self.ai_score = None;
        self.ai_evaluation = None;
        self.graded_at = None;
        self.grading_error = None;
        self.modified_at = Some(Utc::now());
    }

    pub fn set_flagged(&mut self, flagged: bool) {
        self.flagged = flagged;
        self.modified_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_answers_count_as_unanswered() {
        let mut answer = Answer::new("attempt-1", "q-1");
        assert_eq!(answer.answer_text(), None);

        answer.user_answer = Some("   ".to_string());
        assert_eq!(answer.answer_text(), None);

        answer.user_answer = Some(" b ".to_string());
        assert_eq!(answer.answer_text(), Some("b"));
    }

    #[test]
    fn record_overwrites_answer_and_sums_time() {
        let mut answer = Answer::new("attempt-1", "q-1");
        answer.record(Some("A".to_string()), 30);
        answer.record(Some("C".to_string()), 15);

        assert_eq!(answer.user_answer.as_deref(), Some("C"));
        assert_eq!(answer.time_spent, 45);
    }

    #[test]
    fn flag_survives_answer_changes() {
        let mut answer = Answer::new("attempt-1", "q-1");
        answer.set_flagged(true);
        answer.record(Some("B".to_string()), 10);

        assert!(answer.flagged);
        assert_eq!(answer.user_answer.as_deref(), Some("B"));
        assert_eq!(answer.time_spent, 10);
    }

    #[test]
    fn rows_stored_before_flagging_read_as_unflagged() {
        let answer: Answer = serde_json::from_value(serde_json::json!({
            "id": "a-1",
            "attempt_id": "attempt-1",
            "question_id": "q-1",
            "user_answer": "A",
            "is_correct": null,
            "ai_score": null,
            "ai_evaluation": null,
            "time_spent": 5,
            "graded_at": null
        }))
        .expect("should parse");
        assert!(!answer.flagged);
    }

    #[test]
    fn negative_time_deltas_are_ignored() {
        let mut answer = Answer::new("attempt-1", "q-1");
        answer.record(Some("A".to_string()), -20);
        assert_eq!(answer.time_spent, 0);
    }

    #[test]
    fn pending_and_graded_are_distinct() {
        let mut answer = Answer::new("attempt-1", "q-1");
        assert!(!answer.is_graded());
        assert!(!answer.is_pending());

        answer.grading_error = Some("timeout".to_string());
        assert!(answer.is_pending());

        answer.grading_error = None;
        answer.is_correct = Some(false);
        answer.graded_at = Some(Utc::now());
        assert!(answer.is_graded());
        assert!(!answer.is_pending());
    }
}
