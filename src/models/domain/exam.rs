use std::collections::HashSet;

use async_graphql::{Enum, SimpleObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
pub struct Exam {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<ExamQuestion>, // ordered, order starts at 0
    pub question_count: i32,
    pub time_limit_minutes: Option<i32>, // None = unlimited
    pub status: ExamStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
pub struct ExamQuestion {
    pub question_id: String,
    pub order: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Enum, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ExamStatus {
    Draft,
    Ready,
    Completed,
}

impl Exam {
    pub fn new_draft(
        owner_id: &str,
        title: &str,
        description: Option<String>,
        time_limit_minutes: Option<i32>,
    ) -> Self {
        let now = Utc::now();
        Exam {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            title: title.to_string(),
            description,
            questions: Vec::new(),
            question_count: 0,
            time_limit_minutes,
            status: ExamStatus::Draft,
            created_at: Some(now),
            modified_at: Some(now),
        }
    }

    /// Replaces the question list with `question_ids` in the given order and
    /// flips the exam to ready once it has at least one question. A repeated
    /// id keeps its first position.
    pub fn attach_questions(&mut self, question_ids: &[String]) {
        let mut seen = HashSet::new();
        self.questions = question_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .enumerate()
            .map(|(index, id)| ExamQuestion {
                question_id: id.clone(),
                order: index as i32,
            })
            .collect();
        self.question_count = self.questions.len() as i32;
        if self.question_count > 0 {
            self.status = ExamStatus::Ready;
        }
        self.modified_at = Some(Utc::now());
    }

    pub fn ordered_question_ids(&self) -> Vec<String> {
        let mut questions = self.questions.clone();
        questions.sort_by_key(|q| q.order);
        let mut seen = HashSet::new();
        questions
            .into_iter()
            .map(|q| q.question_id)
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }

    pub fn is_available_for_attempts(&self) -> bool {
        matches!(self.status, ExamStatus::Ready | ExamStatus::Completed) && self.question_count > 0
    }

    pub fn time_limit_seconds(&self) -> Option<i64> {
        self.time_limit_minutes
            .filter(|m| *m > 0)
            .map(|m| i64::from(m) * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_draft_has_no_questions_and_is_not_available() {
        let exam = Exam::new_draft("user-1", "Biology midterm", None, Some(30));

        assert_eq!(exam.status, ExamStatus::Draft);
        assert_eq!(exam.question_count, 0);
        assert!(!exam.is_available_for_attempts());
        assert_eq!(exam.time_limit_seconds(), Some(1800));
    }

    #[test]
    fn attaching_questions_assigns_contiguous_order_and_marks_ready() {
        let mut exam = Exam::new_draft("user-1", "Biology midterm", None, None);
        exam.attach_questions(&["q-3".to_string(), "q-1".to_string(), "q-2".to_string()]);

        assert_eq!(exam.status, ExamStatus::Ready);
        assert_eq!(exam.question_count, 3);
        let orders: Vec<i32> = exam.questions.iter().map(|q| q.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(exam.ordered_question_ids(), vec!["q-3", "q-1", "q-2"]);
        assert!(exam.is_available_for_attempts());
    }

    #[test]
    fn repeated_question_ids_are_attached_once() {
        let mut exam = Exam::new_draft("user-1", "Biology midterm", None, None);
        exam.attach_questions(&["q-1".to_string(), "q-2".to_string(), "q-1".to_string()]);

        assert_eq!(exam.question_count, 2);
        assert_eq!(exam.ordered_question_ids(), vec!["q-1", "q-2"]);
    }

    #[test]
    fn stored_duplicates_are_read_once() {
        let mut exam = Exam::new_draft("user-1", "Legacy", None, None);
        exam.questions = vec![
            ExamQuestion { question_id: "q-1".to_string(), order: 0 },
            ExamQuestion { question_id: "q-1".to_string(), order: 1 },
        ];
        assert_eq!(exam.ordered_question_ids(), vec!["q-1"]);
    }

    #[test]
    fn zero_or_missing_time_limit_means_unlimited() {
        let mut exam = Exam::new_draft("user-1", "Untimed", None, None);
        assert_eq!(exam.time_limit_seconds(), None);

        exam.time_limit_minutes = Some(0);
        assert_eq!(exam.time_limit_seconds(), None);
    }
}
