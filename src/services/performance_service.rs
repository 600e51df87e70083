use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::{
    config::MAX_AGGREGATION_RETRIES,
    errors::AppResult,
    models::{
        domain::{Answer, StrengthLevel, SubjectPerformance},
        dto::response::PerformanceDto,
    },
    repositories::{AnswerRepository, AttemptRepository, PerformanceRepository, QuestionRepository},
    services::question_bank_service::QuestionBankService,
};

const RETRY_BASE_DELAY_MS: u64 = 200;

/// Full recompute from the graded answers of one subject. `answers` pairs each
/// answer with the completion time of its attempt. Pending answers are skipped.
pub fn compute_performance(
    user_id: &str,
    subject_id: &str,
    answers: &[(Answer, Option<DateTime<Utc>>)],
) -> SubjectPerformance {
    let graded: Vec<&(Answer, Option<DateTime<Utc>>)> =
        answers.iter().filter(|(a, _)| a.is_graded()).collect();

    let total_questions = graded.len() as i64;
    let correct_answers = graded
        .iter()
        .filter(|(a, _)| a.is_correct == Some(true))
        .count() as i64;
    let average_score = if total_questions == 0 {
        0.0
    } else {
        100.0 * correct_answers as f64 / total_questions as f64
    };
    let last_studied = graded.iter().filter_map(|(_, completed_at)| *completed_at).max();

    SubjectPerformance {
        user_id: user_id.to_string(),
        subject_id: subject_id.to_string(),
        total_questions,
        correct_answers,
        average_score,
        last_studied,
        strength_level: StrengthLevel::from_average(total_questions, average_score),
    }
}

pub struct PerformanceService {
    attempts: Arc<dyn AttemptRepository>,
    answers: Arc<dyn AnswerRepository>,
    questions: Arc<dyn QuestionRepository>,
    performance: Arc<dyn PerformanceRepository>,
    question_bank: Arc<QuestionBankService>,
}

impl PerformanceService {
    pub fn new(
        attempts: Arc<dyn AttemptRepository>,
        answers: Arc<dyn AnswerRepository>,
        questions: Arc<dyn QuestionRepository>,
        performance: Arc<dyn PerformanceRepository>,
        question_bank: Arc<QuestionBankService>,
    ) -> Self {
        Self {
            attempts,
            answers,
            questions,
            performance,
            question_bank,
        }
    }

    /// Recomputes (user, subject) from every completed attempt. Safe to run
    /// any number of times; concurrent runs converge on the same row.
    pub async fn refresh(&self, user_id: &str, subject_id: &str) -> AppResult<SubjectPerformance> {
        let attempts = self.attempts.list_completed_by_user(user_id).await?;
        let completed_at: HashMap<String, Option<DateTime<Utc>>> = attempts
            .iter()
            .map(|a| (a.id.clone(), a.completed_at))
            .collect();
        let attempt_ids: Vec<String> = attempts.into_iter().map(|a| a.id).collect();

        let answers = if attempt_ids.is_empty() {
            Vec::new()
        } else {
            self.answers.list_by_attempts(&attempt_ids).await?
        };

        let question_ids: Vec<String> = answers
            .iter()
            .map(|a| a.question_id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let subject_questions: HashSet<String> = if question_ids.is_empty() {
            HashSet::new()
        } else {
            self.questions
                .find_by_ids(&question_ids)
                .await?
                .into_iter()
                .filter(|q| q.subject_id == subject_id)
                .map(|q| q.id)
                .collect()
        };

        let relevant: Vec<(Answer, Option<DateTime<Utc>>)> = answers
            .into_iter()
            .filter(|a| subject_questions.contains(&a.question_id))
            .map(|a| {
                let done = completed_at.get(&a.attempt_id).copied().flatten();
                (a, done)
            })
            .collect();

        let performance = compute_performance(user_id, subject_id, &relevant);
        log::debug!(
            "Refreshed performance for user {} subject {}: {}/{} correct",
            user_id,
            subject_id,
            performance.correct_answers,
            performance.total_questions
        );

        self.performance.upsert(performance).await
    }

    /// Weakest subjects first.
    pub async fn list_performance(&self, user_id: &str) -> AppResult<Vec<PerformanceDto>> {
        let rows = self.performance.list_by_user(user_id).await?;
        let subject_ids: Vec<String> = rows.iter().map(|p| p.subject_id.clone()).collect();
        let names = self.question_bank.subject_names(&subject_ids).await?;

        Ok(rows
            .into_iter()
            .map(|p| {
                let name = names
                    .get(&p.subject_id)
                    .cloned()
                    .unwrap_or_else(|| p.subject_id.clone());
                PerformanceDto::new(p, name)
            })
            .collect())
    }
}

/// Runs aggregation off the request path. Each subject is retried with
/// exponential backoff; a subject that keeps failing is logged and dropped.
#[derive(Clone)]
pub struct PerformanceRefresher {
    service: Arc<PerformanceService>,
    max_retries: u32,
}

impl PerformanceRefresher {
    pub fn new(service: Arc<PerformanceService>, max_retries: u32) -> Self {
        Self {
            service,
            max_retries: max_retries.min(MAX_AGGREGATION_RETRIES),
        }
    }

    pub fn trigger(&self, user_id: String, subject_ids: Vec<String>) -> JoinHandle<()> {
        let service = self.service.clone();
        let max_retries = self.max_retries;

        tokio::spawn(async move {
            for subject_id in subject_ids {
                refresh_with_retry(&service, &user_id, &subject_id, max_retries).await;
            }
        })
    }
}

/// Exponential backoff that saturates instead of overflowing.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(RETRY_BASE_DELAY_MS.saturating_mul(2u64.saturating_pow(attempt)))
}

async fn refresh_with_retry(service: &PerformanceService, user_id: &str, subject_id: &str, max_retries: u32) {
    let mut attempt = 0;
    loop {
        match service.refresh(user_id, subject_id).await {
            Ok(_) => return,
            Err(e) if attempt < max_retries => {
                let delay = backoff_delay(attempt);
                log::warn!(
                    "Performance refresh for user {} subject {} failed (attempt {}), retrying in {:?}: {}",
                    user_id,
                    subject_id,
                    attempt + 1,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                log::warn!(
                    "Performance refresh for user {} subject {} gave up after {} attempts: {}",
                    user_id,
                    subject_id,
                    attempt + 1,
                    e
                );
                return;
            }
        }
    }
}
