//! Process-local repositories backed by `RwLock<HashMap>`. Used for
//! `STORAGE_BACKEND=memory` and throughout the test suites.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{
        Answer, Attempt, AttemptCompletion, AttemptStatus, Exam, Question, Recommendation,
        Subject, SubjectPerformance,
    },
    repositories::{
        AnswerRepository, AttemptRepository, ExamRepository, PerformanceRepository,
        QuestionRepository, RecommendationRepository, SubjectRepository,
    },
};

#[derive(Default)]
pub struct InMemorySubjectRepository {
    subjects: Arc<RwLock<HashMap<String, Subject>>>,
}

impl InMemorySubjectRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubjectRepository for InMemorySubjectRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Subject>> {
        let subjects = self.subjects.read().await;
        Ok(subjects.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<Subject>> {
        let subjects = self.subjects.read().await;
        Ok(ids.iter().filter_map(|id| subjects.get(id).cloned()).collect())
    }

    async fn create(&self, subject: Subject) -> AppResult<Subject> {
        let mut subjects = self.subjects.write().await;
        if subjects.contains_key(&subject.id) {
            return Err(AppError::Conflict(format!(
                "Subject with id '{}' already exists",
                subject.id
            )));
        }
        subjects.insert(subject.id.clone(), subject.clone());
        Ok(subject)
    }
}

#[derive(Default)]
pub struct InMemoryQuestionRepository {
    questions: Arc<RwLock<HashMap<String, Question>>>,
}

impl InMemoryQuestionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Question>> {
        let questions = self.questions.read().await;
        Ok(questions.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<Question>> {
        let questions = self.questions.read().await;
        Ok(ids.iter().filter_map(|id| questions.get(id).cloned()).collect())
    }

    async fn list_by_subject(&self, subject_id: &str) -> AppResult<Vec<Question>> {
        let questions = self.questions.read().await;
        let mut items: Vec<_> = questions
            .values()
            .filter(|q| q.subject_id == subject_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn create_many(&self, new_questions: Vec<Question>) -> AppResult<Vec<Question>> {
        let mut questions = self.questions.write().await;
        if let Some(existing) = new_questions.iter().find(|q| questions.contains_key(&q.id)) {
            return Err(AppError::Conflict(format!(
                "Question with id '{}' already exists",
                existing.id
            )));
        }
        for question in &new_questions {
            questions.insert(question.id.clone(), question.clone());
        }
        Ok(new_questions)
    }
}

#[derive(Default)]
pub struct InMemoryExamRepository {
    exams: Arc<RwLock<HashMap<String, Exam>>>,
}

impl InMemoryExamRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExamRepository for InMemoryExamRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Exam>> {
        let exams = self.exams.read().await;
        Ok(exams.get(id).cloned())
    }

    async fn list_by_owner(&self, owner_id: &str) -> AppResult<Vec<Exam>> {
        let exams = self.exams.read().await;
        let mut items: Vec<_> = exams
            .values()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn create(&self, exam: Exam) -> AppResult<Exam> {
        let mut exams = self.exams.write().await;
        if exams.contains_key(&exam.id) {
            return Err(AppError::Conflict(format!(
                "Exam with id '{}' already exists",
                exam.id
            )));
        }
        exams.insert(exam.id.clone(), exam.clone());
        Ok(exam)
    }

    async fn update(&self, exam: Exam) -> AppResult<Exam> {
        let mut exams = self.exams.write().await;
        if !exams.contains_key(&exam.id) {
            return Err(AppError::NotFound(format!(
                "Exam with id '{}' not found",
                exam.id
            )));
        }
        exams.insert(exam.id.clone(), exam.clone());
        Ok(exam)
    }
}

#[derive(Default)]
pub struct InMemoryAttemptRepository {
    attempts: Arc<RwLock<HashMap<String, Attempt>>>,
}

impl InMemoryAttemptRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttemptRepository for InMemoryAttemptRepository {
    async fn create(&self, attempt: Attempt) -> AppResult<Attempt> {
        let mut attempts = self.attempts.write().await;
        if attempts.contains_key(&attempt.id) {
            return Err(AppError::Conflict(format!(
                "Attempt with id '{}' already exists",
                attempt.id
            )));
        }
        attempts.insert(attempt.id.clone(), attempt.clone());
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts.get(id).cloned())
    }

    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<Attempt>> {
        let attempts = self.attempts.read().await;
        let mut items: Vec<_> = attempts
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(items)
    }

    async fn list_completed_by_user(&self, user_id: &str) -> AppResult<Vec<Attempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .filter(|a| a.user_id == user_id && a.status == AttemptStatus::Completed)
            .cloned()
            .collect())
    }

    async fn list_in_progress(&self) -> AppResult<Vec<Attempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .filter(|a| a.status == AttemptStatus::InProgress)
            .cloned()
            .collect())
    }

    async fn complete_if_in_progress(
        &self,
        id: &str,
        completion: &AttemptCompletion,
    ) -> AppResult<bool> {
        let mut attempts = self.attempts.write().await;
        match attempts.get_mut(id) {
            Some(attempt) if attempt.status == AttemptStatus::InProgress => {
                attempt.apply_completion(completion);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn abandon_if_in_progress(&self, id: &str, abandoned_at: DateTime<Utc>) -> AppResult<bool> {
        let mut attempts = self.attempts.write().await;
        match attempts.get_mut(id) {
            Some(attempt) if attempt.status == AttemptStatus::InProgress => {
                attempt.status = AttemptStatus::Abandoned;
                attempt.abandoned_at = Some(abandoned_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_score_if_completed(
        &self,
        id: &str,
        score: f64,
        correct_count: i32,
        incorrect_count: i32,
    ) -> AppResult<bool> {
        let mut attempts = self.attempts.write().await;
        match attempts.get_mut(id) {
            Some(attempt) if attempt.status == AttemptStatus::Completed => {
                attempt.score = Some(score);
                attempt.correct_count = Some(correct_count);
                attempt.incorrect_count = Some(incorrect_count);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryAnswerRepository {
    // keyed by (attempt_id, question_id)
    answers: Arc<RwLock<HashMap<(String, String), Answer>>>,
}

impl InMemoryAnswerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnswerRepository for InMemoryAnswerRepository {
    async fn find(&self, attempt_id: &str, question_id: &str) -> AppResult<Option<Answer>> {
        let answers = self.answers.read().await;
        Ok(answers
            .get(&(attempt_id.to_string(), question_id.to_string()))
            .cloned())
    }

    async fn list_by_attempt(&self, attempt_id: &str) -> AppResult<Vec<Answer>> {
        let answers = self.answers.read().await;
        let mut items: Vec<_> = answers
            .values()
            .filter(|a| a.attempt_id == attempt_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.question_id.cmp(&b.question_id));
        Ok(items)
    }

    async fn list_by_attempts(&self, attempt_ids: &[String]) -> AppResult<Vec<Answer>> {
        let answers = self.answers.read().await;
        let mut items: Vec<_> = answers
            .values()
            .filter(|a| attempt_ids.contains(&a.attempt_id))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.attempt_id
                .cmp(&b.attempt_id)
                .then(a.question_id.cmp(&b.question_id))
        });
        Ok(items)
    }

    async fn upsert(&self, answer: Answer) -> AppResult<Answer> {
        let mut answers = self.answers.write().await;
        answers.insert(
            (answer.attempt_id.clone(), answer.question_id.clone()),
            answer.clone(),
        );
        Ok(answer)
    }
}

#[derive(Default)]
pub struct InMemoryPerformanceRepository {
    rows: Arc<RwLock<HashMap<(String, String), SubjectPerformance>>>,
}

impl InMemoryPerformanceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PerformanceRepository for InMemoryPerformanceRepository {
    async fn find(&self, user_id: &str, subject_id: &str) -> AppResult<Option<SubjectPerformance>> {
        let rows = self.rows.read().await;
        Ok(rows
            .get(&(user_id.to_string(), subject_id.to_string()))
            .cloned())
    }

    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<SubjectPerformance>> {
        let rows = self.rows.read().await;
        let mut items: Vec<_> = rows
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.average_score
                .total_cmp(&b.average_score)
                .then(a.subject_id.cmp(&b.subject_id))
        });
        Ok(items)
    }

    async fn upsert(&self, performance: SubjectPerformance) -> AppResult<SubjectPerformance> {
        let mut rows = self.rows.write().await;
        rows.insert(
            (performance.user_id.clone(), performance.subject_id.clone()),
            performance.clone(),
        );
        Ok(performance)
    }
}

#[derive(Default)]
pub struct InMemoryRecommendationRepository {
    recommendations: Arc<RwLock<HashMap<String, Recommendation>>>,
}

impl InMemoryRecommendationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecommendationRepository for InMemoryRecommendationRepository {
    async fn create_many(&self, new_items: Vec<Recommendation>) -> AppResult<Vec<Recommendation>> {
        let mut recommendations = self.recommendations.write().await;
        for item in &new_items {
            recommendations.insert(item.id.clone(), item.clone());
        }
        Ok(new_items)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Recommendation>> {
        let recommendations = self.recommendations.read().await;
        Ok(recommendations.get(id).cloned())
    }

    async fn list_by_user(&self, user_id: &str, unread_only: bool) -> AppResult<Vec<Recommendation>> {
        let recommendations = self.recommendations.read().await;
        let mut items: Vec<_> = recommendations
            .values()
            .filter(|r| r.user_id == user_id && (!unread_only || !r.is_read))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(items)
    }

    async fn mark_read(&self, id: &str) -> AppResult<bool> {
        let mut recommendations = self.recommendations.write().await;
        match recommendations.get_mut(id) {
            Some(recommendation) => {
                recommendation.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
