use async_graphql::{Enum, SimpleObject};
use serde::Serialize;

use crate::models::domain::{
    recommendation::priority_label, Attempt, AttemptStatus, Difficulty, Exam, Question,
    QuestionOption, QuestionType, Recommendation, RecommendationType, StrengthLevel,
    SubjectPerformance,
};

/// Scores are kept at full precision in storage and rounded only here.
pub fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct SubmissionResult {
    pub attempt_id: String,
    pub status: AttemptStatus,
    pub score: f64,
    pub correct_count: i32,
    pub incorrect_count: i32,
    pub pending_count: i32,
    pub total_questions: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum AnswerVerdict {
    Correct,
    Incorrect,
    Pending,
}

impl AnswerVerdict {
    pub fn from_is_correct(is_correct: Option<bool>) -> Self {
        match is_correct {
            Some(true) => AnswerVerdict::Correct,
            Some(false) => AnswerVerdict::Incorrect,
            None => AnswerVerdict::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct QuestionResult {
    pub question_id: String,
    pub order: i32,
    pub subject_id: String,
    pub question_type: QuestionType,
    pub content: String,
    pub user_answer: Option<String>,
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
    pub verdict: AnswerVerdict,
    pub is_correct: Option<bool>,
    pub ai_score: Option<f64>,
    pub ai_evaluation: Option<String>,
    pub time_spent: i64,
    pub flagged: bool,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct SubjectRollup {
    pub subject_id: String,
    pub subject_name: String,
    pub correct: i32,
    pub incorrect: i32,
    pub pending: i32,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct AttemptResults {
    pub attempt: Attempt,
    pub exam_title: String,
    pub score: f64,
    pub total_questions: i32,
    pub pending_count: i32,
    pub questions: Vec<QuestionResult>,
    pub subjects: Vec<SubjectRollup>,
}

/// Question as shown to a test taker: no correct answer, no explanation.
#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct QuestionForTaking {
    pub id: String,
    pub order: i32,
    pub subject_id: String,
    pub content: String,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub options: Vec<QuestionOption>,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct ExamForTaking {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub time_limit_minutes: Option<i32>,
    pub questions: Vec<QuestionForTaking>,
}

impl ExamForTaking {
    pub fn from_exam(exam: Exam, questions: Vec<Question>) -> Self {
        let questions = questions
            .into_iter()
            .enumerate()
            .map(|(order, q)| QuestionForTaking {
                id: q.id,
                order: order as i32,
                subject_id: q.subject_id,
                content: q.content,
                question_type: q.question_type,
                difficulty: q.difficulty,
                options: q.options,
            })
            .collect();

        ExamForTaking {
            id: exam.id,
            title: exam.title,
            description: exam.description,
            time_limit_minutes: exam.time_limit_minutes,
            questions,
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct PerformanceDto {
    pub subject_id: String,
    pub subject_name: String,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub average_score: f64,
    pub strength_level: StrengthLevel,
    pub last_studied: Option<chrono::DateTime<chrono::Utc>>,
}

impl PerformanceDto {
    pub fn new(performance: SubjectPerformance, subject_name: String) -> Self {
        PerformanceDto {
            subject_id: performance.subject_id,
            subject_name,
            total_questions: performance.total_questions,
            correct_answers: performance.correct_answers,
            average_score: round_score(performance.average_score),
            strength_level: performance.strength_level,
            last_studied: performance.last_studied,
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct RecommendationDto {
    pub id: String,
    pub recommendation_type: RecommendationType,
    pub title: String,
    pub description: String,
    pub priority: i32,
    pub priority_label: String,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Recommendation> for RecommendationDto {
    fn from(recommendation: Recommendation) -> Self {
        RecommendationDto {
            priority_label: priority_label(recommendation.priority).to_string(),
            id: recommendation.id,
            recommendation_type: recommendation.recommendation_type,
            title: recommendation.title,
            description: recommendation.description,
            priority: recommendation.priority,
            is_read: recommendation.is_read,
            created_at: recommendation.created_at,
        }
    }
}
