use std::{collections::HashSet, sync::Arc};

use validator::Validate;

use crate::{
    auth::require_owner,
    errors::{AppError, AppResult},
    models::{
        domain::{Difficulty, Exam, ExamStatus, Question, QuestionType},
        dto::{
            request::{AttachQuestionsRequest, CreateExamRequest, GenerateExamRequest},
            response::ExamForTaking,
        },
    },
    repositories::ExamRepository,
    services::{
        question_bank_service::QuestionBankService,
        text_generation::{GeneratedQuestion, TextGenerator},
    },
};

pub struct ExamService {
    exams: Arc<dyn ExamRepository>,
    question_bank: Arc<QuestionBankService>,
    text_generator: Arc<dyn TextGenerator>,
}

impl ExamService {
    pub fn new(
        exams: Arc<dyn ExamRepository>,
        question_bank: Arc<QuestionBankService>,
        text_generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            exams,
            question_bank,
            text_generator,
        }
    }

    /// Builds a ready exam from existing bank questions.
    pub async fn create_exam(&self, owner_id: &str, request: CreateExamRequest) -> AppResult<Exam> {
        request.validate()?;
        ensure_unique(&request.question_ids)?;
        self.question_bank.get_questions(&request.question_ids).await?;

        let mut exam = Exam::new_draft(
            owner_id,
            &request.title,
            request.description,
            request.time_limit_minutes,
        );
        exam.attach_questions(&request.question_ids);

        let exam = self.exams.create(exam).await?;
        log::info!("User {} created exam {} with {} questions", owner_id, exam.id, exam.question_count);
        Ok(exam)
    }

    pub async fn create_draft(
        &self,
        owner_id: &str,
        title: &str,
        description: Option<String>,
        time_limit_minutes: Option<i32>,
    ) -> AppResult<Exam> {
        if title.trim().is_empty() {
            return Err(AppError::ValidationError("Exam title cannot be empty".to_string()));
        }
        self.exams
            .create(Exam::new_draft(owner_id, title, description, time_limit_minutes))
            .await
    }

    pub async fn attach_questions(
        &self,
        caller_id: &str,
        exam_id: &str,
        request: AttachQuestionsRequest,
    ) -> AppResult<Exam> {
        request.validate()?;
        let mut exam = self.get_exam(caller_id, exam_id).await?;

        if exam.status != ExamStatus::Draft {
            return Err(AppError::Conflict(format!(
                "Questions can only be attached to a draft exam; exam '{}' is {:?}",
                exam.id, exam.status
            )));
        }

        ensure_unique(&request.question_ids)?;
        self.question_bank.get_questions(&request.question_ids).await?;
        exam.attach_questions(&request.question_ids);
        self.exams.update(exam).await
    }

    /// Creates a draft, asks the model for questions and attaches them. If the
    /// model fails the draft is kept so the caller can retry or attach by hand.
    pub async fn generate_exam(&self, owner_id: &str, request: GenerateExamRequest) -> AppResult<Exam> {
        request.validate()?;
        let subject = self.question_bank.get_subject(&request.subject_id).await?;

        let mut exam = self
            .create_draft(owner_id, &request.title, None, request.time_limit_minutes)
            .await?;

        let generated = self
            .text_generator
            .generate_questions(
                &request.content,
                &subject.name,
                request.question_count as usize,
                request.difficulty,
            )
            .await
            .map_err(|e| {
                log::warn!("Question generation for exam {} failed: {}", exam.id, e);
                e
            })?;

        let questions: Vec<Question> = generated
            .into_iter()
            .take(request.question_count as usize)
            .map(|g| to_question(&subject.id, request.difficulty, g))
            .filter(|q| match q.validate_shape() {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("Discarding generated question for exam {}: {}", exam.id, e);
                    false
                }
            })
            .collect();

        if questions.is_empty() {
            return Err(AppError::UpstreamUnavailable(
                "Text generation produced no usable questions".to_string(),
            ));
        }

        let questions = self.question_bank.add_questions(questions).await?;
        let ids: Vec<String> = questions.iter().map(|q| q.id.clone()).collect();
        exam.attach_questions(&ids);
        self.exams.update(exam).await
    }

    pub async fn get_exam(&self, caller_id: &str, exam_id: &str) -> AppResult<Exam> {
        let exam = self.find_exam(exam_id).await?;
        require_owner(caller_id, &exam.owner_id)?;
        Ok(exam)
    }

    /// Lookup without an owner check, for callers that already authorized
    /// through an owned child entity.
    pub async fn find_exam(&self, exam_id: &str) -> AppResult<Exam> {
        self.exams
            .find_by_id(exam_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Exam with id '{}' not found", exam_id)))
    }

    pub async fn list_exams(&self, owner_id: &str) -> AppResult<Vec<Exam>> {
        self.exams.list_by_owner(owner_id).await
    }

    pub async fn exam_for_taking(&self, caller_id: &str, exam_id: &str) -> AppResult<ExamForTaking> {
        let exam = self.get_exam(caller_id, exam_id).await?;
        if !exam.is_available_for_attempts() {
            return Err(AppError::Conflict(format!(
                "Exam '{}' has no questions yet",
                exam.id
            )));
        }

        let questions = self
            .question_bank
            .get_questions(&exam.ordered_question_ids())
            .await?;
        Ok(ExamForTaking::from_exam(exam, questions))
    }

    pub async fn mark_completed(&self, exam_id: &str) -> AppResult<()> {
        let mut exam = self.find_exam(exam_id).await?;
        if exam.status == ExamStatus::Ready {
            exam.status = ExamStatus::Completed;
            exam.modified_at = Some(chrono::Utc::now());
            self.exams.update(exam).await?;
        }
        Ok(())
    }
}

fn ensure_unique(question_ids: &[String]) -> AppResult<()> {
    let mut seen = HashSet::new();
    match question_ids.iter().find(|id| !seen.insert(id.as_str())) {
        Some(id) => Err(AppError::ValidationError(format!(
            "Question '{}' is listed more than once",
            id
        ))),
        None => Ok(()),
    }
}

fn to_question(subject_id: &str, difficulty: Difficulty, generated: GeneratedQuestion) -> Question {
    let mut question = match generated.question_type {
        QuestionType::Objective => Question::new_objective(
            subject_id,
            &generated.content,
            difficulty,
            generated.options,
            generated.correct_answer.as_deref().unwrap_or_default(),
        ),
        QuestionType::Essay => Question::new_essay(subject_id, &generated.content, difficulty, None),
    };
    question.explanation = generated.explanation;
    question
}
