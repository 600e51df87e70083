use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, PoisonError},
};

use chrono::Utc;
use futures::{stream, StreamExt};
use validator::Validate;

use crate::{
    auth::require_owner,
    errors::{AppError, AppResult},
    models::{
        domain::{Answer, Attempt, AttemptCompletion, AttemptStatus, Exam, Question},
        dto::{
            request::{
                FinalAnswerInput, FlagQuestionRequest, RecordAnswerRequest, StartAttemptRequest,
                SubmitAttemptRequest,
            },
            response::{
                round_score, AnswerVerdict, AttemptResults, QuestionResult, SubjectRollup,
                SubmissionResult,
            },
        },
    },
    repositories::{AnswerRepository, AttemptRepository},
    services::{
        exam_service::ExamService,
        grading_service::{score_attempt, AttemptScore, GradingEngine},
        performance_service::PerformanceRefresher,
        question_bank_service::QuestionBankService,
    },
};

#[derive(Default)]
struct AttemptActivity {
    recording: usize,
    submitting: bool,
}

#[derive(Clone, Copy)]
enum ActivityKind {
    Recording,
    Submitting,
}

/// Releases the attempt's activity slot when the operation ends, whichever
/// way it ends.
struct ActivityGuard<'a> {
    active: &'a Mutex<HashMap<String, AttemptActivity>>,
    attempt_id: String,
    kind: ActivityKind,
}

impl Drop for ActivityGuard<'_> {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(activity) = active.get_mut(&self.attempt_id) {
            match self.kind {
                ActivityKind::Recording => activity.recording = activity.recording.saturating_sub(1),
                ActivityKind::Submitting => activity.submitting = false,
            }
            if activity.recording == 0 && !activity.submitting {
                active.remove(&self.attempt_id);
            }
        }
    }
}

struct GradingItem {
    question: Question,
    answer: Answer,
    subject_name: String,
}

/// Questions of an exam in order, with everything needed to grade them.
struct ExamContext {
    exam: Exam,
    questions: Vec<Question>,
    subject_names: HashMap<String, String>,
}

impl ExamContext {
    fn question_ids(&self) -> Vec<String> {
        self.questions.iter().map(|q| q.id.clone()).collect()
    }

    fn subject_name(&self, subject_id: &str) -> String {
        self.subject_names
            .get(subject_id)
            .cloned()
            .unwrap_or_else(|| subject_id.to_string())
    }

    fn subject_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.questions
            .iter()
            .filter(|q| seen.insert(q.subject_id.clone()))
            .map(|q| q.subject_id.clone())
            .collect()
    }
}

pub struct AttemptService {
    attempts: Arc<dyn AttemptRepository>,
    answers: Arc<dyn AnswerRepository>,
    exam_service: Arc<ExamService>,
    question_bank: Arc<QuestionBankService>,
    grading: Arc<GradingEngine>,
    refresher: PerformanceRefresher,
    essay_grading_concurrency: usize,
    active: Mutex<HashMap<String, AttemptActivity>>,
}

impl AttemptService {
    pub fn new(
        attempts: Arc<dyn AttemptRepository>,
        answers: Arc<dyn AnswerRepository>,
        exam_service: Arc<ExamService>,
        question_bank: Arc<QuestionBankService>,
        grading: Arc<GradingEngine>,
        refresher: PerformanceRefresher,
        essay_grading_concurrency: usize,
    ) -> Self {
        Self {
            attempts,
            answers,
            exam_service,
            question_bank,
            grading,
            refresher,
            essay_grading_concurrency: essay_grading_concurrency.max(1),
            active: Mutex::new(HashMap::new()),
        }
    }

    pub async fn start_attempt(&self, caller_id: &str, request: StartAttemptRequest) -> AppResult<Attempt> {
        request.validate()?;
        let exam = self.exam_service.get_exam(caller_id, &request.exam_id).await?;

        if !exam.is_available_for_attempts() {
            return Err(AppError::ValidationError(format!(
                "Exam '{}' has no questions",
                exam.id
            )));
        }

        let attempt = self.attempts.create(Attempt::start(caller_id, &exam.id)).await?;
        log::info!("User {} started attempt {} on exam {}", caller_id, attempt.id, exam.id);
        Ok(attempt)
    }

    pub async fn get_attempt(&self, caller_id: &str, attempt_id: &str) -> AppResult<Attempt> {
        let attempt = self
            .attempts
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attempt with id '{}' not found", attempt_id)))?;
        require_owner(caller_id, &attempt.user_id)?;
        Ok(attempt)
    }

    pub async fn list_attempts(&self, caller_id: &str) -> AppResult<Vec<Attempt>> {
        self.attempts.list_by_user(caller_id).await
    }

    /// Upserts the answer for (attempt, question). No grading happens here.
    /// Rejected while a submission of the same attempt is running.
    pub async fn record_answer(
        &self,
        caller_id: &str,
        attempt_id: &str,
        request: RecordAnswerRequest,
    ) -> AppResult<Answer> {
        request.validate()?;
        let mut answer = self.editable_answer(caller_id, attempt_id, &request.question_id).await?;
        let _guard = self.begin_recording(&answer.attempt_id)?;
        ensure_in_progress(&self.get_attempt(caller_id, attempt_id).await?)?;

        if let Some(current) = self.answers.find(&answer.attempt_id, &answer.question_id).await? {
            answer = current;
        }
        answer.record(request.user_answer, request.time_spent.unwrap_or(0));

        self.answers.upsert(answer).await
    }

    /// Marks or clears the review flag on a question without touching the
    /// answer text or its time.
    pub async fn flag_question(
        &self,
        caller_id: &str,
        attempt_id: &str,
        request: FlagQuestionRequest,
    ) -> AppResult<Answer> {
        request.validate()?;
        let mut answer = self.editable_answer(caller_id, attempt_id, &request.question_id).await?;
        let _guard = self.begin_recording(&answer.attempt_id)?;
        ensure_in_progress(&self.get_attempt(caller_id, attempt_id).await?)?;

        if let Some(current) = self.answers.find(&answer.attempt_id, &answer.question_id).await? {
            answer = current;
        }
        answer.set_flagged(request.flagged);

        self.answers.upsert(answer).await
    }

    /// Checks that the caller may edit `question_id` on the attempt and
    /// returns a blank answer row for it.
    async fn editable_answer(&self, caller_id: &str, attempt_id: &str, question_id: &str) -> AppResult<Answer> {
        let attempt = self.get_attempt(caller_id, attempt_id).await?;
        ensure_in_progress(&attempt)?;

        let exam = self.exam_service.find_exam(&attempt.exam_id).await?;
        if !exam.questions.iter().any(|q| q.question_id == question_id) {
            return Err(AppError::NotFound(format!(
                "Question '{}' is not part of exam '{}'",
                question_id, exam.id
            )));
        }

        Ok(Answer::new(&attempt.id, question_id))
    }

    pub async fn submit(
        &self,
        caller_id: &str,
        attempt_id: &str,
        request: SubmitAttemptRequest,
    ) -> AppResult<SubmissionResult> {
        request.validate()?;
        let attempt = self.get_attempt(caller_id, attempt_id).await?;
        ensure_in_progress(&attempt)?;

        let _guard = self.begin_submission(&attempt.id)?;
        let attempt = self.get_attempt(caller_id, attempt_id).await?;
        ensure_in_progress(&attempt)?;
        self.finalize(attempt, request.answers, request.total_time_spent).await
    }

    pub async fn abandon(&self, caller_id: &str, attempt_id: &str) -> AppResult<Attempt> {
        let attempt = self.get_attempt(caller_id, attempt_id).await?;
        ensure_in_progress(&attempt)?;

        let _guard = self.begin_submission(&attempt.id)?;
        if !self.attempts.abandon_if_in_progress(&attempt.id, Utc::now()).await? {
            return Err(AppError::Conflict(format!(
                "Attempt '{}' is no longer in progress",
                attempt.id
            )));
        }

        log::info!("User {} abandoned attempt {}", caller_id, attempt.id);
        self.get_attempt(caller_id, attempt_id).await
    }

    /// Auto-submits an attempt whose time limit has run out.
    pub async fn expire(&self, caller_id: &str, attempt_id: &str) -> AppResult<SubmissionResult> {
        let attempt = self.get_attempt(caller_id, attempt_id).await?;
        ensure_in_progress(&attempt)?;

        let exam = self.exam_service.find_exam(&attempt.exam_id).await?;
        let limit = exam.time_limit_seconds().ok_or_else(|| {
            AppError::Conflict(format!("Exam '{}' has no time limit", exam.id))
        })?;
        let elapsed = attempt.elapsed_seconds(Utc::now());
        if elapsed < limit {
            return Err(AppError::Conflict(format!(
                "Attempt '{}' still has {} seconds left",
                attempt.id,
                limit - elapsed
            )));
        }

        let _guard = self.begin_submission(&attempt.id)?;
        let attempt = self.get_attempt(caller_id, attempt_id).await?;
        ensure_in_progress(&attempt)?;
        self.finalize(attempt, Vec::new(), Some(limit)).await
    }

    /// Submits every in-progress attempt past its exam's time limit. Returns
    /// how many were finalized; individual failures are logged and skipped.
    pub async fn expire_overdue(&self) -> AppResult<usize> {
        let now = Utc::now();
        let mut expired = 0;

        for attempt in self.attempts.list_in_progress().await? {
            let exam = match self.exam_service.find_exam(&attempt.exam_id).await {
                Ok(exam) => exam,
                Err(e) => {
                    log::warn!("Skipping expiry of attempt {}: {}", attempt.id, e);
                    continue;
                }
            };

            let limit = match exam.time_limit_seconds() {
                Some(limit) if attempt.elapsed_seconds(now) >= limit => limit,
                _ => continue,
            };

            let _guard = match self.begin_submission(&attempt.id) {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let attempt = match self.attempts.find_by_id(&attempt.id).await {
                Ok(Some(current)) if current.status == AttemptStatus::InProgress => current,
                Ok(_) => continue,
                Err(e) => {
                    log::warn!("Skipping expiry of attempt {}: {}", attempt.id, e);
                    continue;
                }
            };

            let attempt_id = attempt.id.clone();
            match self.finalize(attempt, Vec::new(), Some(limit)).await {
                Ok(result) => {
                    log::info!(
                        "Expired attempt {} with score {}",
                        attempt_id,
                        result.score
                    );
                    expired += 1;
                }
                Err(e) => log::warn!("Failed to expire attempt {}: {}", attempt_id, e),
            }
        }

        Ok(expired)
    }

    /// Retries essay grading for pending answers of a completed attempt and
    /// recomputes the score from every stored answer.
    pub async fn regrade(&self, caller_id: &str, attempt_id: &str) -> AppResult<SubmissionResult> {
        let attempt = self.get_attempt(caller_id, attempt_id).await?;
        if attempt.status != AttemptStatus::Completed {
            return Err(AppError::Conflict(format!(
                "Only completed attempts can be regraded; attempt '{}' is {}",
                attempt.id, attempt.status
            )));
        }

        let context = self.load_exam_context(&attempt.exam_id).await?;
        let stored = self.answers_by_question(&attempt.id).await?;

        let items: Vec<GradingItem> = context
            .questions
            .iter()
            .filter_map(|q| {
                stored
                    .get(&q.id)
                    .filter(|a| !a.is_graded())
                    .map(|a| GradingItem {
                        question: q.clone(),
                        answer: a.clone(),
                        subject_name: context.subject_name(&q.subject_id),
                    })
            })
            .collect();

        if items.is_empty() {
            return Ok(submission_result(
                &attempt.id,
                &self.score_from_storage(&attempt.id, &context).await?,
                context.questions.len(),
            ));
        }

        let regraded = self.grade_items(items).await;
        let touched: HashSet<String> = regraded
            .iter()
            .filter(|a| a.is_graded())
            .filter_map(|a| {
                context
                    .questions
                    .iter()
                    .find(|q| q.id == a.question_id)
                    .map(|q| q.subject_id.clone())
            })
            .collect();
        for answer in regraded {
            self.answers.upsert(answer).await?;
        }

        let score = self.score_from_storage(&attempt.id, &context).await?;
        let applied = self
            .attempts
            .update_score_if_completed(&attempt.id, score.score, score.correct_count, score.incorrect_count)
            .await?;
        if !applied {
            return Err(AppError::Conflict(format!(
                "Attempt '{}' changed while regrading",
                attempt.id
            )));
        }

        log::info!(
            "Regraded attempt {}: score {:.2}, {} still pending",
            attempt.id,
            score.score,
            score.pending_count
        );
        if !touched.is_empty() {
            self.refresher
                .trigger(attempt.user_id.clone(), touched.into_iter().collect());
        }

        Ok(submission_result(&attempt.id, &score, context.questions.len()))
    }

    pub async fn get_results(&self, caller_id: &str, attempt_id: &str) -> AppResult<AttemptResults> {
        let attempt = self.get_attempt(caller_id, attempt_id).await?;
        let context = self.load_exam_context(&attempt.exam_id).await?;
        let stored = self.answers_by_question(&attempt.id).await?;

        let questions: Vec<QuestionResult> = context
            .questions
            .iter()
            .enumerate()
            .map(|(order, q)| {
                let answer = stored.get(&q.id);
                let is_correct = answer.and_then(|a| a.is_correct);
                QuestionResult {
                    question_id: q.id.clone(),
                    order: order as i32,
                    subject_id: q.subject_id.clone(),
                    question_type: q.question_type,
                    content: q.content.clone(),
                    user_answer: answer.and_then(|a| a.user_answer.clone()),
                    correct_answer: q.correct_answer.clone(),
                    explanation: q.explanation.clone(),
                    verdict: AnswerVerdict::from_is_correct(is_correct),
                    is_correct,
                    ai_score: answer.and_then(|a| a.ai_score),
                    ai_evaluation: answer.and_then(|a| a.ai_evaluation.clone()),
                    time_spent: answer.map(|a| a.time_spent).unwrap_or(0),
                    flagged: answer.is_some_and(|a| a.flagged),
                }
            })
            .collect();

        let subjects = context
            .subject_ids()
            .into_iter()
            .map(|subject_id| {
                let verdicts = questions
                    .iter()
                    .filter(|r| r.subject_id == subject_id)
                    .map(|r| r.is_correct);
                let score = score_attempt(verdicts);
                SubjectRollup {
                    subject_name: context.subject_name(&subject_id),
                    subject_id,
                    correct: score.correct_count,
                    incorrect: score.incorrect_count,
                    pending: score.pending_count,
                    accuracy: round_score(score.score),
                }
            })
            .collect();

        let pending_count = questions
            .iter()
            .filter(|r| r.verdict == AnswerVerdict::Pending)
            .count() as i32;

        Ok(AttemptResults {
            score: round_score(attempt.score.unwrap_or(0.0)),
            exam_title: context.exam.title.clone(),
            total_questions: context.questions.len() as i32,
            pending_count,
            questions,
            subjects,
            attempt,
        })
    }

    /// Claims the attempt for a state transition. Fails while another
    /// transition or an answer write on the same attempt is running.
    fn begin_submission(&self, attempt_id: &str) -> AppResult<ActivityGuard<'_>> {
        self.claim(attempt_id, ActivityKind::Submitting)
    }

    /// Claims the attempt for an answer write. Several writes may overlap;
    /// none may start once a submission holds the attempt.
    fn begin_recording(&self, attempt_id: &str) -> AppResult<ActivityGuard<'_>> {
        self.claim(attempt_id, ActivityKind::Recording)
    }

    fn claim(&self, attempt_id: &str, kind: ActivityKind) -> AppResult<ActivityGuard<'_>> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        let activity = active.entry(attempt_id.to_string()).or_default();

        if activity.submitting {
            return Err(AppError::Conflict(format!(
                "Attempt '{}' is already being submitted",
                attempt_id
            )));
        }
        match kind {
            ActivityKind::Recording => activity.recording += 1,
            ActivityKind::Submitting if activity.recording > 0 => {
                return Err(AppError::Conflict(format!(
                    "Attempt '{}' has an answer being saved; retry the submission",
                    attempt_id
                )));
            }
            ActivityKind::Submitting => activity.submitting = true,
        }

        Ok(ActivityGuard {
            active: &self.active,
            attempt_id: attempt_id.to_string(),
            kind,
        })
    }

    /// Grades and persists every answer, then flips the attempt to completed.
    /// Answers graded by an earlier, interrupted run are not graded again.
    async fn finalize(
        &self,
        attempt: Attempt,
        final_answers: Vec<FinalAnswerInput>,
        total_time_spent: Option<i64>,
    ) -> AppResult<SubmissionResult> {
        let context = self.load_exam_context(&attempt.exam_id).await?;
        let exam_question_ids: HashSet<&str> =
            context.questions.iter().map(|q| q.id.as_str()).collect();

        let mut finals: HashMap<String, FinalAnswerInput> = HashMap::new();
        for input in final_answers {
            if !exam_question_ids.contains(input.question_id.as_str()) {
                return Err(AppError::ValidationError(format!(
                    "Question '{}' is not part of exam '{}'",
                    input.question_id, context.exam.id
                )));
            }
            finals.insert(input.question_id.clone(), input);
        }

        let mut stored = self.answers_by_question(&attempt.id).await?;
        let mut to_grade = Vec::new();
        for question in &context.questions {
            let mut answer = stored
                .remove(&question.id)
                .unwrap_or_else(|| Answer::new(&attempt.id, &question.id));
            if answer.is_graded() {
                continue;
            }
            if answer.answer_text().is_none() {
                if let Some(input) = finals.remove(&question.id) {
                    answer.record(input.user_answer, input.time_spent.unwrap_or(0));
                }
            }
            to_grade.push(GradingItem {
                question: question.clone(),
                answer,
                subject_name: context.subject_name(&question.subject_id),
            });
        }

        for answer in self.grade_items(to_grade).await {
            self.answers.upsert(answer).await?;
        }

        let all_answers = self.answers.list_by_attempt(&attempt.id).await?;
        let score = score_for(&context.question_ids(), &all_answers);
        let time_spent = total_time_spent
            .unwrap_or_else(|| all_answers.iter().map(|a| a.time_spent).sum())
            .max(0);

        let completion = AttemptCompletion {
            completed_at: Utc::now(),
            score: score.score,
            correct_count: score.correct_count,
            incorrect_count: score.incorrect_count,
            time_spent,
        };
        if !self.attempts.complete_if_in_progress(&attempt.id, &completion).await? {
            return Err(AppError::Conflict(format!(
                "Attempt '{}' has already been finalized",
                attempt.id
            )));
        }

        log::info!(
            "Attempt {} completed: score {:.2} ({} correct, {} incorrect, {} pending)",
            attempt.id,
            score.score,
            score.correct_count,
            score.incorrect_count,
            score.pending_count
        );

        if let Err(e) = self.exam_service.mark_completed(&context.exam.id).await {
            log::warn!("Could not mark exam {} completed: {}", context.exam.id, e);
        }
        self.refresher
            .trigger(attempt.user_id.clone(), context.subject_ids());

        Ok(submission_result(&attempt.id, &score, context.questions.len()))
    }

    /// Objective answers are graded inline; essays go to the evaluator with
    /// bounded concurrency.
    async fn grade_items(&self, items: Vec<GradingItem>) -> Vec<Answer> {
        let (essays, objectives): (Vec<GradingItem>, Vec<GradingItem>) =
            items.into_iter().partition(|item| item.question.is_essay());

        let mut graded = Vec::with_capacity(essays.len() + objectives.len());
        for item in objectives {
            graded.push(
                self.grading
                    .grade_answer(&item.question, item.answer, &item.subject_name)
                    .await,
            );
        }

        let grading = &self.grading;
        let essays: Vec<Answer> = stream::iter(essays)
            .map(|item| async move {
                grading
                    .grade_answer(&item.question, item.answer, &item.subject_name)
                    .await
            })
            .buffer_unordered(self.essay_grading_concurrency)
            .collect()
            .await;

        graded.extend(essays);
        graded
    }

    async fn load_exam_context(&self, exam_id: &str) -> AppResult<ExamContext> {
        let exam = self.exam_service.find_exam(exam_id).await?;
        let questions = self
            .question_bank
            .get_questions(&exam.ordered_question_ids())
            .await?;

        let subject_ids: Vec<String> = questions
            .iter()
            .map(|q| q.subject_id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let subject_names = self.question_bank.subject_names(&subject_ids).await?;

        Ok(ExamContext {
            exam,
            questions,
            subject_names,
        })
    }

    async fn answers_by_question(&self, attempt_id: &str) -> AppResult<HashMap<String, Answer>> {
        Ok(self
            .answers
            .list_by_attempt(attempt_id)
            .await?
            .into_iter()
            .map(|a| (a.question_id.clone(), a))
            .collect())
    }

    async fn score_from_storage(&self, attempt_id: &str, context: &ExamContext) -> AppResult<AttemptScore> {
        let answers = self.answers.list_by_attempt(attempt_id).await?;
        Ok(score_for(&context.question_ids(), &answers))
    }
}

fn ensure_in_progress(attempt: &Attempt) -> AppResult<()> {
    match attempt.status {
        AttemptStatus::InProgress => Ok(()),
        AttemptStatus::Completed => Err(AppError::Conflict(format!(
            "Attempt '{}' has already been finalized",
            attempt.id
        ))),
        AttemptStatus::Abandoned => Err(AppError::Conflict(format!(
            "Attempt '{}' was abandoned",
            attempt.id
        ))),
    }
}

/// Scores only answers belonging to the exam's current questions, each
/// question once.
fn score_for(question_ids: &[String], answers: &[Answer]) -> AttemptScore {
    let by_question: HashMap<&str, &Answer> = answers
        .iter()
        .map(|a| (a.question_id.as_str(), a))
        .collect();

    let mut seen = HashSet::new();
    score_attempt(
        question_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .map(|id| by_question.get(id.as_str()).and_then(|a| a.is_correct)),
    )
}

fn submission_result(attempt_id: &str, score: &AttemptScore, total_questions: usize) -> SubmissionResult {
    SubmissionResult {
        attempt_id: attempt_id.to_string(),
        status: AttemptStatus::Completed,
        score: round_score(score.score),
        correct_count: score.correct_count,
        incorrect_count: score.incorrect_count,
        pending_count: score.pending_count,
        total_questions: total_questions as i32,
    }
}
