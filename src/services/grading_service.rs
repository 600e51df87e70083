use std::sync::Arc;

use chrono::Utc;

use crate::{
    models::domain::{Answer, Question},
    services::text_generation::TextGenerator,
};

/// Case-insensitive, trimmed comparison against the stored letter. A missing
/// or blank answer is always wrong.
pub fn grade_objective(question: &Question, raw_answer: Option<&str>) -> bool {
    let answer = match raw_answer.map(str::trim).filter(|a| !a.is_empty()) {
        Some(answer) => answer,
        None => return false,
    };

    question
        .correct_answer
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .is_some_and(|correct| correct.eq_ignore_ascii_case(answer))
}

#[derive(Debug, Clone, PartialEq)]
pub enum EssayGrade {
    Graded {
        is_correct: bool,
        ai_score: f64,
        ai_evaluation: String,
    },
    /// The evaluator failed or answered out of contract; the answer stays
    /// out of the score until it is regraded.
    Pending { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttemptScore {
    pub score: f64,
    pub correct_count: i32,
    pub incorrect_count: i32,
    pub pending_count: i32,
}

/// `None` verdicts are pending and excluded from the denominator.
pub fn score_attempt<I>(verdicts: I) -> AttemptScore
where
    I: IntoIterator<Item = Option<bool>>,
{
    let mut correct_count = 0;
    let mut incorrect_count = 0;
    let mut pending_count = 0;

    for verdict in verdicts {
        match verdict {
            Some(true) => correct_count += 1,
            Some(false) => incorrect_count += 1,
            None => pending_count += 1,
        }
    }

    let graded = correct_count + incorrect_count;
    let score = if graded == 0 {
        0.0
    } else {
        100.0 * f64::from(correct_count) / f64::from(graded)
    };

    AttemptScore {
        score,
        correct_count,
        incorrect_count,
        pending_count,
    }
}

pub struct GradingEngine {
    text_generator: Arc<dyn TextGenerator>,
    essay_pass_threshold: f64,
}

impl GradingEngine {
    pub fn new(text_generator: Arc<dyn TextGenerator>, essay_pass_threshold: f64) -> Self {
        Self {
            text_generator,
            essay_pass_threshold,
        }
    }

    pub fn essay_pass_threshold(&self) -> f64 {
        self.essay_pass_threshold
    }

    pub async fn grade_essay(
        &self,
        question: &Question,
        raw_answer: Option<&str>,
        subject_name: &str,
    ) -> EssayGrade {
        let answer = match raw_answer.map(str::trim).filter(|a| !a.is_empty()) {
            Some(answer) => answer,
            None => {
                return EssayGrade::Graded {
                    is_correct: false,
                    ai_score: 0.0,
                    ai_evaluation: "No answer was given.".to_string(),
                }
            }
        };

        match self
            .text_generator
            .evaluate_essay(&question.content, answer, subject_name)
            .await
        {
            Ok(evaluation) if evaluation.score.is_finite() && (0.0..=10.0).contains(&evaluation.score) => {
                EssayGrade::Graded {
                    is_correct: evaluation.score >= self.essay_pass_threshold,
                    ai_score: evaluation.score,
                    ai_evaluation: evaluation.evaluation,
                }
            }
            Ok(evaluation) => {
                log::warn!(
                    "Essay evaluation for question {} returned out-of-range score {}",
                    question.id,
                    evaluation.score
                );
                EssayGrade::Pending {
                    reason: format!("Evaluator returned out-of-range score {}", evaluation.score),
                }
            }
            Err(e) => {
                log::warn!("Essay evaluation for question {} failed: {}", question.id, e);
                EssayGrade::Pending {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Grades one answer in place and stamps `graded_at`; a pending essay
    /// keeps `graded_at` empty and records why.
    pub async fn grade_answer(&self, question: &Question, mut answer: Answer, subject_name: &str) -> Answer {
        if question.is_essay() {
            match self
                .grade_essay(question, answer.answer_text(), subject_name)
                .await
            {
                EssayGrade::Graded {
                    is_correct,
                    ai_score,
                    ai_evaluation,
                } => {
                    answer.is_correct = Some(is_correct);
                    answer.ai_score = Some(ai_score);
                    answer.ai_evaluation = Some(ai_evaluation);
                    answer.grading_error = None;
                    answer.graded_at = Some(Utc::now());
                }
                EssayGrade::Pending { reason } => {
                    answer.is_correct = None;
                    answer.ai_score = None;
                    answer.ai_evaluation = None;
                    answer.grading_error = Some(reason);
                    answer.graded_at = None;
                }
            }
        } else {
            answer.is_correct = Some(grade_objective(question, answer.answer_text()));
            answer.grading_error = None;
            answer.graded_at = Some(Utc::now());
        }

        answer.modified_at = Some(Utc::now());
        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ESSAY_PASS_THRESHOLD,
        errors::AppError,
        models::domain::{Difficulty, QuestionOption},
        services::text_generation::{EssayEvaluation, MockTextGenerator},
    };

    fn objective(correct: &str) -> Question {
        let options = ["A", "B", "C", "D"]
            .iter()
            .map(|l| QuestionOption {
                letter: l.to_string(),
                text: format!("Option {}", l),
            })
            .collect();
        Question::new_objective("subj-1", "Pick one", Difficulty::Easy, options, correct)
    }

    fn essay() -> Question {
        Question::new_essay("subj-1", "Explain photosynthesis", Difficulty::Medium, None)
    }

    fn engine_returning(score: f64) -> GradingEngine {
        let mut generator = MockTextGenerator::new();
        generator.expect_evaluate_essay().returning(move |_, _, _| {
            Ok(EssayEvaluation {
                score,
                evaluation: "Reasonable".to_string(),
            })
        });
        GradingEngine::new(Arc::new(generator), ESSAY_PASS_THRESHOLD)
    }

    #[test]
    fn objective_grading_is_case_insensitive_and_trimmed() {
        let question = objective("B");
        assert!(grade_objective(&question, Some("b")));
        assert!(grade_objective(&question, Some("  B ")));
        assert!(!grade_objective(&question, Some("c")));
    }

    #[test]
    fn empty_or_missing_objective_answer_is_wrong() {
        let question = objective("B");
        assert!(!grade_objective(&question, Some("")));
        assert!(!grade_objective(&question, Some("   ")));
        assert!(!grade_objective(&question, None));
    }

    #[test]
    fn question_without_correct_answer_never_matches() {
        let mut question = objective("B");
        question.correct_answer = None;
        assert!(!grade_objective(&question, Some("B")));
    }

    #[test]
    fn score_seven_of_ten_is_seventy() {
        let verdicts = std::iter::repeat(Some(true))
            .take(7)
            .chain(std::iter::repeat(Some(false)).take(3));
        let score = score_attempt(verdicts);
        assert_eq!(score.correct_count, 7);
        assert_eq!(score.incorrect_count, 3);
        assert!((score.score - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_attempt_scores_zero() {
        let score = score_attempt(Vec::<Option<bool>>::new());
        assert_eq!(score.score, 0.0);
        assert_eq!(score.correct_count, 0);
        assert_eq!(score.incorrect_count, 0);
    }

    #[test]
    fn pending_answers_are_excluded_from_denominator() {
        let score = score_attempt(vec![Some(true), Some(true), Some(true), Some(true), Some(false), None]);
        assert_eq!(score.pending_count, 1);
        assert!((score.score - 80.0).abs() < 1e-9);

        let score = score_attempt(vec![Some(true), Some(true), Some(true), Some(true), None]);
        assert_eq!(score.score, 100.0);
        assert_eq!(score.pending_count, 1);
    }

    #[tokio::test]
    async fn essay_at_threshold_passes() {
        let engine = engine_returning(6.0);
        let grade = engine.grade_essay(&essay(), Some("Plants use light"), "Biology").await;
        assert!(matches!(grade, EssayGrade::Graded { is_correct: true, .. }));
    }

    #[tokio::test]
    async fn essay_just_below_threshold_fails() {
        let engine = engine_returning(5.9);
        let grade = engine.grade_essay(&essay(), Some("Plants use light"), "Biology").await;
        assert!(matches!(grade, EssayGrade::Graded { is_correct: false, .. }));
    }

    #[tokio::test]
    async fn stricter_threshold_of_seven_is_configurable() {
        let mut generator = MockTextGenerator::new();
        generator.expect_evaluate_essay().returning(|_, _, _| {
            Ok(EssayEvaluation {
                score: 6.5,
                evaluation: "Almost".to_string(),
            })
        });
        let engine = GradingEngine::new(Arc::new(generator), 7.0);

        let grade = engine.grade_essay(&essay(), Some("Plants use light"), "Biology").await;
        assert!(matches!(grade, EssayGrade::Graded { is_correct: false, .. }));
        assert_eq!(engine.essay_pass_threshold(), 7.0);
    }

    #[tokio::test]
    async fn upstream_failure_leaves_essay_pending() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_evaluate_essay()
            .returning(|_, _, _| Err(AppError::UpstreamUnavailable("timeout".to_string())));
        let engine = GradingEngine::new(Arc::new(generator), ESSAY_PASS_THRESHOLD);

        let answer = Answer {
            user_answer: Some("Chlorophyll absorbs light".to_string()),
            ..Answer::new("attempt-1", "q-essay")
        };
        let graded = engine.grade_answer(&essay(), answer, "Biology").await;

        assert_eq!(graded.is_correct, None);
        assert!(graded.is_pending());
        assert!(graded.graded_at.is_none());
    }

    #[tokio::test]
    async fn out_of_range_score_is_pending() {
        let engine = engine_returning(42.0);
        let grade = engine.grade_essay(&essay(), Some("Something"), "Biology").await;
        assert!(matches!(grade, EssayGrade::Pending { .. }));
    }

    #[tokio::test]
    async fn blank_essay_is_wrong_without_calling_evaluator() {
        let mut generator = MockTextGenerator::new();
        generator.expect_evaluate_essay().never();
        let engine = GradingEngine::new(Arc::new(generator), ESSAY_PASS_THRESHOLD);

        let graded = engine
            .grade_answer(&essay(), Answer::new("attempt-1", "q-essay"), "Biology")
            .await;
        assert_eq!(graded.is_correct, Some(false));
        assert_eq!(graded.ai_score, Some(0.0));
        assert!(graded.is_graded());
    }

    #[tokio::test]
    async fn objective_answer_is_graded_without_evaluator() {
        let mut generator = MockTextGenerator::new();
        generator.expect_evaluate_essay().never();
        let engine = GradingEngine::new(Arc::new(generator), ESSAY_PASS_THRESHOLD);

        let answer = Answer {
            user_answer: Some("c".to_string()),
            ..Answer::new("attempt-1", "q-1")
        };
        let graded = engine.grade_answer(&objective("C"), answer, "Biology").await;
        assert_eq!(graded.is_correct, Some(true));
        assert!(graded.is_graded());
    }
}
