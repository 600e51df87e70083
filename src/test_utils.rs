#[cfg(test)]
pub mod fixtures {
    use crate::models::domain::{Difficulty, Exam, Question, QuestionOption, Subject};

    pub fn subject(id: &str, name: &str) -> Subject {
        Subject::new(id, name)
    }

    /// Four-option objective question with the given correct letter.
    pub fn objective_question(subject_id: &str, correct: &str) -> Question {
        let options = ["A", "B", "C", "D"]
            .iter()
            .map(|letter| QuestionOption {
                letter: letter.to_string(),
                text: format!("Option {}", letter),
            })
            .collect();

        Question::new_objective(
            subject_id,
            "Which option is correct?",
            Difficulty::Medium,
            options,
            correct,
        )
    }

    pub fn essay_question(subject_id: &str) -> Question {
        Question::new_essay(
            subject_id,
            "Explain the process in your own words.",
            Difficulty::Medium,
            Some("A complete answer names each stage.".to_string()),
        )
    }

    /// Ready exam owned by `owner_id` containing `questions` in order.
    pub fn ready_exam(owner_id: &str, questions: &[Question], time_limit_minutes: Option<i32>) -> Exam {
        let mut exam = Exam::new_draft(owner_id, "Practice exam", None, time_limit_minutes);
        let ids: Vec<String> = questions.iter().map(|q| q.id.clone()).collect();
        exam.attach_questions(&ids);
        exam
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use crate::models::domain::ExamStatus;

    #[test]
    fn test_fixtures_objective_question_is_well_formed() {
        let question = objective_question("subj-1", "c");
        assert_eq!(question.correct_answer.as_deref(), Some("C"));
        assert!(question.validate_shape().is_ok());
    }

    #[test]
    fn test_fixtures_essay_question_is_well_formed() {
        let question = essay_question("subj-1");
        assert!(question.is_essay());
        assert!(question.validate_shape().is_ok());
    }

    #[test]
    fn test_fixtures_ready_exam() {
        let questions = vec![objective_question("subj-1", "A"), essay_question("subj-2")];
        let exam = ready_exam("user-1", &questions, Some(30));
        assert_eq!(exam.status, ExamStatus::Ready);
        assert_eq!(exam.question_count, 2);
        assert_eq!(exam.ordered_question_ids()[1], questions[1].id);
    }
}
