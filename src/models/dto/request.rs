use async_graphql::InputObject;
use serde::Deserialize;
use validator::Validate;

use crate::models::domain::Difficulty;

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct CreateExamRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(range(min = 1, max = 600))]
    pub time_limit_minutes: Option<i32>,

    #[validate(length(min = 1, message = "questionIds cannot be empty"))]
    pub question_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct AttachQuestionsRequest {
    #[validate(length(min = 1, message = "questionIds cannot be empty"))]
    pub question_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct GenerateExamRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1))]
    pub subject_id: String,

    /// Study material text the questions are generated from.
    #[validate(length(min = 20, max = 50000))]
    pub content: String,

    #[validate(range(min = 1, max = 50))]
    pub question_count: i32,

    pub difficulty: Difficulty,

    #[validate(range(min = 1, max = 600))]
    pub time_limit_minutes: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct StartAttemptRequest {
    #[validate(length(min = 1))]
    pub exam_id: String,
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct RecordAnswerRequest {
    #[validate(length(min = 1))]
    pub question_id: String,

    #[validate(length(max = 20000))]
    pub user_answer: Option<String>,

    /// Seconds spent on this visit; added to what is already stored.
    #[validate(range(min = 0, max = 86400))]
    pub time_spent: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct FlagQuestionRequest {
    #[validate(length(min = 1))]
    pub question_id: String,

    pub flagged: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct FinalAnswerInput {
    #[validate(length(min = 1))]
    pub question_id: String,

    #[validate(length(max = 20000))]
    pub user_answer: Option<String>,

    #[validate(range(min = 0, max = 86400))]
    pub time_spent: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, InputObject)]
pub struct SubmitAttemptRequest {
    #[serde(default)]
    #[validate(nested)]
    #[graphql(default)]
    pub answers: Vec<FinalAnswerInput>,

    #[validate(range(min = 0))]
    pub total_time_spent: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct GenerateRecommendationsRequest {
    #[validate(length(min = 1, max = 200))]
    pub target_exam: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendationQuery {
    pub unread_only: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn create_exam_requires_question_ids() {
        let request = CreateExamRequest {
            title: "Chemistry".to_string(),
            description: None,
            time_limit_minutes: Some(45),
            question_ids: vec![],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn create_exam_accepts_unlimited_time() {
        let request = CreateExamRequest {
            title: "Chemistry".to_string(),
            description: Some("Unit 3".to_string()),
            time_limit_minutes: None,
            question_ids: vec!["q-1".to_string()],
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn negative_time_spent_is_rejected() {
        let request = RecordAnswerRequest {
            question_id: "q-1".to_string(),
            user_answer: Some("A".to_string()),
            time_spent: Some(-5),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn flag_request_needs_a_question() {
        let request: FlagQuestionRequest =
            serde_json::from_str(r#"{"question_id": "", "flagged": true}"#).expect("should parse");
        assert!(request.validate().is_err());
    }

    #[test]
    fn submit_validates_nested_answers() {
        let request = SubmitAttemptRequest {
            answers: vec![FinalAnswerInput {
                question_id: String::new(),
                user_answer: None,
                time_spent: None,
            }],
            total_time_spent: Some(120),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn submit_body_defaults_to_no_answers() {
        let request: SubmitAttemptRequest =
            serde_json::from_str(r#"{"total_time_spent": 90}"#).expect("should parse");
        assert!(request.answers.is_empty());
        assert!(request.validate().is_ok());
    }
}
