use std::{collections::HashMap, sync::Arc};

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Question, Subject},
    repositories::{QuestionRepository, SubjectRepository},
};

/// Read access to questions and subjects, plus the insert path used when
/// questions are generated or seeded.
pub struct QuestionBankService {
    questions: Arc<dyn QuestionRepository>,
    subjects: Arc<dyn SubjectRepository>,
}

impl QuestionBankService {
    pub fn new(questions: Arc<dyn QuestionRepository>, subjects: Arc<dyn SubjectRepository>) -> Self {
        Self { questions, subjects }
    }

    pub async fn get_question(&self, id: &str) -> AppResult<Question> {
        self.questions
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Question with id '{}' not found", id)))
    }

    /// Returns questions in the order of `ids`; any unknown id is NotFound.
    pub async fn get_questions(&self, ids: &[String]) -> AppResult<Vec<Question>> {
        let by_id: HashMap<String, Question> = self
            .questions
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|q| (q.id.clone(), q))
            .collect();

        ids.iter()
            .map(|id| {
                by_id
                    .get(id)
                    .cloned()
                    .ok_or_else(|| AppError::NotFound(format!("Question with id '{}' not found", id)))
            })
            .collect()
    }

    pub async fn list_by_subject(&self, subject_id: &str) -> AppResult<Vec<Question>> {
        self.questions.list_by_subject(subject_id).await
    }

    pub async fn get_subject(&self, id: &str) -> AppResult<Subject> {
        self.subjects
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Subject with id '{}' not found", id)))
    }

    /// Subject id -> name for every known id in `ids`. Unknown ids map to the
    /// id itself so callers always have something to display.
    pub async fn subject_names(&self, ids: &[String]) -> AppResult<HashMap<String, String>> {
        let mut names: HashMap<String, String> = self
            .subjects
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        for id in ids {
            names.entry(id.clone()).or_insert_with(|| id.clone());
        }
        Ok(names)
    }

    pub async fn create_subject(&self, subject: Subject) -> AppResult<Subject> {
        if subject.name.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Subject name cannot be empty".to_string(),
            ));
        }
        self.subjects.create(subject).await
    }

    pub async fn add_questions(&self, questions: Vec<Question>) -> AppResult<Vec<Question>> {
        for question in &questions {
            question.validate_shape()?;
        }
        self.questions.create_many(questions).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{repositories::Repositories, test_utils::fixtures};

    fn service(repos: &Repositories) -> QuestionBankService {
        QuestionBankService::new(repos.questions.clone(), repos.subjects.clone())
    }

    #[tokio::test]
    async fn get_questions_preserves_requested_order() {
        let repos = Repositories::in_memory();
        let bank = service(&repos);
        let first = fixtures::objective_question("subj-1", "A");
        let second = fixtures::essay_question("subj-1");
        bank.add_questions(vec![first.clone(), second.clone()]).await.unwrap();

        let ids = vec![second.id.clone(), first.id.clone()];
        let found = bank.get_questions(&ids).await.unwrap();

        assert_eq!(found[0].id, second.id);
        assert_eq!(found[1].id, first.id);
    }

    #[tokio::test]
    async fn unknown_question_is_not_found() {
        let repos = Repositories::in_memory();
        let bank = service(&repos);

        let result = bank.get_questions(&["missing".to_string()]).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let result = bank.get_question("missing").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn malformed_question_is_rejected() {
        let repos = Repositories::in_memory();
        let bank = service(&repos);
        let mut question = fixtures::objective_question("subj-1", "A");
        question.correct_answer = Some("Z".to_string());

        let result = bank.add_questions(vec![question]).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn subject_names_fall_back_to_id() {
        let repos = Repositories::in_memory();
        let bank = service(&repos);
        bank.create_subject(Subject::new("subj-1", "Biology")).await.unwrap();

        let names = bank
            .subject_names(&["subj-1".to_string(), "subj-x".to_string()])
            .await
            .unwrap();
        assert_eq!(names["subj-1"], "Biology");
        assert_eq!(names["subj-x"], "subj-x");
    }

    #[tokio::test]
    async fn list_by_subject_filters() {
        let repos = Repositories::in_memory();
        let bank = service(&repos);
        bank.add_questions(vec![
            fixtures::objective_question("subj-1", "A"),
            fixtures::objective_question("subj-2", "B"),
        ])
        .await
        .unwrap();

        let questions = bank.list_by_subject("subj-1").await.unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].subject_id, "subj-1");
    }
}
