use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App};
use async_trait::async_trait;
use serde_json::{json, Value};

use exam_prep_server::{
    app_state::AppState,
    auth::JwtService,
    config::{Config, StorageBackend},
    errors::AppResult,
    graphql::create_schema,
    handlers,
    models::domain::{Difficulty, Question, QuestionOption, RecommendationType, Subject},
    repositories::Repositories,
    services::{
        text_generation::{EssayEvaluation, GeneratedQuestion, GeneratedRecommendation},
        TextGenerator,
    },
};

const OWNER: &str = "student-1";
const OTHER: &str = "student-2";

/// Deterministic model: essays score 8, one recommendation per call.
struct StubTextGenerator;

#[async_trait]
impl TextGenerator for StubTextGenerator {
    async fn generate_questions(
        &self,
        _content: &str,
        _subject_name: &str,
        count: usize,
        _difficulty: Difficulty,
    ) -> AppResult<Vec<GeneratedQuestion>> {
        Ok((0..count)
            .map(|i| GeneratedQuestion {
                question_type: exam_prep_server::models::domain::QuestionType::Objective,
                content: format!("Generated question {}", i + 1),
                options: letters(),
                correct_answer: Some("B".to_string()),
                explanation: None,
            })
            .collect())
    }

    async fn evaluate_essay(
        &self,
        _question: &str,
        _answer: &str,
        _subject_name: &str,
    ) -> AppResult<EssayEvaluation> {
        Ok(EssayEvaluation {
            score: 8.0,
            evaluation: "Clear and complete.".to_string(),
        })
    }

    async fn synthesize_recommendations(
        &self,
        _performance_summary: &str,
        _target_exam: &str,
        _count: usize,
    ) -> AppResult<Vec<GeneratedRecommendation>> {
        Ok(vec![GeneratedRecommendation {
            recommendation_type: RecommendationType::StudyFocus,
            title: "Review photosynthesis".to_string(),
            description: "Focus on the light-dependent reactions.".to_string(),
            priority: 1,
        }])
    }
}

fn letters() -> Vec<QuestionOption> {
    ["A", "B", "C", "D"]
        .iter()
        .map(|letter| QuestionOption {
            letter: letter.to_string(),
            text: format!("Option {}", letter),
        })
        .collect()
}

fn config() -> Config {
    let mut config = Config::from_env();
    config.storage_backend = StorageBackend::Memory;
    config.expiry_sweep_interval_seconds = 0;
    config.aggregation_max_retries = 0;
    config
}

struct Fixture {
    state: AppState,
    questions: Vec<Question>,
}

async fn fixture() -> Fixture {
    let repos = Repositories::in_memory();
    repos.subjects.create(Subject::new("bio", "Biology")).await.unwrap();

    let questions = vec![
        Question::new_objective("bio", "Where does photosynthesis happen?", Difficulty::Easy, letters(), "A"),
        Question::new_objective("bio", "Which gas is released?", Difficulty::Medium, letters(), "C"),
        Question::new_essay("bio", "Describe the Calvin cycle.", Difficulty::Hard, None),
    ];
    repos.questions.create_many(questions.clone()).await.unwrap();

    let state = AppState::with_repositories(config(), repos, Arc::new(StubTextGenerator));
    Fixture { state, questions }
}

fn token(state: &AppState, user_id: &str) -> String {
    let jwt = JwtService::new(&state.config.jwt_secret, 1);
    format!("Bearer {}", jwt.create_token(user_id).unwrap())
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .app_data(web::Data::from($state.jwt_service.clone()))
                .app_data(web::Data::new(create_schema($state.clone())))
                .configure(handlers::configure),
        )
        .await
    };
}

macro_rules! post_json {
    ($app:expr, $uri:expr, $auth:expr, $body:expr) => {
        test::call_service(
            &$app,
            test::TestRequest::post()
                .uri($uri)
                .insert_header(("Authorization", $auth.as_str()))
                .set_json($body)
                .to_request(),
        )
        .await
    };
}

macro_rules! get_json {
    ($app:expr, $uri:expr, $auth:expr) => {
        test::call_service(
            &$app,
            test::TestRequest::get()
                .uri($uri)
                .insert_header(("Authorization", $auth.as_str()))
                .to_request(),
        )
        .await
    };
}

fn question_ids(questions: &[Question]) -> Vec<String> {
    questions.iter().map(|q| q.id.clone()).collect()
}

#[actix_web::test]
async fn full_exam_flow_scores_and_reports_results() {
    let f = fixture().await;
    let app = init_app!(f.state);
    let auth = token(&f.state, OWNER);

    let resp = post_json!(
        app,
        "/api/exams",
        auth,
        json!({ "title": "Biology mock", "question_ids": question_ids(&f.questions) })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let exam: Value = test::read_body_json(resp).await;
    assert_eq!(exam["status"], "ready");
    let exam_id = exam["id"].as_str().unwrap().to_string();

    let resp = get_json!(app, &format!("/api/exams/{}/take", exam_id), auth);
    assert_eq!(resp.status(), StatusCode::OK);
    let taking: Value = test::read_body_json(resp).await;
    assert_eq!(taking["questions"].as_array().unwrap().len(), 3);
    assert!(taking["questions"][0].get("correct_answer").is_none());

    let resp = post_json!(app, "/api/attempts", auth, json!({ "exam_id": exam_id }));
    assert_eq!(resp.status(), StatusCode::CREATED);
    let attempt: Value = test::read_body_json(resp).await;
    assert_eq!(attempt["status"], "in_progress");
    let attempt_id = attempt["id"].as_str().unwrap().to_string();

    for (question, text) in f.questions.iter().zip(["A", "c", "Carbon fixation then reduction"]) {
        let resp = post_json!(
            app,
            &format!("/api/attempts/{}/answer", attempt_id),
            auth,
            json!({ "question_id": question.id, "user_answer": text, "time_spent": 30 })
        );
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = post_json!(app, &format!("/api/attempts/{}/submit", attempt_id), auth, json!({}));
    assert_eq!(resp.status(), StatusCode::OK);
    let result: Value = test::read_body_json(resp).await;
    assert_eq!(result["score"], 100.0);
    assert_eq!(result["correct_count"], 3);
    assert_eq!(result["incorrect_count"], 0);
    assert_eq!(result["status"], "completed");

    let resp = get_json!(app, &format!("/api/attempts/{}/results", attempt_id), auth);
    assert_eq!(resp.status(), StatusCode::OK);
    let results: Value = test::read_body_json(resp).await;
    assert_eq!(results["attempt"]["time_spent"], 90);
    assert_eq!(results["questions"][2]["verdict"], "correct");
    assert_eq!(results["questions"][2]["ai_score"], 8.0);
    assert_eq!(results["subjects"][0]["subject_name"], "Biology");

    let resp = post_json!(app, "/api/performance/bio/refresh", auth, json!({}));
    assert_eq!(resp.status(), StatusCode::OK);
    let performance: Value = test::read_body_json(resp).await;
    assert_eq!(performance["total_questions"], 3);
    assert_eq!(performance["strength_level"], "strong");
}

#[actix_web::test]
async fn wrong_answer_lowers_score() {
    let f = fixture().await;
    let app = init_app!(f.state);
    let auth = token(&f.state, OWNER);

    let resp = post_json!(
        app,
        "/api/exams",
        auth,
        json!({ "title": "Biology mock", "question_ids": question_ids(&f.questions) })
    );
    let exam: Value = test::read_body_json(resp).await;
    let resp = post_json!(app, "/api/attempts", auth, json!({ "exam_id": exam["id"] }));
    let attempt: Value = test::read_body_json(resp).await;
    let attempt_id = attempt["id"].as_str().unwrap().to_string();

    let resp = post_json!(
        app,
        &format!("/api/attempts/{}/submit", attempt_id),
        auth,
        json!({
            "answers": [
                { "question_id": f.questions[0].id, "user_answer": "A" },
                { "question_id": f.questions[1].id, "user_answer": "B" },
                { "question_id": f.questions[2].id, "user_answer": "Carbon fixation" }
            ],
            "total_time_spent": 120
        })
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let result: Value = test::read_body_json(resp).await;
    assert_eq!(result["score"], 66.67);
    assert_eq!(result["correct_count"], 2);
    assert_eq!(result["incorrect_count"], 1);
}

#[actix_web::test]
async fn flagged_questions_show_up_in_results() {
    let f = fixture().await;
    let app = init_app!(f.state);
    let auth = token(&f.state, OWNER);

    let resp = post_json!(
        app,
        "/api/exams",
        auth,
        json!({ "title": "Biology mock", "question_ids": question_ids(&f.questions) })
    );
    let exam: Value = test::read_body_json(resp).await;
    let resp = post_json!(app, "/api/attempts", auth, json!({ "exam_id": exam["id"] }));
    let attempt: Value = test::read_body_json(resp).await;
    let attempt_id = attempt["id"].as_str().unwrap().to_string();

    let resp = post_json!(
        app,
        &format!("/api/attempts/{}/flag", attempt_id),
        auth,
        json!({ "question_id": f.questions[1].id, "flagged": true })
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let answer: Value = test::read_body_json(resp).await;
    assert_eq!(answer["flagged"], true);

    let resp = post_json!(
        app,
        &format!("/api/attempts/{}/flag", attempt_id),
        token(&f.state, OTHER),
        json!({ "question_id": f.questions[1].id, "flagged": false })
    );
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = post_json!(app, &format!("/api/attempts/{}/submit", attempt_id), auth, json!({}));
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = post_json!(
        app,
        &format!("/api/attempts/{}/flag", attempt_id),
        auth,
        json!({ "question_id": f.questions[0].id, "flagged": true })
    );
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = get_json!(app, &format!("/api/attempts/{}/results", attempt_id), auth);
    let results: Value = test::read_body_json(resp).await;
    assert_eq!(results["questions"][0]["flagged"], false);
    assert_eq!(results["questions"][1]["flagged"], true);
}

#[actix_web::test]
async fn exam_with_repeated_questions_is_rejected() {
    let f = fixture().await;
    let app = init_app!(f.state);
    let auth = token(&f.state, OWNER);
    let id = f.questions[0].id.clone();

    let resp = post_json!(
        app,
        "/api/exams",
        auth,
        json!({ "title": "Biology mock", "question_ids": [id, id] })
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[actix_web::test]
async fn second_submit_is_a_conflict() {
    let f = fixture().await;
    let app = init_app!(f.state);
    let auth = token(&f.state, OWNER);

    let resp = post_json!(
        app,
        "/api/exams",
        auth,
        json!({ "title": "Biology mock", "question_ids": question_ids(&f.questions) })
    );
    let exam: Value = test::read_body_json(resp).await;
    let resp = post_json!(app, "/api/attempts", auth, json!({ "exam_id": exam["id"] }));
    let attempt: Value = test::read_body_json(resp).await;
    let submit_uri = format!("/api/attempts/{}/submit", attempt["id"].as_str().unwrap());

    let first = post_json!(app, &submit_uri, auth, json!({}));
    assert_eq!(first.status(), StatusCode::OK);
    let first: Value = test::read_body_json(first).await;

    let second = post_json!(app, &submit_uri, auth, json!({}));
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(second).await;
    assert_eq!(body["code"], "CONFLICT");

    let resp = get_json!(app, "/api/attempts", auth);
    let attempts: Value = test::read_body_json(resp).await;
    assert_eq!(attempts.as_array().unwrap().len(), 1);
    assert_eq!(attempts[0]["score"], first["score"]);
}

#[actix_web::test]
async fn other_users_cannot_touch_an_attempt() {
    let f = fixture().await;
    let app = init_app!(f.state);
    let owner = token(&f.state, OWNER);
    let other = token(&f.state, OTHER);

    let resp = post_json!(
        app,
        "/api/exams",
        owner,
        json!({ "title": "Biology mock", "question_ids": question_ids(&f.questions) })
    );
    let exam: Value = test::read_body_json(resp).await;
    let resp = post_json!(app, "/api/attempts", owner, json!({ "exam_id": exam["id"] }));
    let attempt: Value = test::read_body_json(resp).await;
    let attempt_id = attempt["id"].as_str().unwrap().to_string();

    let resp = post_json!(app, &format!("/api/attempts/{}/submit", attempt_id), other, json!({}));
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = get_json!(app, &format!("/api/attempts/{}/results", attempt_id), other);
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = get_json!(app, &format!("/api/exams/{}", exam["id"].as_str().unwrap()), other);
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = get_json!(app, "/api/attempts/missing/results", owner);
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn requests_without_a_valid_token_are_rejected() {
    let f = fixture().await;
    let app = init_app!(f.state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/attempts").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let foreign = JwtService::new(
        &secrecy::SecretString::from("a-completely-different-secret-value".to_string()),
        1,
    );
    let bad = format!("Bearer {}", foreign.create_token(OWNER).unwrap());
    let resp = get_json!(app, "/api/performance", bad);
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn exam_without_questions_cannot_be_started() {
    let f = fixture().await;
    let app = init_app!(f.state);
    let auth = token(&f.state, OWNER);

    let resp = post_json!(app, "/api/exams", auth, json!({ "title": "Empty", "question_ids": [] }));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let draft = f
        .state
        .exam_service
        .create_draft(OWNER, "Draft", None, None)
        .await
        .unwrap();
    let resp = post_json!(app, "/api/attempts", auth, json!({ "exam_id": draft.id }));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[actix_web::test]
async fn generated_exam_and_recommendations_round_out_the_flow() {
    let f = fixture().await;
    let app = init_app!(f.state);
    let auth = token(&f.state, OWNER);

    let resp = post_json!(
        app,
        "/api/exams/generate",
        auth,
        json!({
            "title": "Generated biology",
            "subject_id": "bio",
            "content": "Photosynthesis converts light energy into chemical energy in chloroplasts.",
            "question_count": 2,
            "difficulty": "easy"
        })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let exam: Value = test::read_body_json(resp).await;
    assert_eq!(exam["question_count"], 2);
    assert_eq!(exam["status"], "ready");

    let resp = post_json!(
        app,
        "/api/recommendations/generate",
        auth,
        json!({ "target_exam": "Final biology exam" })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let id = created[0]["id"].as_str().unwrap().to_string();

    let resp = post_json!(app, &format!("/api/recommendations/{}/read", id), auth, json!({}));
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = get_json!(app, "/api/recommendations?unread_only=true", auth);
    let unread: Value = test::read_body_json(resp).await;
    assert!(unread.as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn graphql_endpoint_uses_the_bearer_identity() {
    let f = fixture().await;
    let app = init_app!(f.state);
    let auth = token(&f.state, OWNER);

    let resp = post_json!(
        app,
        "/graphql",
        auth,
        json!({ "query": "{ attempts { id } performance { subjectId } }" })
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body.get("errors").is_none(), "{}", body);
    assert_eq!(body["data"]["attempts"], json!([]));

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/graphql")
            .set_json(json!({ "query": "{ attempts { id } }" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
