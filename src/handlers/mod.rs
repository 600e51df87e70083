pub mod attempt_handler;
pub mod exam_handler;
pub mod graphql_handler;
pub mod health_handler;
pub mod performance_handler;
pub mod recommendation_handler;

use actix_web::web;

use crate::auth::AuthMiddleware;

/// Registers every route. Health probes stay public; everything else needs a bearer token.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_handler::health_check)
        .service(health_handler::health_check_live)
        .service(health_handler::health_check_ready)
        .service(graphql_handler::graphiql)
        .service(
            web::scope("/graphql")
                .wrap(AuthMiddleware)
                .route("", web::post().to(graphql_handler::graphql)),
        )
        .service(
            web::scope("/api")
                .wrap(AuthMiddleware)
                .service(exam_handler::generate_exam)
                .service(exam_handler::create_exam)
                .service(exam_handler::list_exams)
                .service(exam_handler::get_exam)
                .service(exam_handler::exam_for_taking)
                .service(exam_handler::attach_questions)
                .service(attempt_handler::start_attempt)
                .service(attempt_handler::list_attempts)
                .service(attempt_handler::record_answer)
                .service(attempt_handler::flag_question)
                .service(attempt_handler::submit_attempt)
                .service(attempt_handler::abandon_attempt)
                .service(attempt_handler::expire_attempt)
                .service(attempt_handler::regrade_attempt)
                .service(attempt_handler::attempt_results)
                .service(performance_handler::list_performance)
                .service(performance_handler::refresh_performance)
                .service(recommendation_handler::list_recommendations)
                .service(recommendation_handler::generate_recommendations)
                .service(recommendation_handler::mark_recommendation_read),
        );
}
