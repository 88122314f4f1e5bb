// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    handlers::{self, lab, quiz, results},
    state::AppState,
};

/// Upload limit for lab reports.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Assembles the main application router.
///
/// * Mounts the quiz, results and lab routes under `/api`.
/// * Serves locally stored blobs under `/files`.
/// * Applies global middleware (Trace, CORS, body limit).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let quiz_routes = Router::new()
        .route("/quizfragen/{user_id}", get(quiz::get_questions))
        .route("/quiz/start/{user_id}", get(quiz::start_quiz))
        .route("/quiz", post(quiz::submit_answer));

    let results_routes = Router::new()
        .route("/punkte/{user_id}", get(results::get_points))
        .route("/beantworteteFragen/{user_id}", get(results::get_answered_questions))
        .route("/quizErgebnisse/{user_id}", get(results::get_quiz_results))
        .route("/data/{user_id}", get(results::get_raw_state));

    let lab_routes = Router::new()
        .route("/uploadPDF", post(lab::upload_pdf))
        .route("/storeResults", post(lab::store_results))
        .route("/laborErgebnisse/{user_id}", get(lab::get_lab_result))
        .route("/export", get(lab::export_csv));

    let api_routes = Router::new()
        .merge(quiz_routes)
        .merge(results_routes)
        .merge(lab_routes);

    Router::new()
        .route("/", get(handlers::root))
        .nest("/api", api_routes)
        // Only complete blobs: uploads are staged outside blob_dir.
        .nest_service("/files", ServeDir::new(&state.config.blob_dir))
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}
