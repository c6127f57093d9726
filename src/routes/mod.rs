//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - JSON API under `/api/v1/...` (quiz, tutor, demo, auth, summaries, dashboard)
/// - Static SPA from the configured directory with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let static_service = ServeDir::new(&static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // Health + auth
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/auth/login", post(http::http_login))
        .route("/api/v1/auth/google", post(http::http_google_login))
        .route("/api/v1/auth/logout", post(http::http_logout))
        .route("/api/v1/auth/me", get(http::http_me))
        // Quiz
        .route("/api/v1/quiz", post(http::http_create_quiz))
        .route("/api/v1/quiz/:id", get(http::http_get_quiz).delete(http::http_reset_quiz))
        .route("/api/v1/quiz/:id/answer", post(http::http_select_answer))
        .route("/api/v1/quiz/:id/next", post(http::http_next_question))
        .route("/api/v1/quiz/:id/previous", post(http::http_previous_question))
        .route("/api/v1/quiz/:id/results", get(http::http_quiz_results))
        .route("/api/v1/tasks/:id/cancel", post(http::http_cancel_task))
        // Tutor
        .route("/api/v1/tutor/message", post(http::http_tutor_message))
        .route("/api/v1/tutor/:id", get(http::http_get_transcript).delete(http::http_clear_conversation))
        // Demo
        .route("/api/v1/demo", get(http::http_demo_text))
        .route("/api/v1/demo/summary", post(http::http_demo_summary))
        // Summaries
        .route("/api/v1/summaries", get(http::http_list_summaries).post(http::http_create_summary))
        .route("/api/v1/summaries/search", get(http::http_search_summaries))
        .route("/api/v1/summaries/stats", get(http::http_summary_stats))
        .route(
            "/api/v1/summaries/:id",
            get(http::http_get_summary)
                .put(http::http_update_summary)
                .delete(http::http_delete_summary),
        )
        .route("/api/v1/dashboard", get(http::http_dashboard))
        // State + HTTP tracing (outermost) + CORS
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
