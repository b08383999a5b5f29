pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

/// Request bodies carry a whole resume; allow well past the prompt cap.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/generate", post(handlers::handle_generate))
        .route("/debug/questions", get(handlers::handle_debug_questions))
        // Legacy paths kept for existing front ends
        .route("/api/gemini", post(handlers::handle_generate))
        .route("/api/debug-questions", get(handlers::handle_debug_questions))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
