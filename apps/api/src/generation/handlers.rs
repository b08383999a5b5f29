//! Axum route handlers for the Generation API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::errors::AppError;
use crate::generation::generator::{generate_questions, GenerateRequest};
use crate::models::question::{Difficulty, Question};
use crate::state::AppState;

/// POST /generate (legacy alias: POST /api/gemini)
///
/// Returns a bare JSON array: the generated questions, or a single
/// fallback question carrying `_diagnostic` when the oracle's answer held
/// nothing usable.
pub async fn handle_generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<Vec<Question>>, AppError> {
    let Json(request) = payload?;
    let outcome = generate_questions(
        state.oracle.as_ref(),
        &request,
        state.config.oracle_timeout,
    )
    .await?;

    Ok(Json(outcome.into_questions()))
}

/// GET /debug/questions (legacy alias: GET /api/debug-questions)
///
/// Canned questions for smoke-testing clients without spending oracle quota.
pub async fn handle_debug_questions() -> Json<Vec<Question>> {
    Json(debug_questions())
}

pub fn debug_questions() -> Vec<Question> {
    vec![
        Question::new(
            "Debug Q: Tell me about yourself.",
            "Behavioral",
            Difficulty::Easy,
        ),
        Question::new("Debug Q: Explain a SQL join.", "Technical", Difficulty::Medium),
    ]
}
