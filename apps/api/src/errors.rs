use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::generation::GatewayError;
use crate::models::question::{Diagnostic, Question, ERROR_TEXT, SNIPPET_CHARS};
use crate::text::truncate_chars;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every body is JSON, whatever the status.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream error (status {status})")]
    Upstream { status: u16, details: Value },

    #[error("Malformed upstream response (status {status}): {reason}")]
    MalformedResponse {
        status: u16,
        reason: String,
        snippet: String,
    },

    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(String),
}

// Bodies axum cannot read as a GenerateRequest are reported like any other
// bad input, so the client still gets JSON back.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Validation(msg) => AppError::Validation(msg),
            GatewayError::Upstream { status, details } => AppError::Upstream { status, details },
            GatewayError::MalformedBody {
                status,
                reason,
                snippet,
            } => AppError::MalformedResponse {
                status,
                reason,
                snippet,
            },
            e @ (GatewayError::Transport(_) | GatewayError::Timeout(_)) => {
                AppError::OracleUnavailable(e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": { "code": "VALIDATION_ERROR", "message": msg } }),
            ),
            AppError::Upstream { status, details } => {
                let details = details.to_string();
                tracing::error!("Upstream error (status {status}): {details}");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({
                        "error": {
                            "code": "UPSTREAM_ERROR",
                            "message": "Oracle API error",
                            "httpStatus": status,
                            "details": truncate_chars(&details, SNIPPET_CHARS)
                        }
                    }),
                )
            }
            AppError::MalformedResponse {
                status,
                reason,
                snippet,
            } => {
                tracing::error!("Malformed upstream response (status {status}): {reason}");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({
                        "error": {
                            "code": "MALFORMED_RESPONSE",
                            "message": "Failed to parse oracle response JSON",
                            "httpStatus": status,
                            "rawResponseSnippet": snippet
                        }
                    }),
                )
            }
            // Transport failures still answer with a renderable question.
            AppError::OracleUnavailable(msg) => {
                tracing::error!("Exception while calling oracle: {msg}");
                let diagnostic = Diagnostic {
                    error: Some(msg),
                    ..Diagnostic::new("Oracle call failed")
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!([Question::fallback(ERROR_TEXT, diagnostic)]),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
