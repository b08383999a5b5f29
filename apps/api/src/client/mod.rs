//! Client Controller: file intake, gateway calls and batch pagination for
//! one user session. Drives the `interview` binary; holds no global state.

pub mod extract;
pub mod feed;
pub mod gateway;
pub mod session;

use serde::Serialize;
use thiserror::Error;

/// Questions revealed per page.
pub const BATCH_SIZE: usize = 10;

/// Resume text beyond this many characters is never sent.
pub const MAX_RESUME_CHARS: usize = 10_000;

/// Difficulty sent when the user picked none.
pub const DEFAULT_DIFFICULTY: &str = "all";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),

    #[error("Could not read document: {0}")]
    Extraction(String),

    #[error("Could not reach the question service: {0}")]
    Transport(String),

    #[error("Question service reported an error: {0}")]
    Upstream(String),

    #[error("Invalid response format from backend: {0}")]
    MalformedResponse(String),

    #[error("A request is already in progress")]
    Busy,
}

/// Everything needed to ask the gateway for questions. Captured on a
/// successful top-level generation and reused verbatim by "generate more".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationQuery {
    #[serde(rename = "resume")]
    pub resume_text: String,
    pub position: String,
    pub company: String,
    pub difficulty: String,
}
