// Generation Gateway: prompt relay and response normalizer.
// All oracle calls go through llm_client; nothing here talks HTTP to the oracle.

pub mod generator;
pub mod handlers;
pub mod parser;
pub mod prompts;

use serde_json::Value;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::models::question::Question;

/// What a successful relay produced. Never an empty list.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Questions(Vec<Question>),
    /// Single diagnosed placeholder, used when the oracle answered but
    /// nothing usable could be extracted.
    Fallback(Question),
}

impl GenerationOutcome {
    pub fn into_questions(self) -> Vec<Question> {
        match self {
            GenerationOutcome::Questions(questions) => questions,
            GenerationOutcome::Fallback(question) => vec![question],
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, GenerationOutcome::Fallback(_))
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Oracle transport error: {0}")]
    Transport(#[from] LlmError),

    #[error("Oracle did not answer within {0}s")]
    Timeout(u64),

    #[error("Oracle returned an error object (status {status})")]
    Upstream { status: u16, details: Value },

    #[error("Oracle response was not JSON (status {status}): {reason}")]
    MalformedBody {
        status: u16,
        reason: String,
        snippet: String,
    },
}
