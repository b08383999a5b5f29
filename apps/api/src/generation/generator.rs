//! Question generation: the one operation the gateway performs.
//!
//! Flow: validate → build prompt → one oracle call (bounded by a timeout) →
//! normalize the reply. Stateless: nothing survives between calls.

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::generation::parser::interpret_reply;
use crate::generation::prompts::build_question_prompt;
use crate::generation::{GatewayError, GenerationOutcome};
use crate::llm_client::Oracle;
use crate::models::question::SNIPPET_CHARS;
use crate::text::truncate_chars;

/// Request body for question generation. Absent or null fields read as empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerateRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub resume: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub position: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub company: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub difficulty: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl GenerateRequest {
    fn validate(&self) -> Result<(), GatewayError> {
        if self.resume.trim().is_empty() || self.position.trim().is_empty() {
            return Err(GatewayError::Validation(
                "Missing required fields (resume or position)".to_string(),
            ));
        }
        Ok(())
    }
}

/// Relays one generation request to the oracle and normalizes the answer.
#[instrument(skip_all, fields(request_id = %Uuid::new_v4(), oracle = oracle.name()))]
pub async fn generate_questions(
    oracle: &dyn Oracle,
    request: &GenerateRequest,
    timeout: Duration,
) -> Result<GenerationOutcome, GatewayError> {
    request.validate()?;

    info!(
        position = %request.position,
        company = %request.company,
        difficulty = %request.difficulty,
        "Generating interview questions"
    );

    let prompt = build_question_prompt(
        &request.resume,
        &request.position,
        &request.company,
        &request.difficulty,
    );

    // The HTTP client may give up first; either way it is a timeout.
    let reply = match tokio::time::timeout(timeout, oracle.complete(&prompt)).await {
        Ok(Err(e)) if e.is_timeout() => return Err(GatewayError::Timeout(timeout.as_secs())),
        Ok(result) => result?,
        Err(_) => return Err(GatewayError::Timeout(timeout.as_secs())),
    };

    info!("Oracle HTTP status: {}", reply.status);
    debug!(
        "Oracle raw response (first {SNIPPET_CHARS} chars): {}",
        truncate_chars(&reply.body, SNIPPET_CHARS)
    );

    let outcome = interpret_reply(&reply)?;
    if let GenerationOutcome::Questions(questions) = &outcome {
        info!("Oracle produced {} questions", questions.len());
    }
    Ok(outcome)
}
