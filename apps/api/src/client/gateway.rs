//! HTTP client for the Generation Gateway, as seen from the Client Controller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error};

use crate::client::{ClientError, GenerationQuery};
use crate::models::question::{Question, SNIPPET_CHARS};
use crate::text::truncate_chars;

/// Anything that can turn a query into a batch of questions.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn generate(&self, query: &GenerationQuery) -> Result<Vec<Question>, ClientError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Generate,
    /// Canned questions, no oracle quota spent.
    Debug,
}

#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
    endpoint: Endpoint,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            endpoint: Endpoint::Generate,
        })
    }

    /// Points every `generate` call at the debug endpoint instead.
    pub fn debug_mode(mut self) -> Self {
        self.endpoint = Endpoint::Debug;
        self
    }

    async fn fetch(&self, query: &GenerationQuery) -> Result<(u16, String), reqwest::Error> {
        let response = match self.endpoint {
            Endpoint::Generate => {
                self.client
                    .post(format!("{}/generate", self.base_url))
                    .json(query)
                    .send()
                    .await?
            }
            Endpoint::Debug => {
                self.client
                    .get(format!("{}/debug/questions", self.base_url))
                    .send()
                    .await?
            }
        };

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl QuestionSource for GatewayClient {
    async fn generate(&self, query: &GenerationQuery) -> Result<Vec<Question>, ClientError> {
        debug!(
            position = %query.position,
            company = %query.company,
            difficulty = %query.difficulty,
            "Calling question gateway"
        );

        let (status, body) = self.fetch(query).await.map_err(|e| {
            error!("Gateway request failed: {e}");
            ClientError::Transport(e.to_string())
        })?;

        normalize_response(status, &body)
    }
}

/// Accepts a bare array or `{questions: [...]}`. An `error` field becomes
/// `Validation` for a 400 and `Upstream` otherwise. Anything else is malformed.
pub fn normalize_response(status: u16, body: &str) -> Result<Vec<Question>, ClientError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        error!(
            "Gateway JSON parse error: {e}; body: {}",
            truncate_chars(body, SNIPPET_CHARS)
        );
        ClientError::MalformedResponse(format!("status {status}: {e}"))
    })?;

    let array = match &value {
        Value::Array(_) => Some(value.clone()),
        Value::Object(map) => map.get("questions").filter(|q| q.is_array()).cloned(),
        _ => None,
    };

    if let Some(array) = array {
        return serde_json::from_value::<Vec<Question>>(array)
            .map_err(|e| ClientError::MalformedResponse(format!("status {status}: {e}")));
    }

    if let Some(err) = value.get("error").filter(|e| !e.is_null()) {
        let message = error_message(err);
        return Err(if status == 400 {
            ClientError::Validation(message)
        } else {
            ClientError::Upstream(message)
        });
    }

    Err(ClientError::MalformedResponse(format!(
        "status {status}: unexpected response from server"
    )))
}

fn error_message(err: &Value) -> String {
    match err {
        Value::String(s) => s.clone(),
        other => other
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| truncate_chars(&other.to_string(), SNIPPET_CHARS).to_string()),
    }
}
