/// LLM Client: the single point of entry for oracle calls.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// Everything goes through the `Oracle` trait so the gateway can be driven by
/// a fake in tests.
///
/// The client deliberately hands back the raw transport reply (status + body).
/// Deciding whether that body is an error object, garbage, or usable text is
/// the gateway's job, see `generation::parser`.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub mod prompts;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Oracle API key is empty")]
    MissingApiKey,
}

impl LlmError {
    /// True when the HTTP client gave up waiting on the oracle.
    pub fn is_timeout(&self) -> bool {
        matches!(self, LlmError::Http(e) if e.is_timeout())
    }
}

/// Raw reply of one oracle round-trip. The body may or may not be JSON.
#[derive(Debug, Clone)]
pub struct OracleReply {
    pub status: u16,
    pub body: String,
}

/// A text-completion oracle. Exactly one outbound call per `complete`.
///
/// Dropping the returned future aborts the in-flight request.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<OracleReply, LlmError>;

    fn name(&self) -> &str;
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// The subset of a `generateContent` response the gateway reads.
/// Every level is optional: a missing link simply yields no candidate text.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, trimmed.
    /// Blank text counts as absent.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// GeminiClient
// ────────────────────────────────────────────────────────────────────────────

/// Oracle backed by the Gemini `generateContent` endpoint.
/// No retries: a failed call surfaces immediately.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl Oracle for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<OracleReply, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let url = self.endpoint();
        info!("Calling oracle endpoint: {url}");

        // The key travels in a header, never in the URL that gets logged.
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!("Oracle replied with status {status} ({} bytes)", body.len());

        Ok(OracleReply { status, body })
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server: &mockito::ServerGuard) -> GeminiClient {
        GeminiClient::new("test-key".to_string(), Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.url())
    }

    #[test]
    fn test_client_creation_empty_key() {
        let client = GeminiClient::new("  ".to_string(), Duration::from_secs(5));
        assert!(matches!(client, Err(LlmError::MissingApiKey)));
    }

    #[test]
    fn test_endpoint_uses_model_and_trims_base_url() {
        let client = GeminiClient::new("k".to_string(), Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://localhost:9999/")
            .with_model("gemini-test");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_response_text_extracts_first_candidate() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"  [1]  "}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.text(), Some("[1]"));
    }

    #[test]
    fn test_response_text_missing_levels_yield_none() {
        for json in [
            r#"{}"#,
            r#"{"candidates":[]}"#,
            r#"{"candidates":[{}]}"#,
            r#"{"candidates":[{"content":{"parts":[]}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{"text":"   "}]}}]}"#,
        ] {
            let parsed: GenerateContentResponse = serde_json::from_str(json).unwrap();
            assert_eq!(parsed.text(), None, "input: {json}");
        }
    }

    #[tokio::test]
    async fn test_complete_sends_prompt_and_key_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/models/gemini-2.5-flash:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "contents": [{"parts": [{"text": "hello"}]}]
            })))
            .with_status(200)
            .with_body(r#"{"candidates":[]}"#)
            .create_async()
            .await;

        let reply = client_for(&server).complete("hello").await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, r#"{"candidates":[]}"#);
    }

    #[tokio::test]
    async fn test_silent_oracle_reports_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold the connection without ever answering.
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            std::future::pending::<()>().await;
        });

        let client = GeminiClient::new("test-key".to_string(), Duration::from_millis(200))
            .unwrap()
            .with_base_url(format!("http://{addr}"));
        let err = client.complete("hello").await.unwrap_err();

        assert!(err.is_timeout());
    }

    #[test]
    fn test_missing_key_is_not_a_timeout() {
        assert!(!LlmError::MissingApiKey.is_timeout());
    }

    #[tokio::test]
    async fn test_complete_passes_error_status_through() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", mockito::Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error":{"code":403,"message":"denied"}}"#)
            .create_async()
            .await;

        let reply = client_for(&server).complete("hello").await.unwrap();
        assert_eq!(reply.status, 403);
        assert!(reply.body.contains("denied"));
    }
}
