use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::Oracle;

/// Shared application state injected into all route handlers via Axum extractors.
/// Read-only: the gateway keeps nothing between requests.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable oracle. Default: GeminiClient.
    pub oracle: Arc<dyn Oracle>,
    pub config: Config,
}
