use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::OllamaClient;
use crate::suggestions::generator::Suggester;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: OllamaClient,
    pub config: Config,
    /// Pluggable suggester. Default: OllamaSuggester. Swap via ENABLE_LLM_SUGGESTIONS.
    pub suggester: Arc<dyn Suggester>,
}
