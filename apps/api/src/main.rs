mod config;
mod db;
mod errors;
mod history;
mod llm_client;
mod models;
mod prompt;
mod quality;
mod routes;
mod state;
mod suggestions;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::OllamaClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::suggestions::generator::{HeuristicSuggester, OllamaSuggester, Suggester};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting PromptPilot API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize Ollama client
    let llm = OllamaClient::new(
        config.ollama_base_url.clone(),
        config.ollama_model.clone(),
        Duration::from_secs(config.ollama_timeout_secs),
    )?;
    if llm.is_reachable().await {
        info!(
            "Ollama reachable at {} (model: {})",
            config.ollama_base_url,
            llm.model()
        );
    } else {
        warn!(
            "Ollama not reachable at {}; LLM features will fail until it is up",
            config.ollama_base_url
        );
    }

    let suggester: Arc<dyn Suggester> = if config.enable_llm_suggestions {
        Arc::new(OllamaSuggester(llm.clone()))
    } else {
        Arc::new(HeuristicSuggester)
    };
    info!("Suggestion backend: {}", suggester.source());

    let state = AppState {
        db,
        llm,
        config: config.clone(),
        suggester,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
