use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::db;
use crate::state::AppState;

/// GET /health
/// Reports service version plus database and Ollama reachability.
/// Always 200; `status` is "degraded" when a dependency is down.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let (database_ok, ollama_ok) = tokio::join!(db::ping(&state.db), state.llm.is_reachable());

    Json(json!({
        "status": if database_ok && ollama_ok { "ok" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "service": "promptpilot-api",
        "checks": {
            "database": if database_ok { "ok" } else { "unreachable" },
            "ollama": if ollama_ok { "ok" } else { "unreachable" },
        },
        "model": state.llm.model(),
    }))
}
