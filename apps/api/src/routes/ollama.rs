use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::llm_client::LocalModel;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub configured_model: String,
    pub models: Vec<LocalModel>,
}

/// GET /api/v1/ollama/models
pub async fn handle_list_models(
    State(state): State<AppState>,
) -> Result<Json<ModelsResponse>, AppError> {
    let models = state.llm.list_models().await?;
    Ok(Json(ModelsResponse {
        configured_model: state.config.ollama_model.clone(),
        models,
    }))
}
