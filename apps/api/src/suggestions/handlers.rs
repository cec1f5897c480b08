use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::prompt::SuggestionRow;
use crate::prompt::handlers::load_current_prompt;
use crate::prompt::store::get_prompt;
use crate::state::AppState;
use crate::suggestions::generator::Suggester;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    Pending,
    Applied,
    Dismissed,
}

impl SuggestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::Applied => "applied",
            SuggestionStatus::Dismissed => "dismissed",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: SuggestionStatus,
}

/// POST /api/v1/prompts/:id/suggestions
/// Generates suggestions for the current version and stores them as pending.
pub async fn handle_generate_suggestions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Vec<SuggestionRow>>), AppError> {
    let prompt = load_current_prompt(&state, id).await?;
    let drafts = state.suggester.suggest(&prompt).await?;

    let mut tx = state.db.begin().await?;
    let mut rows = Vec::with_capacity(drafts.len());
    for draft in &drafts {
        let row = sqlx::query_as::<_, SuggestionRow>(
            r#"
            INSERT INTO prompt_suggestions
                (id, prompt_id, version_label, category, suggestion, rationale, source, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(&prompt.version.label)
        .bind(&draft.category)
        .bind(&draft.suggestion)
        .bind(&draft.rationale)
        .bind(state.suggester.source())
        .bind(SuggestionStatus::Pending.as_str())
        .fetch_one(&mut *tx)
        .await?;
        rows.push(row);
    }
    tx.commit().await?;

    info!(
        "Stored {} {} suggestions for prompt {id} version '{}'",
        rows.len(),
        state.suggester.source(),
        prompt.version.label
    );
    Ok((StatusCode::CREATED, Json(rows)))
}

/// GET /api/v1/prompts/:id/suggestions
pub async fn handle_list_suggestions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SuggestionRow>>, AppError> {
    if get_prompt(&state.db, id).await?.is_none() {
        return Err(AppError::NotFound(format!("Prompt {id} not found")));
    }
    let rows = sqlx::query_as::<_, SuggestionRow>(
        "SELECT * FROM prompt_suggestions WHERE prompt_id = $1 ORDER BY created_at DESC",
    )
    .bind(id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// PATCH /api/v1/suggestions/:id
pub async fn handle_update_suggestion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdate>,
) -> Result<Json<SuggestionRow>, AppError> {
    let row = sqlx::query_as::<_, SuggestionRow>(
        "UPDATE prompt_suggestions SET status = $1 WHERE id = $2 RETURNING *",
    )
    .bind(req.status.as_str())
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Suggestion {id} not found")))?;
    Ok(Json(row))
}
