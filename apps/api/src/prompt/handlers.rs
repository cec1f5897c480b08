use std::collections::{BTreeMap, HashMap};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::history::{Prompt, PromptVersion, VersionHistory};
use crate::models::prompt::PromptRow;
use crate::prompt::store;
use crate::prompt::validation::{validate_prompt, PromptFields};
use crate::prompt::variables::{render, validate_variables, VariableReport};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePromptRequest {
    pub name: String,
    pub content: String,
    pub description: Option<String>,
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub version_label: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Absent fields keep their current value. An explicit `"description": null`
/// clears the description.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePromptRequest {
    pub name: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub description: Option<Option<String>>,
    pub variables: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub version_label: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl UpdatePromptRequest {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.content.is_none()
            && self.description.is_none()
            && self.variables.is_none()
            && self.tags.is_none()
    }
}

/// Maps a present field to `Some`, keeping `null` distinct from an absent key.
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub tag: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VersionListResponse {
    pub prompt_id: Uuid,
    pub current_version: Option<String>,
    pub versions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub values: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub prompt_id: Uuid,
    pub version_label: String,
    pub rendered: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateVariablesRequest {
    pub content: String,
    #[serde(default)]
    pub variables: Vec<String>,
    pub values: Option<HashMap<String, String>>,
}

/// Picks `v{n+1}`, skipping forward past labels already in use.
pub fn next_version_label(history: &VersionHistory) -> String {
    let mut n = history.len() + 1;
    loop {
        let label = format!("v{n}");
        if !history.contains_label(&label) {
            return label;
        }
        n += 1;
    }
}

/// Loads the ledger for `id`, failing with 404 when the prompt has no versions.
pub async fn load_existing_history(
    state: &AppState,
    id: Uuid,
) -> Result<VersionHistory, AppError> {
    let history = store::load_history(&state.db, id).await?;
    if history.is_empty() {
        return Err(AppError::NotFound(format!("Prompt {id} not found")));
    }
    Ok(history)
}

/// Returns the current state of prompt `id` as a ledger snapshot.
pub async fn load_current_prompt(state: &AppState, id: Uuid) -> Result<Prompt, AppError> {
    let history = load_existing_history(state, id).await?;
    history
        .latest()
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Prompt {id} not found")))
}

fn version_not_found(id: Uuid, label: &str) -> AppError {
    AppError::NotFound(format!("Version '{label}' not found for prompt {id}"))
}

/// POST /api/v1/prompts
pub async fn handle_create_prompt(
    State(state): State<AppState>,
    Json(req): Json<CreatePromptRequest>,
) -> Result<(StatusCode, Json<PromptRow>), AppError> {
    let label = req.version_label.unwrap_or_else(|| "v1".to_string());
    let fields = PromptFields {
        name: Some(req.name.as_str()),
        content: Some(req.content.as_str()),
        description: req.description.as_deref(),
        tags: Some(req.tags.as_slice()),
        version_label: Some(label.as_str()),
    };
    validate_prompt(&fields, &req.content, &req.variables)?;

    let mut prompt = Prompt::new(req.name.trim(), req.content, label);
    prompt.description = req.description;
    prompt.variables = req.variables;
    prompt.tags = req.tags;
    prompt.version.metadata = req.metadata;

    let row = store::create_prompt(&state.db, &prompt).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/prompts
pub async fn handle_list_prompts(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<PromptRow>>, AppError> {
    let rows = store::list_prompts(&state.db, params.tag.as_deref()).await?;
    Ok(Json(rows))
}

/// GET /api/v1/prompts/:id
pub async fn handle_get_prompt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PromptRow>, AppError> {
    let row = store::get_prompt(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Prompt {id} not found")))?;
    Ok(Json(row))
}

/// Builds the next snapshot from the newest entry in `history` and the
/// fields present in `req`. Rejects an explicit label already in the ledger.
fn apply_update(
    history: &VersionHistory,
    req: &UpdatePromptRequest,
    id: Uuid,
) -> Result<Prompt, AppError> {
    let label = match &req.version_label {
        Some(label) => {
            if history.contains_label(label) {
                return Err(AppError::Conflict(format!(
                    "Version label '{label}' already exists for prompt {id}"
                )));
            }
            label.clone()
        }
        None => next_version_label(history),
    };

    let fields = PromptFields {
        name: req.name.as_deref(),
        content: req.content.as_deref(),
        description: req.description.as_ref().and_then(|d| d.as_deref()),
        tags: req.tags.as_deref(),
        version_label: Some(label.as_str()),
    };

    let mut prompt = history
        .latest()
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Prompt {id} not found")))?;
    if let Some(name) = &req.name {
        prompt.name = name.trim().to_string();
    }
    if let Some(content) = &req.content {
        prompt.content = content.clone();
    }
    if let Some(description) = &req.description {
        prompt.description = description.clone();
    }
    if let Some(variables) = &req.variables {
        prompt.variables = variables.clone();
    }
    if let Some(tags) = &req.tags {
        prompt.tags = tags.clone();
    }
    validate_prompt(&fields, &prompt.content, &prompt.variables)?;

    let mut version = PromptVersion::new(label);
    version.metadata = req.metadata.clone();
    prompt.version = version;
    Ok(prompt)
}

/// PUT /api/v1/prompts/:id
/// Every update appends a new version; earlier versions are never rewritten.
/// The label decision and the merge run under the prompt's row lock.
pub async fn handle_update_prompt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePromptRequest>,
) -> Result<Json<PromptRow>, AppError> {
    if req.is_empty() {
        return Err(AppError::Validation("no fields to update".to_string()));
    }

    let (mut tx, mut history) = store::lock_history(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Prompt {id} not found")))?;

    let prompt = apply_update(&history, &req, id)?;
    history.add_version(&prompt);

    let row = store::append_version(&mut tx, &prompt).await?;
    tx.commit().await?;
    Ok(Json(row))
}

/// DELETE /api/v1/prompts/:id
pub async fn handle_delete_prompt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !store::delete_prompt(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Prompt {id} not found")));
    }
    info!("Deleted prompt {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/prompts/:id/versions
pub async fn handle_list_versions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<VersionListResponse>, AppError> {
    let history = load_existing_history(&state, id).await?;
    Ok(Json(VersionListResponse {
        prompt_id: id,
        current_version: history.latest().map(|p| p.version.label.clone()),
        versions: history
            .list_versions()
            .into_iter()
            .map(str::to_string)
            .collect(),
    }))
}

/// GET /api/v1/prompts/:id/versions/:label
pub async fn handle_get_version(
    State(state): State<AppState>,
    Path((id, label)): Path<(Uuid, String)>,
) -> Result<Json<Prompt>, AppError> {
    let history = load_existing_history(&state, id).await?;
    let prompt = history
        .get_version(&label)
        .ok_or_else(|| version_not_found(id, &label))?;
    Ok(Json(prompt))
}

/// POST /api/v1/prompts/:id/rollback/:label
/// Re-appends the historical snapshot as the newest version.
pub async fn handle_rollback(
    State(state): State<AppState>,
    Path((id, label)): Path<(Uuid, String)>,
) -> Result<Json<PromptRow>, AppError> {
    let (mut tx, mut history) = store::lock_history(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Prompt {id} not found")))?;
    let restored = history
        .rollback(&label)
        .ok_or_else(|| version_not_found(id, &label))?;

    let row = store::append_version(&mut tx, &restored).await?;
    tx.commit().await?;
    info!("Rolled prompt {id} back to version '{label}'");
    Ok(Json(row))
}

/// POST /api/v1/prompts/:id/render
pub async fn handle_render(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, AppError> {
    let prompt = load_current_prompt(&state, id).await?;
    let rendered = render(&prompt.content, &req.values).map_err(|missing| {
        AppError::UnprocessableEntity(format!(
            "missing values for variables: {}",
            missing.join(", ")
        ))
    })?;
    Ok(Json(RenderResponse {
        prompt_id: id,
        version_label: prompt.version.label,
        rendered,
    }))
}

/// POST /api/v1/variables/validate
pub async fn handle_validate_variables(
    Json(req): Json<ValidateVariablesRequest>,
) -> Json<VariableReport> {
    Json(validate_variables(
        &req.content,
        &req.variables,
        req.values.as_ref(),
    ))
}
