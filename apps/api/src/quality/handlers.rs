use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::prompt::QualityScoreRow;
use crate::prompt::handlers::load_current_prompt;
use crate::prompt::store::get_prompt;
use crate::quality::scoring::{score_prompt, QualityWeights};
use crate::state::AppState;

/// POST /api/v1/prompts/:id/score
/// Scores the current version and records the result.
pub async fn handle_score_prompt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<QualityScoreRow>), AppError> {
    let prompt = load_current_prompt(&state, id).await?;
    let report = score_prompt(&prompt.content, &QualityWeights::default());

    let row = sqlx::query_as::<_, QualityScoreRow>(
        r#"
        INSERT INTO quality_scores
            (id, prompt_id, version_label, clarity, specificity, structure, overall, feedback)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(id)
    .bind(&prompt.version.label)
    .bind(report.clarity)
    .bind(report.specificity)
    .bind(report.structure)
    .bind(report.overall)
    .bind(&report.feedback)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(
        "Scored prompt {id} version '{}': overall {:.2}",
        prompt.version.label,
        report.overall
    );
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/prompts/:id/scores
pub async fn handle_list_scores(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<QualityScoreRow>>, AppError> {
    if get_prompt(&state.db, id).await?.is_none() {
        return Err(AppError::NotFound(format!("Prompt {id} not found")));
    }
    let rows = sqlx::query_as::<_, QualityScoreRow>(
        "SELECT * FROM quality_scores WHERE prompt_id = $1 ORDER BY created_at DESC",
    )
    .bind(id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}
