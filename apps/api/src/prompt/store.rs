use anyhow::Result;
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::history::{Prompt, VersionHistory};
use crate::models::prompt::{PromptRow, PromptVersionRow};

const INSERT_VERSION_SQL: &str = r#"
    INSERT INTO prompt_versions
        (id, prompt_id, seq, label, name, content, description,
         variables, tags, metadata, captured_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
"#;

/// Inserts a new prompt together with its first version row.
pub async fn create_prompt(pool: &PgPool, prompt: &Prompt) -> Result<PromptRow> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, PromptRow>(
        r#"
        INSERT INTO prompts
            (id, name, content, description, variables, tags, current_version)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(prompt.id)
    .bind(&prompt.name)
    .bind(&prompt.content)
    .bind(&prompt.description)
    .bind(&prompt.variables)
    .bind(&prompt.tags)
    .bind(&prompt.version.label)
    .fetch_one(&mut *tx)
    .await?;

    insert_version_row(&mut tx, prompt, 1).await?;
    tx.commit().await?;

    info!(
        "Created prompt {} at version '{}'",
        prompt.id, prompt.version.label
    );
    Ok(row)
}

/// Opens a transaction holding the row lock on prompt `id` and rebuilds its
/// ledger under that lock. Returns `None` when the prompt does not exist.
///
/// Label checks and merges that decide what gets appended must run against
/// this ledger, before `append_version` on the same transaction.
pub async fn lock_history(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<(Transaction<'static, Postgres>, VersionHistory)>> {
    let mut tx = pool.begin().await?;

    let locked: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM prompts WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    if locked.is_none() {
        return Ok(None);
    }

    let history = load_history(&mut *tx, id).await?;
    Ok(Some((tx, history)))
}

/// Appends `prompt` as the newest version row and makes it the current state.
/// The caller must hold the row lock taken by `lock_history` and commit afterwards.
/// CRITICAL: version rows are append-only. Never UPDATE or DELETE them.
pub async fn append_version(
    tx: &mut Transaction<'_, Postgres>,
    prompt: &Prompt,
) -> Result<PromptRow> {
    let current_max: Option<i32> =
        sqlx::query_scalar("SELECT MAX(seq) FROM prompt_versions WHERE prompt_id = $1")
            .bind(prompt.id)
            .fetch_one(&mut **tx)
            .await?;
    let seq = current_max.unwrap_or(0) + 1;

    insert_version_row(tx, prompt, seq).await?;

    let row = sqlx::query_as::<_, PromptRow>(
        r#"
        UPDATE prompts
        SET name = $2, content = $3, description = $4, variables = $5,
            tags = $6, current_version = $7, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(prompt.id)
    .bind(&prompt.name)
    .bind(&prompt.content)
    .bind(&prompt.description)
    .bind(&prompt.variables)
    .bind(&prompt.tags)
    .bind(&prompt.version.label)
    .fetch_one(&mut **tx)
    .await?;

    info!(
        "Appended version '{}' (seq {seq}) to prompt {}",
        prompt.version.label, prompt.id
    );
    Ok(row)
}

async fn insert_version_row(
    tx: &mut Transaction<'_, Postgres>,
    prompt: &Prompt,
    seq: i32,
) -> Result<()> {
    sqlx::query(INSERT_VERSION_SQL)
        .bind(Uuid::new_v4())
        .bind(prompt.id)
        .bind(seq)
        .bind(&prompt.version.label)
        .bind(&prompt.name)
        .bind(&prompt.content)
        .bind(&prompt.description)
        .bind(&prompt.variables)
        .bind(&prompt.tags)
        .bind(Json(&prompt.version.metadata))
        .bind(prompt.version.captured_at)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Lists prompts, most recently updated first, optionally filtered by tag.
pub async fn list_prompts(pool: &PgPool, tag: Option<&str>) -> Result<Vec<PromptRow>> {
    Ok(sqlx::query_as::<_, PromptRow>(
        r#"
        SELECT * FROM prompts
        WHERE ($1::text IS NULL OR $1 = ANY(tags))
        ORDER BY updated_at DESC
        "#,
    )
    .bind(tag)
    .fetch_all(pool)
    .await?)
}

pub async fn get_prompt(pool: &PgPool, id: Uuid) -> Result<Option<PromptRow>> {
    Ok(
        sqlx::query_as::<_, PromptRow>("SELECT * FROM prompts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?,
    )
}

/// Deletes a prompt; its versions, suggestions and scores go with it.
pub async fn delete_prompt(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM prompts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Rebuilds the in-memory ledger for one prompt from its version rows.
pub async fn load_history<'e, E>(executor: E, prompt_id: Uuid) -> Result<VersionHistory>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, PromptVersionRow>(
        "SELECT * FROM prompt_versions WHERE prompt_id = $1 ORDER BY seq ASC",
    )
    .bind(prompt_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Prompt::from).collect())
}
