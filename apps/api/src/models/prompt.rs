use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::history::{Prompt, PromptVersion};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PromptRow {
    pub id: Uuid,
    pub name: String,
    pub content: String,
    pub description: Option<String>,
    pub variables: Vec<String>,
    pub tags: Vec<String>,
    pub current_version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PromptVersionRow {
    pub id: Uuid,
    pub prompt_id: Uuid,
    pub seq: i32,
    pub label: String,
    pub name: String,
    pub content: String,
    pub description: Option<String>,
    pub variables: Vec<String>,
    pub tags: Vec<String>,
    pub metadata: Json<BTreeMap<String, String>>,
    pub captured_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<PromptVersionRow> for Prompt {
    fn from(row: PromptVersionRow) -> Self {
        Prompt {
            id: row.prompt_id,
            name: row.name,
            content: row.content,
            description: row.description,
            variables: row.variables,
            tags: row.tags,
            version: PromptVersion {
                label: row.label,
                captured_at: row.captured_at,
                metadata: row.metadata.0,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SuggestionRow {
    pub id: Uuid,
    pub prompt_id: Uuid,
    pub version_label: String,
    pub category: String,
    pub suggestion: String,
    pub rationale: Option<String>,
    pub source: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QualityScoreRow {
    pub id: Uuid,
    pub prompt_id: Uuid,
    pub version_label: String,
    pub clarity: f64,
    pub specificity: f64,
    pub structure: f64,
    pub overall: f64,
    pub feedback: Vec<String>,
    pub created_at: DateTime<Utc>,
}
