//! Version History — append-only, in-memory ledger of prompt snapshots.
//!
//! Every entry is an owned clone taken at capture time, so later edits to the
//! caller's `Prompt` never reach the ledger and no two entries share state.
//! A ledger is scoped to one request: handlers rebuild it from the
//! `prompt_versions` rows, operate on it, then persist whatever was appended.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// Immutable descriptor identifying one snapshot of a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptVersion {
    pub label: String,
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl PromptVersion {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            captured_at: Utc::now(),
            metadata: BTreeMap::new(),
        }
    }
}

/// The live, mutable prompt a caller works on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: Uuid,
    pub name: String,
    pub content: String,
    pub description: Option<String>,
    pub variables: Vec<String>,
    pub tags: Vec<String>,
    pub version: PromptVersion,
}

impl Prompt {
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            content: content.into(),
            description: None,
            variables: Vec::new(),
            tags: Vec::new(),
            version: PromptVersion::new(label),
        }
    }
}

/// Chronological record of a prompt's states.
///
/// `versions[i]` always describes `snapshots[i]`; both sequences only grow.
#[derive(Debug, Clone, Default)]
pub struct VersionHistory {
    versions: Vec<PromptVersion>,
    snapshots: Vec<Prompt>,
}

impl VersionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots `prompt` as the newest entry.
    ///
    /// Duplicate labels are accepted; lookups resolve to the first match.
    pub fn add_version(&mut self, prompt: &Prompt) {
        if self.contains_label(&prompt.version.label) {
            warn!(
                "Prompt {} recorded duplicate version label '{}'",
                prompt.id, prompt.version.label
            );
        }
        self.append(prompt.clone());
    }

    /// Returns a copy of the first snapshot recorded under `label`.
    pub fn get_version(&self, label: &str) -> Option<Prompt> {
        self.snapshots
            .iter()
            .find(|p| p.version.label == label)
            .cloned()
    }

    /// All recorded labels, oldest first, duplicates included.
    pub fn list_versions(&self) -> Vec<&str> {
        self.versions.iter().map(|v| v.label.as_str()).collect()
    }

    /// Re-appends the snapshot recorded under `label` as the newest entry and
    /// returns a copy of it. Leaves the ledger untouched when `label` is absent.
    pub fn rollback(&mut self, label: &str) -> Option<Prompt> {
        let restored = self.get_version(label)?;
        self.append(restored.clone());
        Some(restored)
    }

    pub fn latest(&self) -> Option<&Prompt> {
        self.snapshots.last()
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.versions.iter().any(|v| v.label == label)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    fn append(&mut self, prompt: Prompt) {
        self.versions.push(prompt.version.clone());
        self.snapshots.push(prompt);
        debug_assert_eq!(self.versions.len(), self.snapshots.len());
    }
}

impl FromIterator<Prompt> for VersionHistory {
    fn from_iter<I: IntoIterator<Item = Prompt>>(iter: I) -> Self {
        let mut history = VersionHistory::new();
        for prompt in iter {
            history.append(prompt);
        }
        history
    }
}
