//! Suggestion generation — pluggable, trait-based improvement suggestions for a prompt.
//!
//! Default: `OllamaSuggester` (local model via the shared client).
//! Fallback: `HeuristicSuggester` (deterministic, no LLM call), selected with
//! `ENABLE_LLM_SUGGESTIONS=false`.
//!
//! `AppState` holds an `Arc<dyn Suggester>`, chosen at startup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::history::Prompt;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, PLACEHOLDER_INSTRUCTION};
use crate::llm_client::OllamaClient;
use crate::prompt::variables::validate_variables;
use crate::quality::scoring::{score_prompt, QualityWeights};
use crate::suggestions::prompts::{SUGGEST_PROMPT, SUGGEST_SYSTEM};

pub const MAX_SUGGESTIONS: usize = 5;

/// A suggestion before it is stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestionDraft {
    pub category: String,
    pub suggestion: String,
    #[serde(default)]
    pub rationale: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SuggestionEnvelope {
    #[serde(default)]
    suggestions: Vec<SuggestionDraft>,
}

/// Implement this to swap suggestion backends without touching handlers.
#[async_trait]
pub trait Suggester: Send + Sync {
    /// Stored in `prompt_suggestions.source`.
    fn source(&self) -> &'static str;

    async fn suggest(&self, prompt: &Prompt) -> Result<Vec<SuggestionDraft>, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// OllamaSuggester
// ────────────────────────────────────────────────────────────────────────────

pub struct OllamaSuggester(pub OllamaClient);

#[async_trait]
impl Suggester for OllamaSuggester {
    fn source(&self) -> &'static str {
        "llm"
    }

    async fn suggest(&self, prompt: &Prompt) -> Result<Vec<SuggestionDraft>, AppError> {
        let request = build_suggest_prompt(prompt);
        let system = format!("{SUGGEST_SYSTEM} {JSON_ONLY_SYSTEM} {PLACEHOLDER_INSTRUCTION}");

        let envelope: SuggestionEnvelope = self
            .0
            .generate_json(&request, &system)
            .await
            .map_err(|e| AppError::Llm(format!("Failed to generate suggestions: {e}")))?;

        let drafts = clean_drafts(envelope.suggestions);
        debug!(
            "Model {} produced {} suggestions for prompt {}",
            self.0.model(),
            drafts.len(),
            prompt.id
        );
        Ok(drafts)
    }
}

fn build_suggest_prompt(prompt: &Prompt) -> String {
    let variables = if prompt.variables.is_empty() {
        "(none)".to_string()
    } else {
        prompt.variables.join(", ")
    };
    fill_template(
        SUGGEST_PROMPT,
        &[
            ("{max}", MAX_SUGGESTIONS.to_string().as_str()),
            ("{name}", prompt.name.as_str()),
            ("{variables}", variables.as_str()),
            ("{content}", prompt.content.as_str()),
        ],
    )
}

/// Replaces markers in one left-to-right pass over `template`.
/// Substituted text is never scanned again, so user fields stay literal.
fn fill_template(template: &str, markers: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match markers.iter().find(|(marker, _)| rest.starts_with(*marker)) {
            Some((marker, value)) => {
                out.push_str(value);
                rest = &rest[marker.len()..];
            }
            None => {
                out.push('{');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Drops blank entries, normalizes categories, and caps the list.
fn clean_drafts(drafts: Vec<SuggestionDraft>) -> Vec<SuggestionDraft> {
    drafts
        .into_iter()
        .filter(|d| !d.suggestion.trim().is_empty())
        .map(|d| SuggestionDraft {
            category: match d.category.trim().to_lowercase() {
                c if c.is_empty() => "general".to_string(),
                c => c,
            },
            suggestion: d.suggestion.trim().to_string(),
            rationale: d
                .rationale
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
        })
        .take(MAX_SUGGESTIONS)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// HeuristicSuggester
// ────────────────────────────────────────────────────────────────────────────

/// Derives suggestions from the quality report and variable checks.
pub struct HeuristicSuggester;

#[async_trait]
impl Suggester for HeuristicSuggester {
    fn source(&self) -> &'static str {
        "heuristic"
    }

    async fn suggest(&self, prompt: &Prompt) -> Result<Vec<SuggestionDraft>, AppError> {
        Ok(heuristic_suggestions(prompt))
    }
}

fn heuristic_suggestions(prompt: &Prompt) -> Vec<SuggestionDraft> {
    let report = score_prompt(&prompt.content, &QualityWeights::default());
    let variables = validate_variables(&prompt.content, &prompt.variables, None);
    let mut drafts = Vec::new();

    if !report.vague_terms.is_empty() {
        drafts.push(SuggestionDraft {
            category: "clarity".to_string(),
            suggestion: format!(
                "Replace vague wording ({}) with the exact outcome you expect.",
                report.vague_terms.join(", ")
            ),
            rationale: Some("Vague terms leave the model to guess what you mean.".to_string()),
        });
    }
    if report.specificity < 0.6 {
        drafts.push(SuggestionDraft {
            category: "specificity".to_string(),
            suggestion: "Add explicit constraints such as length limits, audience, or an example answer."
                .to_string(),
            rationale: Some(format!("Specificity scored {:.2}.", report.specificity)),
        });
    }
    if report.structure < 0.6 {
        drafts.push(SuggestionDraft {
            category: "structure".to_string(),
            suggestion: "Separate context, task, and output format into labelled sections."
                .to_string(),
            rationale: Some(format!("Structure scored {:.2}.", report.structure)),
        });
    }
    for name in &variables.unused {
        drafts.push(SuggestionDraft {
            category: "variables".to_string(),
            suggestion: format!("Use {{{{{name}}}}} in the content or remove it from the declared variables."),
            rationale: Some("Declared variables that never appear are silently ignored.".to_string()),
        });
    }
    if prompt.description.as_deref().map_or(true, |d| d.trim().is_empty()) {
        drafts.push(SuggestionDraft {
            category: "documentation".to_string(),
            suggestion: "Add a short description of when this prompt should be used.".to_string(),
            rationale: None,
        });
    }

    drafts.truncate(MAX_SUGGESTIONS);
    drafts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_heuristic_flags_vague_unstructured_prompt() {
        let prompt = Prompt::new("notes", "write some stuff about things", "v1");
        let drafts = HeuristicSuggester.suggest(&prompt).await.unwrap();

        let categories: Vec<&str> = drafts.iter().map(|d| d.category.as_str()).collect();
        assert_eq!(
            categories,
            vec!["clarity", "specificity", "structure", "documentation"]
        );
        assert!(drafts[0].suggestion.contains("stuff, things"));
    }

    #[tokio::test]
    async fn test_heuristic_reports_unused_variables() {
        let mut prompt = Prompt::new("greet", "Greet {{name}} warmly.", "v1");
        prompt.variables = vec!["name".to_string(), "tone".to_string()];
        prompt.description = Some("Greeting".to_string());

        let drafts = HeuristicSuggester.suggest(&prompt).await.unwrap();
        let variable_drafts: Vec<_> = drafts.iter().filter(|d| d.category == "variables").collect();
        assert_eq!(variable_drafts.len(), 1);
        assert!(variable_drafts[0].suggestion.starts_with("Use {{tone}}"));
        assert!(drafts.iter().all(|d| d.category != "documentation"));
    }

    #[test]
    fn test_heuristic_source_label() {
        assert_eq!(HeuristicSuggester.source(), "heuristic");
    }

    #[test]
    fn test_clean_drafts_filters_and_caps() {
        let mut drafts = vec![SuggestionDraft {
            category: "  ".to_string(),
            suggestion: " Be specific ".to_string(),
            rationale: Some("   ".to_string()),
        }];
        drafts.push(SuggestionDraft {
            category: "Clarity".to_string(),
            suggestion: "".to_string(),
            rationale: None,
        });
        for i in 0..10 {
            drafts.push(SuggestionDraft {
                category: "Structure".to_string(),
                suggestion: format!("idea {i}"),
                rationale: None,
            });
        }

        let cleaned = clean_drafts(drafts);
        assert_eq!(cleaned.len(), MAX_SUGGESTIONS);
        assert_eq!(cleaned[0].category, "general");
        assert_eq!(cleaned[0].suggestion, "Be specific");
        assert!(cleaned[0].rationale.is_none());
        assert_eq!(cleaned[1].category, "structure");
    }

    #[test]
    fn test_envelope_tolerates_missing_rationale() {
        let raw = r#"{"suggestions":[{"category":"clarity","suggestion":"Name the audience"}]}"#;
        let env: SuggestionEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(env.suggestions.len(), 1);
        assert!(env.suggestions[0].rationale.is_none());
    }

    #[test]
    fn test_build_suggest_prompt_fills_template() {
        let mut prompt = Prompt::new("Summarizer", "Summarize {{text}}", "v1");
        prompt.variables = vec!["text".to_string()];
        let built = build_suggest_prompt(&prompt);
        assert!(built.contains("Summarizer"));
        assert!(built.contains("Summarize {{text}}"));
        assert!(built.contains("VARIABLES: text"));
        assert!(!built.contains("{max}"));
    }

    #[test]
    fn test_user_fields_are_not_expanded() {
        let mut prompt = Prompt::new("{content} and {variables}", "Echo {name} verbatim", "v1");
        prompt.variables = vec!["{max}".to_string()];
        let built = build_suggest_prompt(&prompt);

        assert!(built.contains("PROMPT NAME: {content} and {variables}\n"));
        assert!(built.contains("VARIABLES: {max}\n"));
        assert!(built.contains("Echo {name} verbatim"));
        assert!(built.contains("at most 5 improvements"));
        assert!(built.contains("{{variable}} placeholder"));
    }
}
