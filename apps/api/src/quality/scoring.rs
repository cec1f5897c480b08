use serde::{Deserialize, Serialize};

use crate::prompt::variables::extract_placeholders;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityWeights {
    pub clarity: f64,
    pub specificity: f64,
    pub structure: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            clarity: 0.4,
            specificity: 0.35,
            structure: 0.25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub clarity: f64,
    pub specificity: f64,
    pub structure: f64,
    pub overall: f64,
    pub vague_terms: Vec<String>,
    pub feedback: Vec<String>,
}

const VAGUE_TERMS: &[&str] = &[
    "something",
    "stuff",
    "things",
    "etc",
    "somehow",
    "maybe",
    "whatever",
    "good",
    "nice",
    "kind of",
    "sort of",
];

const CONSTRAINT_MARKERS: &[&str] = &[
    "must", "should", "only", "exactly", "at most", "at least", "do not", "don't", "never",
    "limit",
];

const EXAMPLE_MARKERS: &[&str] = &["example", "e.g.", "for instance", "such as"];

const FORMAT_MARKERS: &[&str] = &["format", "json", "respond with", "output", "return", "markdown"];

/// Sentences longer than this start losing clarity.
const COMFORTABLE_SENTENCE_WORDS: f64 = 25.0;
const WEAK_THRESHOLD: f64 = 0.6;

/// Scores prompt text on clarity, specificity and structure, each in [0, 1].
///
/// - clarity: sentence length, minus 0.1 per vague term (max 0.4)
/// - specificity: 0.2 base + 0.2 each for numbers, constraints, examples, variables
/// - structure: 0.2 base + 0.2 each for multiple lines, lists, section headers,
///   an output-format instruction
pub fn score_prompt(content: &str, weights: &QualityWeights) -> QualityReport {
    let lower = content.to_lowercase();
    let normalized = normalize(&lower);

    let vague_terms: Vec<String> = VAGUE_TERMS
        .iter()
        .filter(|t| normalized.contains(&format!(" {t} ")))
        .map(|t| t.to_string())
        .collect();

    let clarity = clarity_score(content, vague_terms.len());
    let specificity = specificity_score(content, &lower);
    let structure = structure_score(content, &lower);
    let overall = (weights.clarity * clarity
        + weights.specificity * specificity
        + weights.structure * structure)
        .clamp(0.0, 1.0);

    let mut feedback = Vec::new();
    if clarity < WEAK_THRESHOLD {
        feedback.push(
            "Shorten long sentences and state the task in concrete terms.".to_string(),
        );
    }
    if !vague_terms.is_empty() {
        feedback.push(format!(
            "Replace vague wording: {}.",
            vague_terms.join(", ")
        ));
    }
    if specificity < WEAK_THRESHOLD {
        feedback.push(
            "Add concrete constraints, numbers, or an example of the expected result."
                .to_string(),
        );
    }
    if structure < WEAK_THRESHOLD {
        feedback.push(
            "Split the prompt into sections or a list and state the expected output format."
                .to_string(),
        );
    }

    QualityReport {
        clarity,
        specificity,
        structure,
        overall,
        vague_terms,
        feedback,
    }
}

/// Lowercase text with punctuation collapsed to spaces and padded at both ends,
/// so whole-word lookups can use `contains(" word ")`.
fn normalize(lower: &str) -> String {
    let body: String = lower
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' { c } else { ' ' })
        .collect();
    let words: Vec<&str> = body.split_whitespace().collect();
    format!(" {} ", words.join(" "))
}

fn clarity_score(content: &str, vague_count: usize) -> f64 {
    let words = content.split_whitespace().count();
    if words < 5 {
        return 0.2;
    }
    let sentences = content
        .split(['.', '!', '?', '\n'])
        .filter(|s| !s.trim().is_empty())
        .count()
        .max(1);
    let avg = words as f64 / sentences as f64;
    let length_score = if avg <= COMFORTABLE_SENTENCE_WORDS {
        1.0
    } else {
        (1.0 - (avg - COMFORTABLE_SENTENCE_WORDS) / 50.0).clamp(0.3, 1.0)
    };
    let penalty = (0.1 * vague_count as f64).min(0.4);
    (length_score - penalty).clamp(0.0, 1.0)
}

fn specificity_score(content: &str, lower: &str) -> f64 {
    let checks = [
        content.chars().any(|c| c.is_ascii_digit()),
        CONSTRAINT_MARKERS.iter().any(|m| lower.contains(m)),
        EXAMPLE_MARKERS.iter().any(|m| lower.contains(m)),
        !extract_placeholders(content).is_empty(),
    ];
    step_score(&checks)
}

fn structure_score(content: &str, lower: &str) -> f64 {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let checks = [
        lines.len() >= 2,
        lines.iter().any(|l| is_list_item(l)),
        lines.iter().any(|l| l.starts_with('#') || l.ends_with(':')),
        FORMAT_MARKERS.iter().any(|m| lower.contains(m)),
    ];
    step_score(&checks)
}

fn step_score(checks: &[bool]) -> f64 {
    let hits = checks.iter().filter(|c| **c).count();
    (0.2 + 0.2 * hits as f64).clamp(0.0, 1.0)
}

fn is_list_item(line: &str) -> bool {
    if line.starts_with("- ") || line.starts_with("* ") {
        return true;
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && matches!(line[digits..].chars().next(), Some('.') | Some(')'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRONG_PROMPT: &str = "You are a support assistant.\n\n\
        Task:\n\
        - Summarize the ticket in at most 3 sentences.\n\
        - Name the customer's main problem.\n\n\
        For example, \"Login fails after password reset\".\n\
        Respond with JSON: {\"summary\": string}. Customer: {{customer_name}}";

    #[test]
    fn test_strong_prompt_scores_high() {
        let r = score_prompt(STRONG_PROMPT, &QualityWeights::default());
        assert!((r.specificity - 1.0).abs() < 1e-9, "specificity {}", r.specificity);
        assert!((r.structure - 1.0).abs() < 1e-9, "structure {}", r.structure);
        assert!(r.overall > 0.8, "overall {}", r.overall);
        assert!(r.feedback.is_empty());
    }

    #[test]
    fn test_vague_prompt_scores_low() {
        let r = score_prompt("do something good with the stuff", &QualityWeights::default());
        assert_eq!(r.vague_terms, vec!["something", "stuff", "good"]);
        assert!((r.clarity - 0.7).abs() < 1e-9, "clarity {}", r.clarity);
        assert!((r.overall - 0.40).abs() < 1e-9, "overall {}", r.overall);
        assert!(r.feedback.iter().any(|f| f.contains("vague wording")));
    }

    #[test]
    fn test_vague_terms_match_whole_words_only() {
        let r = score_prompt(
            "Describe the goodwill of the company in two sentences.",
            &QualityWeights::default(),
        );
        assert!(r.vague_terms.is_empty());
    }

    #[test]
    fn test_tiny_prompt_low_clarity() {
        let r = score_prompt("Hi", &QualityWeights::default());
        assert_eq!(r.clarity, 0.2);
        assert!(r.overall >= 0.0 && r.overall <= 1.0);
    }

    #[test]
    fn test_long_sentence_penalized() {
        let sentence = vec!["word"; 75].join(" ");
        let r = score_prompt(&sentence, &QualityWeights::default());
        assert!((r.clarity - 0.3).abs() < 1e-9, "clarity {}", r.clarity);
    }

    #[test]
    fn test_list_item_detection() {
        assert!(is_list_item("- bullet"));
        assert!(is_list_item("12. numbered"));
        assert!(is_list_item("3) numbered"));
        assert!(!is_list_item("2024 was a year"));
        assert!(!is_list_item("-dash"));
    }
}
