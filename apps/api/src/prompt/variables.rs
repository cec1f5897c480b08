//! Template variables — `{{name}}` placeholder extraction, validation, and rendering.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VariableReport {
    pub valid: bool,
    /// Every placeholder in first-occurrence order, without repeats.
    pub placeholders: Vec<String>,
    /// Used in the content but not declared.
    pub undeclared: Vec<String>,
    /// Declared but never used. Reported only; does not invalidate.
    pub unused: Vec<String>,
    pub invalid_names: Vec<String>,
    /// Populated only when values were supplied.
    pub missing_values: Vec<String>,
}

/// A placeholder occurrence: byte span of the whole `{{ .. }}` plus its trimmed name.
struct Placeholder<'a> {
    start: usize,
    end: usize,
    name: &'a str,
}

fn scan(content: &str) -> Vec<Placeholder<'_>> {
    let mut found = Vec::new();
    let mut cursor = 0;
    while let Some(open) = content[cursor..].find(OPEN) {
        let start = cursor + open;
        let inner_start = start + OPEN.len();
        let Some(close) = content[inner_start..].find(CLOSE) else {
            break; // unterminated
        };
        let end = inner_start + close + CLOSE.len();
        found.push(Placeholder {
            start,
            end,
            name: content[inner_start..inner_start + close].trim(),
        });
        cursor = end;
    }
    found
}

/// Returns placeholder names in first-occurrence order, without repeats.
pub fn extract_placeholders(content: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for p in scan(content) {
        if !names.iter().any(|n| n == p.name) {
            names.push(p.name.to_string());
        }
    }
    names
}

/// ASCII letter or `_`, followed by ASCII alphanumerics or `_`.
pub fn is_valid_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Checks `content` against the declared variables and, optionally, supplied values.
pub fn validate_variables(
    content: &str,
    declared: &[String],
    values: Option<&HashMap<String, String>>,
) -> VariableReport {
    let placeholders = extract_placeholders(content);

    let invalid_names: Vec<String> = placeholders
        .iter()
        .chain(declared.iter())
        .filter(|n| !is_valid_variable_name(n))
        .fold(Vec::new(), |mut acc, n| {
            if !acc.contains(n) {
                acc.push(n.clone());
            }
            acc
        });

    let used: Vec<&String> = placeholders
        .iter()
        .filter(|n| is_valid_variable_name(n))
        .collect();

    let undeclared = used
        .iter()
        .filter(|n| !declared.contains(n))
        .map(|n| n.to_string())
        .collect::<Vec<_>>();

    let unused = declared
        .iter()
        .filter(|d| is_valid_variable_name(d) && !placeholders.contains(d))
        .cloned()
        .collect();

    let missing_values = match values {
        Some(values) => used
            .iter()
            .filter(|n| !values.contains_key(n.as_str()))
            .map(|n| n.to_string())
            .collect(),
        None => Vec::new(),
    };

    VariableReport {
        valid: undeclared.is_empty() && invalid_names.is_empty() && missing_values.is_empty(),
        placeholders,
        undeclared,
        unused,
        invalid_names,
        missing_values,
    }
}

/// Substitutes every well-formed placeholder with its value.
/// Malformed placeholders are left verbatim. Fails with the missing names.
pub fn render(content: &str, values: &HashMap<String, String>) -> Result<String, Vec<String>> {
    let mut out = String::with_capacity(content.len());
    let mut missing: Vec<String> = Vec::new();
    let mut cursor = 0;

    for p in scan(content) {
        out.push_str(&content[cursor..p.start]);
        if is_valid_variable_name(p.name) {
            match values.get(p.name) {
                Some(v) => out.push_str(v),
                None => {
                    if !missing.iter().any(|m| m == p.name) {
                        missing.push(p.name.to_string());
                    }
                }
            }
        } else {
            out.push_str(&content[p.start..p.end]);
        }
        cursor = p.end;
    }
    out.push_str(&content[cursor..]);

    if missing.is_empty() {
        Ok(out)
    } else {
        Err(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_dedups_and_trims() {
        let content = "Hi {{ name }}, welcome to {{place}}. Bye {{name}}!";
        assert_eq!(extract_placeholders(content), names(&["name", "place"]));
    }

    #[test]
    fn test_extract_ignores_unterminated() {
        assert_eq!(extract_placeholders("Hello {{name"), Vec::<String>::new());
        assert_eq!(extract_placeholders("{{a}} then {{b"), names(&["a"]));
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_variable_name("user_name"));
        assert!(is_valid_variable_name("_private"));
        assert!(is_valid_variable_name("item2"));
        assert!(!is_valid_variable_name("2fast"));
        assert!(!is_valid_variable_name("first-name"));
        assert!(!is_valid_variable_name(""));
    }

    #[test]
    fn test_report_all_declared() {
        let r = validate_variables(
            "Summarize {{text}} in {{words}} words",
            &names(&["text", "words"]),
            None,
        );
        assert!(r.valid);
        assert!(r.undeclared.is_empty());
        assert!(r.unused.is_empty());
    }

    #[test]
    fn test_report_undeclared_and_unused() {
        let r = validate_variables(
            "Translate {{text}} to {{lang}}",
            &names(&["text", "tone"]),
            None,
        );
        assert!(!r.valid);
        assert_eq!(r.undeclared, names(&["lang"]));
        assert_eq!(r.unused, names(&["tone"]));
    }

    #[test]
    fn test_unused_alone_stays_valid() {
        let r = validate_variables("Static prompt", &names(&["extra"]), None);
        assert!(r.valid);
        assert_eq!(r.unused, names(&["extra"]));
    }

    #[test]
    fn test_report_invalid_names() {
        let r = validate_variables("Use {{first-name}} here", &[], None);
        assert!(!r.valid);
        assert_eq!(r.invalid_names, names(&["first-name"]));
        assert!(r.undeclared.is_empty());
    }

    #[test]
    fn test_report_missing_values() {
        let r = validate_variables(
            "{{a}} and {{b}}",
            &names(&["a", "b"]),
            Some(&values(&[("a", "1")])),
        );
        assert!(!r.valid);
        assert_eq!(r.missing_values, names(&["b"]));
    }

    #[test]
    fn test_render_substitutes_all_occurrences() {
        let out = render("{{x}} + {{ x }} = {{y}}", &values(&[("x", "1"), ("y", "2")])).unwrap();
        assert_eq!(out, "1 + 1 = 2");
    }

    #[test]
    fn test_render_reports_missing() {
        let err = render("Dear {{name}}, {{closing}}", &values(&[("name", "Ada")])).unwrap_err();
        assert_eq!(err, names(&["closing"]));
    }

    #[test]
    fn test_render_keeps_malformed_placeholders() {
        let out = render("Keep {{not-valid}} and {{ok}}", &values(&[("ok", "yes")])).unwrap();
        assert_eq!(out, "Keep {{not-valid}} and yes");
    }
}
