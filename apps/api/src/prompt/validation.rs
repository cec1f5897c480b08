use crate::errors::AppError;
use crate::prompt::variables::validate_variables;

pub const MAX_NAME_CHARS: usize = 200;
pub const MAX_CONTENT_CHARS: usize = 100_000;
pub const MAX_DESCRIPTION_CHARS: usize = 2_000;
pub const MAX_TAGS: usize = 20;
pub const MAX_TAG_CHARS: usize = 50;
pub const MAX_LABEL_CHARS: usize = 50;

/// Fields submitted on create or update. `None` means "not supplied".
#[derive(Debug, Default)]
pub struct PromptFields<'a> {
    pub name: Option<&'a str>,
    pub content: Option<&'a str>,
    pub description: Option<&'a str>,
    pub tags: Option<&'a [String]>,
    pub version_label: Option<&'a str>,
}

/// Collects every field problem instead of stopping at the first one.
pub fn field_problems(fields: &PromptFields<'_>) -> Vec<String> {
    let mut problems = Vec::new();

    if let Some(name) = fields.name {
        if name.trim().is_empty() {
            problems.push("name must not be empty".to_string());
        } else if name.chars().count() > MAX_NAME_CHARS {
            problems.push(format!("name must be at most {MAX_NAME_CHARS} characters"));
        }
    }

    if let Some(content) = fields.content {
        if content.trim().is_empty() {
            problems.push("content must not be empty".to_string());
        } else if content.chars().count() > MAX_CONTENT_CHARS {
            problems.push(format!(
                "content must be at most {MAX_CONTENT_CHARS} characters"
            ));
        }
    }

    if let Some(description) = fields.description {
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            problems.push(format!(
                "description must be at most {MAX_DESCRIPTION_CHARS} characters"
            ));
        }
    }

    if let Some(tags) = fields.tags {
        if tags.len() > MAX_TAGS {
            problems.push(format!("at most {MAX_TAGS} tags are allowed"));
        }
        for tag in tags {
            if tag.trim().is_empty() {
                problems.push("tags must not be empty".to_string());
            } else if tag.chars().count() > MAX_TAG_CHARS {
                problems.push(format!(
                    "tag '{tag}' must be at most {MAX_TAG_CHARS} characters"
                ));
            }
        }
    }

    if let Some(label) = fields.version_label {
        if let Some(problem) = label_problem(label) {
            problems.push(problem);
        }
    }

    problems
}

/// Version labels are short, non-empty, and contain no whitespace.
pub fn label_problem(label: &str) -> Option<String> {
    if label.is_empty() {
        Some("version label must not be empty".to_string())
    } else if label.chars().any(char::is_whitespace) {
        Some(format!("version label '{label}' must not contain whitespace"))
    } else if label.chars().count() > MAX_LABEL_CHARS {
        Some(format!(
            "version label must be at most {MAX_LABEL_CHARS} characters"
        ))
    } else {
        None
    }
}

/// Rejects templates whose placeholders are undeclared or malformed.
pub fn template_problems(content: &str, declared: &[String]) -> Vec<String> {
    let report = validate_variables(content, declared, None);
    let mut problems = Vec::new();
    if !report.undeclared.is_empty() {
        problems.push(format!(
            "undeclared variables: {}",
            report.undeclared.join(", ")
        ));
    }
    if !report.invalid_names.is_empty() {
        problems.push(format!(
            "invalid variable names: {}",
            report.invalid_names.join(", ")
        ));
    }
    problems
}

/// Runs field and template checks, returning a single validation error.
pub fn validate_prompt(
    fields: &PromptFields<'_>,
    content: &str,
    declared: &[String],
) -> Result<(), AppError> {
    let mut problems = field_problems(fields);
    problems.extend(template_problems(content, declared));
    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::from_problems(&problems))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_valid_fields_pass() {
        let t = tags(&["writing", "email"]);
        let fields = PromptFields {
            name: Some("Cold email"),
            content: Some("Write an email to {{recipient}}"),
            description: Some("Outbound sales"),
            tags: Some(t.as_slice()),
            version_label: Some("v1"),
        };
        assert!(field_problems(&fields).is_empty());
    }

    #[test]
    fn test_unsupplied_fields_are_skipped() {
        assert!(field_problems(&PromptFields::default()).is_empty());
    }

    #[test]
    fn test_blank_name_and_content() {
        let fields = PromptFields {
            name: Some("   "),
            content: Some(""),
            ..Default::default()
        };
        let problems = field_problems(&fields);
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("name"));
        assert!(problems[1].contains("content"));
    }

    #[test]
    fn test_name_too_long() {
        let name = "x".repeat(MAX_NAME_CHARS + 1);
        let fields = PromptFields {
            name: Some(name.as_str()),
            ..Default::default()
        };
        assert_eq!(field_problems(&fields).len(), 1);
    }

    #[test]
    fn test_too_many_tags() {
        let t: Vec<String> = (0..=MAX_TAGS).map(|i| format!("t{i}")).collect();
        let fields = PromptFields {
            tags: Some(t.as_slice()),
            ..Default::default()
        };
        assert!(field_problems(&fields)[0].contains("tags"));
    }

    #[test]
    fn test_empty_tag() {
        let t = tags(&["ok", " "]);
        let fields = PromptFields {
            tags: Some(t.as_slice()),
            ..Default::default()
        };
        assert_eq!(field_problems(&fields), vec!["tags must not be empty"]);
    }

    #[test]
    fn test_label_rules() {
        assert!(label_problem("v2").is_none());
        assert!(label_problem("release-2024.05").is_none());
        assert!(label_problem("").is_some());
        assert!(label_problem("v 2").is_some());
        assert!(label_problem(&"v".repeat(MAX_LABEL_CHARS + 1)).is_some());
    }

    #[test]
    fn test_template_problems_undeclared() {
        let problems = template_problems("Hello {{name}}", &[]);
        assert_eq!(problems, vec!["undeclared variables: name"]);
    }

    #[test]
    fn test_validate_prompt_combines_problems() {
        let fields = PromptFields {
            name: Some(""),
            ..Default::default()
        };
        let err = validate_prompt(&fields, "Use {{bad-name}}", &[]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("name must not be empty"));
        assert!(msg.contains("invalid variable names: bad-name"));
    }
}
