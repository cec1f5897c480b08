// Suggestion LLM prompt templates.

pub const SUGGEST_SYSTEM: &str = "\
You are an expert prompt engineer reviewing prompts written for large language models. \
Suggest concrete, actionable edits that make the prompt clearer, more specific, and better structured. \
Do not rewrite the whole prompt.";

pub const SUGGEST_PROMPT: &str = r#"Review the following prompt and suggest at most {max} improvements.

PROMPT NAME: {name}
VARIABLES: {variables}

PROMPT CONTENT:
{content}

OUTPUT SCHEMA (return exactly this structure):
{
  "suggestions": [
    {
      "category": "clarity" | "specificity" | "structure" | "variables" | "safety" | "general",
      "suggestion": "string — the concrete edit to make",
      "rationale": "string — why it improves the prompt"
    }
  ]
}

RULES:
1. Each suggestion must be a single, specific change.
2. Keep every {{variable}} placeholder intact.
3. Return an empty list if the prompt needs no changes.
4. Return ONLY the JSON object — nothing else, no code fences."#;
