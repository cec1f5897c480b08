// Shared prompt fragments for every LLM call.
// Each service that calls the model keeps its own prompts.rs alongside it.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps the model from rewriting template placeholders.
pub const PLACEHOLDER_INSTRUCTION: &str = "\
    Template variables are written as {{name}}. \
    Never rename, remove, or fill in a placeholder unless the suggestion is explicitly about it.";
