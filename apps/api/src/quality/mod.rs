// Prompt quality scoring: deterministic heuristics plus stored score history.

pub mod handlers;
pub mod scoring;
