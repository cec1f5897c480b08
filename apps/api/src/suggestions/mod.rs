// AI-assisted improvement suggestions. All LLM calls go through llm_client.

pub mod generator;
pub mod handlers;
pub mod prompts;
