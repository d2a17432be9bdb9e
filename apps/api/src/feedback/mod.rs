// Feedback: transcript in, structured assessment out, persisted per candidate.
// All LLM calls go through llm_client.

pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod report;
pub mod store;
