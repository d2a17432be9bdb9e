// Question generation: job metadata in, ordered interview questions out.
// All LLM calls go through llm_client.

pub mod generator;
pub mod handlers;
pub mod prompts;
