pub mod documents;
pub mod embedding;
pub mod guardrail;
pub mod llm;
pub mod logging;
pub mod workflow;
