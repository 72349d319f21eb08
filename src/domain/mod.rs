pub mod documents;
pub mod embedding;
pub mod error;
pub mod guardrail;
pub mod ingestion;
pub mod llm;
pub mod workflow;

pub use error::DomainError;
