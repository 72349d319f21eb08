//! Embedding provider trait

use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::error::DomainError;

/// Produces dense vectors for batches of text
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Embed each input, preserving order. The output length always equals
    /// the input length.
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, DomainError>;

    fn provider_name(&self) -> &'static str;
}
