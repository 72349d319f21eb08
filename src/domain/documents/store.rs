//! Document store trait

use async_trait::async_trait;
use std::fmt::Debug;
use uuid::Uuid;

use super::entity::{Document, DocumentChunk};
use crate::domain::error::DomainError;

/// Persistence for documents and their embedded chunks
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    async fn create(&self, document: Document) -> Result<(), DomainError>;

    async fn get(&self, id: Uuid) -> Result<Document, DomainError>;

    /// Move a Processing document to Completed. Errors if the document is
    /// already terminal.
    async fn mark_completed(&self, id: Uuid, chunk_count: usize) -> Result<(), DomainError>;

    /// Move a Processing document to Failed. Errors if the document is
    /// already terminal.
    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), DomainError>;

    /// Persist all chunks of a document as one batch. Either every chunk is
    /// stored or none are.
    async fn insert_chunks(
        &self,
        document_id: Uuid,
        chunks: Vec<DocumentChunk>,
    ) -> Result<(), DomainError>;

    /// All Completed documents belonging to `owner_id`.
    async fn completed_documents(&self, owner_id: &str) -> Result<Vec<Document>, DomainError>;

    /// All chunks of the given documents.
    async fn chunks_for_documents(&self, ids: &[Uuid]) -> Result<Vec<DocumentChunk>, DomainError>;
}
