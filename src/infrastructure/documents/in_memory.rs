//! In-memory document store
//!
//! Documents and chunks live behind one lock so a chunk batch commits
//! atomically with respect to readers.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::documents::{Document, DocumentChunk, DocumentStatus, DocumentStore};
use crate::domain::error::DomainError;

#[derive(Debug, Default)]
struct StoreState {
    documents: HashMap<Uuid, Document>,
    chunks: HashMap<Uuid, Vec<DocumentChunk>>,
}

/// Document store backed by maps
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    state: RwLock<StoreState>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(&self, document: Document) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        if state.documents.contains_key(&document.id()) {
            return Err(DomainError::validation(format!(
                "Document {} already exists",
                document.id()
            )));
        }
        state.documents.insert(document.id(), document);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Document, DomainError> {
        let state = self.state.read().await;
        state
            .documents
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("Document not found: {}", id)))
    }

    async fn mark_completed(&self, id: Uuid, chunk_count: usize) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let document = state
            .documents
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("Document not found: {}", id)))?;

        let updated = document.into_completed(chunk_count)?;
        state.documents.insert(id, updated);
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let document = state
            .documents
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("Document not found: {}", id)))?;

        let updated = document.into_failed(error)?;
        state.documents.insert(id, updated);
        Ok(())
    }

    async fn insert_chunks(
        &self,
        document_id: Uuid,
        chunks: Vec<DocumentChunk>,
    ) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        if !state.documents.contains_key(&document_id) {
            return Err(DomainError::not_found(format!(
                "Document not found: {}",
                document_id
            )));
        }
        state.chunks.insert(document_id, chunks);
        Ok(())
    }

    async fn completed_documents(&self, owner_id: &str) -> Result<Vec<Document>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .documents
            .values()
            .filter(|d| d.owner_id() == owner_id && d.status() == DocumentStatus::Completed)
            .cloned()
            .collect())
    }

    async fn chunks_for_documents(&self, ids: &[Uuid]) -> Result<Vec<DocumentChunk>, DomainError> {
        let state = self.state.read().await;
        let mut result = Vec::new();
        for id in ids {
            if let Some(chunks) = state.chunks.get(id) {
                result.extend(chunks.iter().cloned());
            }
        }
        Ok(result)
    }
}
