//! Document and chunk entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;

/// Lifecycle state of an ingested document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    /// Completed and Failed are terminal; a document never leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A document registered with the ingestion pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    id: Uuid,
    owner_id: String,
    name: String,
    status: DocumentStatus,
    error_message: Option<String>,
    chunk_count: usize,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Document {
    /// Register a new document in the Processing state.
    pub fn new(owner_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            name: name.into(),
            status: DocumentStatus::Processing,
            error_message: None,
            chunk_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to Completed with the final chunk count.
    pub fn into_completed(mut self, chunk_count: usize) -> Result<Self, DomainError> {
        self.ensure_not_terminal()?;
        self.status = DocumentStatus::Completed;
        self.chunk_count = chunk_count;
        self.error_message = None;
        self.updated_at = Utc::now();
        Ok(self)
    }

    /// Transition to Failed with a diagnostic message.
    pub fn into_failed(mut self, message: impl Into<String>) -> Result<Self, DomainError> {
        self.ensure_not_terminal()?;
        self.status = DocumentStatus::Failed;
        self.error_message = Some(message.into());
        self.updated_at = Utc::now();
        Ok(self)
    }

    fn ensure_not_terminal(&self) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::validation(format!(
                "Document {} is already in terminal status {:?}",
                self.id, self.status
            )));
        }
        Ok(())
    }

    // Getters

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// An embedded chunk of a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: Uuid,
    pub document_id: Uuid,
    /// Position of the chunk within its document, starting at zero
    pub index: usize,
    pub content: String,
    pub embedding: Vec<f32>,
    /// Character span of the chunk in the extracted source text
    pub start: usize,
    pub end: usize,
}

impl DocumentChunk {
    pub fn new(
        document_id: Uuid,
        index: usize,
        content: impl Into<String>,
        embedding: Vec<f32>,
        start: usize,
        end: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            index,
            content: content.into(),
            embedding,
            start,
            end,
        }
    }
}
