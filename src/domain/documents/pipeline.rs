//! Document ingestion and retrieval pipeline
//!
//! Ingestion is staged: the document is registered as Processing, every
//! chunk is embedded, and only then are the chunks committed as a single
//! batch before the document is marked Completed. A failure at any stage
//! leaves the document Failed with zero stored chunks, never partially
//! ingested.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::entity::{Document, DocumentChunk};
use super::store::DocumentStore;
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::error::DomainError;
use crate::domain::ingestion::{chunk_text, extract_text, ChunkingConfig};

/// A chunk returned from similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub content: String,
    pub similarity: f32,
    pub document_id: Uuid,
}

/// Similarity search over an owner's completed documents
#[async_trait]
pub trait Retriever: Send + Sync + Debug {
    async fn retrieve(
        &self,
        owner_id: &str,
        query: &str,
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<RetrievedChunk>, DomainError>;
}

/// Ingestion and retrieval over a document store and embedding provider
#[derive(Debug)]
pub struct DocumentPipeline {
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    chunking: ChunkingConfig,
}

impl DocumentPipeline {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        chunking: ChunkingConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            chunking,
        }
    }

    /// Ingest a raw document for `owner_id`.
    ///
    /// Always returns the new document id when registration succeeds;
    /// processing failures are captured in the document's status rather
    /// than the return value.
    pub async fn ingest(
        &self,
        owner_id: &str,
        name: &str,
        bytes: &[u8],
    ) -> Result<Uuid, DomainError> {
        let document = Document::new(owner_id, name);
        let document_id = document.id();
        self.store.create(document).await?;

        match self.process(document_id, bytes).await {
            Ok(chunk_count) => {
                self.store.mark_completed(document_id, chunk_count).await?;
                debug!(
                    "Ingested document {} with {} chunks",
                    document_id, chunk_count
                );
            }
            Err(e) => {
                warn!("Ingestion failed for document {}: {}", document_id, e);
                if let Err(mark_err) = self.store.mark_failed(document_id, &e.to_string()).await {
                    warn!(
                        "Failed to mark document {} as failed: {}",
                        document_id, mark_err
                    );
                }
            }
        }

        Ok(document_id)
    }

    async fn process(&self, document_id: Uuid, bytes: &[u8]) -> Result<usize, DomainError> {
        let text = extract_text(bytes)?;
        let chunks = chunk_text(&text, &self.chunking)?;

        let contents: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&contents).await?;

        if embeddings.len() != chunks.len() {
            return Err(DomainError::provider(
                self.embedder.provider_name(),
                format!(
                    "Embedding count {} does not match chunk count {}",
                    embeddings.len(),
                    chunks.len()
                ),
            ));
        }

        let records: Vec<DocumentChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(index, (chunk, embedding))| {
                DocumentChunk::new(
                    document_id,
                    index,
                    chunk.content,
                    embedding,
                    chunk.start,
                    chunk.end,
                )
            })
            .collect();

        let count = records.len();
        self.store.insert_chunks(document_id, records).await?;

        Ok(count)
    }

    pub async fn document(&self, id: Uuid) -> Result<Document, DomainError> {
        self.store.get(id).await
    }
}

#[async_trait]
impl Retriever for DocumentPipeline {
    /// Search the owner's Completed documents by cosine similarity.
    ///
    /// An owner with no completed documents gets an empty result without
    /// an embedding call.
    async fn retrieve(
        &self,
        owner_id: &str,
        query: &str,
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<RetrievedChunk>, DomainError> {
        let documents = self.store.completed_documents(owner_id).await?;
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self
            .embedder
            .embed_batch(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                DomainError::provider(
                    self.embedder.provider_name(),
                    "Embedding provider returned no vector for the query",
                )
            })?;

        let ids: Vec<Uuid> = documents.iter().map(|d| d.id()).collect();
        let chunks = self.store.chunks_for_documents(&ids).await?;

        let mut scored: Vec<RetrievedChunk> = chunks
            .into_iter()
            .filter_map(|chunk| {
                let similarity = cosine_similarity(&query_embedding, &chunk.embedding);
                if similarity >= threshold {
                    Some(RetrievedChunk {
                        content: chunk.content,
                        similarity,
                        document_id: chunk.document_id,
                    })
                } else {
                    None
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);

        Ok(scored)
    }
}

/// Cosine similarity between two vectors. Mismatched lengths or a
/// zero-magnitude vector score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
