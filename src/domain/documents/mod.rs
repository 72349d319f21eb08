pub mod entity;
pub mod pipeline;
pub mod store;

pub use entity::{Document, DocumentChunk, DocumentStatus};
pub use pipeline::{cosine_similarity, DocumentPipeline, RetrievedChunk, Retriever};
pub use store::DocumentStore;
