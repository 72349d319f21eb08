pub mod chunker;
pub mod extract;

pub use chunker::{chunk_text, Chunk, ChunkingConfig};
pub use extract::extract_text;
