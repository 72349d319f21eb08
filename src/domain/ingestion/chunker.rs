//! Fixed-size sliding-window chunking
//!
//! Windows are measured in characters, not bytes, so multi-byte text never
//! splits inside a code point. Consecutive chunks overlap by
//! `chunk_overlap` characters.

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Chunking parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, DomainError> {
        let config = Self {
            chunk_size,
            chunk_overlap,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.chunk_size == 0 {
            return Err(DomainError::validation("Chunk size must be greater than zero"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(DomainError::validation(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// A chunk of extracted text with its character span in the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    /// Character offset of the first character, inclusive
    pub start: usize,
    /// Character offset past the last character, exclusive
    pub end: usize,
}

/// Split `text` into overlapping windows.
///
/// Empty input yields no chunks. Input no longer than the window yields a
/// single chunk covering the whole text.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>, DomainError> {
    config.validate()?;

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Ok(Vec::new());
    }

    let window = config.chunk_size;
    let step = window - config.chunk_overlap;

    let mut chunks = Vec::new();
    let mut start = 0usize;

    loop {
        let end = usize::min(start + window, chars.len());
        chunks.push(Chunk {
            content: chars[start..end].iter().collect(),
            start,
            end,
        });

        if end == chars.len() {
            break;
        }
        start += step;
    }

    Ok(chunks)
}
