//! Text extraction from raw document bytes

use crate::domain::error::DomainError;

/// Decode raw bytes into trimmed text.
///
/// Invalid UTF-8 sequences are replaced rather than rejected. A document
/// that decodes to nothing but whitespace is an ingestion error.
pub fn extract_text(bytes: &[u8]) -> Result<String, DomainError> {
    let text = String::from_utf8_lossy(bytes).trim().to_string();

    if text.is_empty() {
        return Err(DomainError::ingestion("Document contains no extractable text"));
    }

    Ok(text)
}
