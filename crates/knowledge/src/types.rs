//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// One page worth of cleaned text from a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Whitespace-normalized page text
    pub content: String,

    /// Logical document name
    pub source: String,

    /// 1-based page number within the source
    pub page: u32,
}

impl TextChunk {
    pub fn new(content: impl Into<String>, source: impl Into<String>, page: u32) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            page,
        }
    }

    /// Whether the chunk has any non-whitespace content.
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// Stable identifier derived from source, page and content.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.source.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.page.to_le_bytes());
        hasher.update(self.content.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// A chunk paired with its embedding, as stored in a vector index.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    /// Fingerprint of the chunk
    pub id: String,

    pub chunk: TextChunk,

    /// Embedding vector
    pub embedding: Vec<f32>,
}

impl IndexedChunk {
    pub fn new(chunk: TextChunk, embedding: Vec<f32>) -> Self {
        Self {
            id: chunk.fingerprint(),
            chunk,
            embedding,
        }
    }
}

/// All chunks extracted from one document.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Logical document name
    pub name: String,

    /// File the chunks came from
    pub path: PathBuf,

    /// Chunks in page order
    pub chunks: Vec<TextChunk>,
}

/// Counts reported by a vector index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of distinct sources
    pub sources: usize,

    /// Number of stored chunks
    pub chunks: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = TextChunk::new("Order VII Rule 1", "CPC", 4);
        let b = TextChunk::new("Order VII Rule 1", "CPC", 4);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_fingerprint_depends_on_page() {
        let a = TextChunk::new("Same text", "CPC", 1);
        let b = TextChunk::new("Same text", "CPC", 2);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_has_content() {
        assert!(TextChunk::new("x", "s", 1).has_content());
        assert!(!TextChunk::new(" \t\n", "s", 1).has_content());
    }
}
