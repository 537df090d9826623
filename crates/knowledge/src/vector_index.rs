//! Vector index abstraction for knowledge chunks.

use crate::types::{IndexStats, IndexedChunk, TextChunk};
use juris_core::AppResult;

/// Storage of embedded chunks searchable by similarity.
///
/// [`MemoryIndex`](crate::MemoryIndex) keeps everything for the life of
/// the process.
pub trait VectorIndex: Send + Sync {
    /// Insert a chunk, replacing any stored chunk with the same id.
    fn upsert_chunk(&mut self, chunk: IndexedChunk) -> AppResult<()>;

    /// Search for the top-k most similar chunks to the query embedding.
    ///
    /// Returns chunks ordered by descending similarity score.
    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<(TextChunk, f32)>>;

    /// Get statistics about the index.
    fn stats(&self) -> AppResult<IndexStats>;

    /// Reset the index, removing all chunks.
    fn reset(&mut self) -> AppResult<()>;

    /// Commit any pending changes (for backends that buffer writes).
    fn flush(&mut self) -> AppResult<()> {
        Ok(())
    }
}

/// Cosine similarity of two vectors; 0.0 for mismatched lengths or zero
/// vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
