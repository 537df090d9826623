//! In-memory vector index with brute-force cosine search.

use crate::types::{IndexStats, IndexedChunk, TextChunk};
use crate::vector_index::{cosine_similarity, VectorIndex};
use juris_core::AppResult;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Vector index held entirely in memory.
///
/// Insertion order is preserved; equal scores keep that order in search
/// results.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    chunks: Vec<IndexedChunk>,
    positions: HashMap<String, usize>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl VectorIndex for MemoryIndex {
    fn upsert_chunk(&mut self, chunk: IndexedChunk) -> AppResult<()> {
        match self.positions.get(&chunk.id) {
            Some(&pos) => {
                tracing::trace!("Replacing chunk {}", chunk.id);
                self.chunks[pos] = chunk;
            }
            None => {
                self.positions.insert(chunk.id.clone(), self.chunks.len());
                self.chunks.push(chunk);
            }
        }
        Ok(())
    }

    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<(TextChunk, f32)>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, c)| (i, cosine_similarity(query_embedding, &c.embedding)))
            .collect();

        // Stable sort, so ties stay in insertion order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| (self.chunks[i].chunk.clone(), score))
            .collect())
    }

    fn stats(&self) -> AppResult<IndexStats> {
        let sources: HashSet<&str> = self
            .chunks
            .iter()
            .map(|c| c.chunk.source.as_str())
            .collect();

        Ok(IndexStats {
            sources: sources.len(),
            chunks: self.chunks.len(),
        })
    }

    fn reset(&mut self) -> AppResult<()> {
        self.chunks.clear();
        self.positions.clear();
        Ok(())
    }
}
