//! Vector store: embeds chunks into an index and answers similarity
//! queries against it.

use crate::embeddings::EmbeddingProvider;
use crate::memory_index::MemoryIndex;
use crate::progress::ProgressReporter;
use crate::types::{IndexStats, IndexedChunk, TextChunk};
use crate::vector_index::VectorIndex;
use juris_core::{AppError, AppResult};
use std::sync::Arc;

/// Number of chunks returned when the caller does not say otherwise.
pub const DEFAULT_TOP_K: usize = 3;

/// Texts sent per embedding call unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Source of relevant passages for a query.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `k` chunks most relevant to `query`, best first.
    async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<TextChunk>>;
}

/// Embedding-backed chunk store.
///
/// Searching is only allowed once at least one [`ingest`](Self::ingest)
/// call has succeeded. Later ingests append to the existing index.
pub struct VectorStore {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Box<dyn VectorIndex>,
    batch_size: usize,
    initialized: bool,
    progress: ProgressReporter,
}

impl VectorStore {
    /// Store backed by an in-memory index.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_index(embedder, Box::new(MemoryIndex::new()))
    }

    pub fn with_index(embedder: Arc<dyn EmbeddingProvider>, index: Box<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            batch_size: DEFAULT_BATCH_SIZE,
            initialized: false,
            progress: ProgressReporter::noop(),
        }
    }

    /// Set the number of texts per embedding request (minimum 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Embed and index chunks, returning how many were indexed.
    ///
    /// Chunks whose content is blank are skipped.
    ///
    /// # Errors
    /// - `AppError::NoValidContent` if `chunks` is empty or every chunk is blank
    /// - any embedding provider error; nothing from the failing call is kept
    pub async fn ingest(&mut self, chunks: Vec<TextChunk>) -> AppResult<usize> {
        if chunks.is_empty() {
            return Err(AppError::NoValidContent(
                "No documents provided for embedding".to_string(),
            ));
        }

        let submitted = chunks.len();
        let valid: Vec<TextChunk> = chunks.into_iter().filter(|c| c.has_content()).collect();
        if valid.is_empty() {
            return Err(AppError::NoValidContent(
                "No valid documents found with content".to_string(),
            ));
        }
        if valid.len() < submitted {
            tracing::warn!("Skipped {} blank chunks", submitted - valid.len());
        }

        let total = valid.len() as u64;
        let model = self.embedder.model_name().to_string();
        tracing::info!(
            "Embedding {} chunks using provider '{}' (model: {})",
            valid.len(),
            self.embedder.provider_name(),
            model
        );

        let mut embedded = Vec::with_capacity(valid.len());
        for batch in valid.chunks(self.batch_size) {
            self.progress.embed(embedded.len() as u64, Some(total), &model);

            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;
            if embeddings.len() != batch.len() {
                return Err(AppError::Knowledge(format!(
                    "Embedding provider returned {} vectors for {} chunks",
                    embeddings.len(),
                    batch.len()
                )));
            }

            embedded.extend(
                batch
                    .iter()
                    .cloned()
                    .zip(embeddings)
                    .map(|(chunk, embedding)| IndexedChunk::new(chunk, embedding)),
            );
        }
        self.progress.embed(total, Some(total), &model);

        for (i, chunk) in embedded.into_iter().enumerate() {
            self.index.upsert_chunk(chunk)?;
            if (i + 1) % 100 == 0 {
                self.progress.index(i as u64 + 1, Some(total));
            }
        }
        self.index.flush()?;
        self.progress.index(total, Some(total));

        self.initialized = true;
        tracing::info!("Indexed {} chunks ({} stored)", total, self.len());

        Ok(valid.len())
    }

    /// Up to `k` chunks most similar to `query`, best first.
    ///
    /// # Errors
    /// `AppError::NotInitialized` before the first successful ingest.
    pub async fn search(&self, query: &str, k: usize) -> AppResult<Vec<TextChunk>> {
        Ok(self
            .search_with_scores(query, k)
            .await?
            .into_iter()
            .map(|(chunk, _)| chunk)
            .collect())
    }

    /// Like [`search`](Self::search), with cosine similarity scores.
    pub async fn search_with_scores(&self, query: &str, k: usize) -> AppResult<Vec<(TextChunk, f32)>> {
        if !self.initialized {
            return Err(AppError::NotInitialized(
                "Vector store not initialized. Please add documents first.".to_string(),
            ));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed_query(query).await?;
        let results = self.index.search(&query_embedding, k)?;

        if let (Some(first), Some(last)) = (results.first(), results.last()) {
            tracing::debug!(
                "Retrieved {} chunks (top score: {:.3}, lowest: {:.3})",
                results.len(),
                first.1,
                last.1
            );
        }

        Ok(results)
    }

    /// Number of stored chunks.
    pub fn len(&self) -> usize {
        self.stats().chunks
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn stats(&self) -> IndexStats {
        self.index.stats().unwrap_or_default()
    }

    /// Drop every stored chunk; searching fails again until the next ingest.
    pub fn reset(&mut self) -> AppResult<()> {
        self.index.reset()?;
        self.initialized = false;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Retriever for VectorStore {
    async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<TextChunk>> {
        self.search(query, k).await
    }
}
