//! Knowledge base for the Juris assistant.
//!
//! Loads legal PDFs into page chunks, embeds them, and serves similarity
//! search over an in-memory index.

pub mod embeddings;
pub mod loader;
pub mod memory_index;
pub mod progress;
pub mod types;
pub mod vector_index;
pub mod vector_store;

pub use embeddings::{create_provider, EmbeddingProvider};
pub use loader::{clean_text, DocumentLoader, PageExtractor, PdfPageExtractor};
pub use memory_index::MemoryIndex;
pub use progress::{Phase, ProgressCallback, ProgressEvent, ProgressReporter};
pub use types::{IndexStats, IndexedChunk, LoadedDocument, TextChunk};
pub use vector_index::VectorIndex;
pub use vector_store::{Retriever, VectorStore, DEFAULT_BATCH_SIZE, DEFAULT_TOP_K};
