//! Embedding providers for the knowledge base.
//!
//! Every chunk and every query passes through the same provider so their
//! vectors are comparable.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{GeminiProvider, OllamaProvider, TrigramProvider};
