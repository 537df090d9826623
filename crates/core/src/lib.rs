//! Juris Core Library
//!
//! This crate provides the foundational utilities shared by every Juris crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management and the API key format check

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{validate_api_key, AppConfig, DocumentSpec, EmbeddingSettings};
pub use error::{AppError, AppResult};
