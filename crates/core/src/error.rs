//! Error types for the Juris assistant.
//!
//! This module defines a unified error enum covering document loading,
//! retrieval, configuration, LLM, and prompt failures. Loader and vector
//! store errors carry their own variants so callers can tell a missing file
//! apart from an empty one or from a search issued before ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for the Juris assistant.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// A document file does not exist
    #[error("Document not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A document yielded no usable text after cleaning
    #[error("No valid text content found in document: {0}")]
    EmptyDocument(String),

    /// Nothing left to embed after filtering blank content
    #[error("No valid content: {0}")]
    NoValidContent(String),

    /// An operation ran before the component it needs was set up
    #[error("Not initialized: {0}")]
    NotInitialized(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM and embedding provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Knowledge base, extraction and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
