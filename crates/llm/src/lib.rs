//! LLM integration crate for the Juris assistant.
//!
//! This crate provides a provider-agnostic abstraction for text-in/text-out
//! calls to a Large Language Model. Agents depend only on the `LlmClient`
//! trait, so tests can substitute a stub without network access.
//!
//! # Providers
//! - **Gemini**: Google Generative Language API (default)
//! - **Ollama**: Local LLM runtime
//!
//! # Example
//! ```no_run
//! use juris_llm::{LlmClient, LlmRequest, providers::GeminiClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GeminiClient::new("AIza...")?;
//! let request = LlmRequest::new("What is a plaint?", "gemini-1.5-flash");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{GeminiClient, OllamaClient};
pub use types::ProviderType;
