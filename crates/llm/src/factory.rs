//! LLM provider factory.
//!
//! This module provides a factory for creating LLM clients based on
//! application configuration. It handles provider resolution and
//! secret injection.

use crate::client::LlmClient;
use crate::providers::{GeminiClient, OllamaClient};
use crate::types::ProviderType;
use juris_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("gemini", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key (required by Gemini)
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// API key is missing, and `AppError::Llm` if the HTTP client cannot be
/// built.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    tracing::debug!("Creating LLM client for provider '{}'", provider_type.as_str());

    match provider_type {
        ProviderType::Gemini => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("Gemini provider requires API key".to_string())
            })?;
            let client = match endpoint {
                Some(url) => GeminiClient::with_base_url(url, api_key)?,
                None => GeminiClient::new(api_key)?,
            };
            Ok(Arc::new(client))
        }
        ProviderType::Ollama => {
            let client = match endpoint {
                Some(url) => OllamaClient::with_base_url(url)?,
                None => OllamaClient::new()?,
            };
            Ok(Arc::new(client))
        }
    }
}
