//! Embedding provider trait and factory.

use super::providers::{GeminiProvider, OllamaProvider, TrigramProvider};
use juris_core::{AppError, AppResult, EmbeddingSettings};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "gemini", "ollama", "trigram")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Knowledge("No embedding returned".to_string()))
    }

    /// Embed a search query. Providers that distinguish query and document
    /// embeddings override this.
    async fn embed_query(&self, query: &str) -> AppResult<Vec<f32>> {
        self.embed(query).await
    }
}

/// Create an embedding provider based on configuration.
///
/// The hosted Gemini provider needs `api_key`; the Ollama provider checks
/// that the local server answers before returning.
pub async fn create_provider(
    settings: &EmbeddingSettings,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    if settings.dimensions == 0 {
        return Err(AppError::Knowledge(
            "Embedding dimensions must be greater than zero".to_string(),
        ));
    }

    match settings.provider.as_str() {
        "gemini" | "google" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Knowledge("Gemini embedding provider requires API key".to_string())
            })?;
            Ok(Arc::new(GeminiProvider::new(settings, api_key)?))
        }

        "ollama" => Ok(Arc::new(OllamaProvider::new(settings).await?)),

        "trigram" => Ok(Arc::new(TrigramProvider::new(settings.dimensions))),

        _ => Err(AppError::Knowledge(format!(
            "Unknown embedding provider: '{}'. Supported providers: gemini, ollama, trigram",
            settings.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str, dimensions: usize) -> EmbeddingSettings {
        EmbeddingSettings {
            provider: provider.to_string(),
            model: "trigram-v1".to_string(),
            dimensions,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_trigram_provider() {
        let provider = create_provider(&settings("trigram", 384), None)
            .await
            .unwrap();
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.model_name(), "trigram-v1");
        assert_eq!(provider.dimensions(), 384);
    }

    #[tokio::test]
    async fn test_create_gemini_provider_requires_key() {
        let err = create_provider(&EmbeddingSettings::default(), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("requires API key"));

        let provider = create_provider(&EmbeddingSettings::default(), Some("AIzaTestKey123"))
            .await
            .unwrap();
        assert_eq!(provider.provider_name(), "gemini");
        assert_eq!(provider.dimensions(), 768);
    }

    #[tokio::test]
    async fn test_create_unknown_provider() {
        let result = create_provider(&settings("unknown", 384), None).await;
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));
    }

    #[tokio::test]
    async fn test_zero_dimensions_rejected() {
        let result = create_provider(&settings("trigram", 0), None).await;
        assert!(matches!(result, Err(AppError::Knowledge(_))));
    }

    #[tokio::test]
    async fn test_embed_query_defaults_to_embed() {
        let provider = create_provider(&settings("trigram", 128), None)
            .await
            .unwrap();

        let as_query = provider.embed_query("stay of proceedings").await.unwrap();
        let as_text = provider.embed("stay of proceedings").await.unwrap();
        assert_eq!(as_query, as_text);
    }
}
