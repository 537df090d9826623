//! Ollama embedding provider.
//!
//! Semantic embeddings from a local Ollama server (e.g. `nomic-embed-text`),
//! for running the assistant without a hosted embedding API. Each batch is
//! one `/api/embed` call, retried with exponential backoff.
//!
//! # Example
//! ```no_run
//! use juris_core::EmbeddingSettings;
//! use juris_knowledge::embeddings::{EmbeddingProvider, OllamaProvider};
//!
//! # async fn example() -> juris_core::AppResult<()> {
//! let settings = EmbeddingSettings {
//!     provider: "ollama".to_string(),
//!     model: "nomic-embed-text".to_string(),
//!     dimensions: 768,
//!     ..Default::default()
//! };
//!
//! let provider = OllamaProvider::new(&settings).await?;
//! let embedding = provider.embed("res judicata").await?;
//! assert_eq!(embedding.len(), 768);
//! # Ok(())
//! # }
//! ```

use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use juris_core::{AppError, AppResult, EmbeddingSettings};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBED_ENDPOINT: &str = "/api/embed";

/// Attempts per batch before giving up
const MAX_ATTEMPTS: u32 = 3;

const INITIAL_BACKOFF_MS: u64 = 100;

/// Generous: a whole batch of pages is embedded per request
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Create a provider and verify that the model answers.
    ///
    /// The server address comes from `settings.endpoint`, then the
    /// `OLLAMA_URL` environment variable, then `http://localhost:11434`.
    ///
    /// # Errors
    /// `AppError::Knowledge` if Ollama is not reachable or the model returns
    /// vectors of the wrong size.
    pub async fn new(settings: &EmbeddingSettings) -> AppResult<Self> {
        let base_url = settings
            .endpoint
            .clone()
            .or_else(|| std::env::var("OLLAMA_URL").ok())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        let provider = Self::with_base_url(base_url, &settings.model, settings.dimensions)?;
        provider.verify_connection().await?;
        Ok(provider)
    }

    /// Create a provider against `base_url` without contacting it.
    pub fn with_base_url(
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::Knowledge(format!("Failed to create HTTP client for Ollama: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            dimensions,
        })
    }

    #[instrument(skip(self), fields(model = %self.model))]
    async fn verify_connection(&self) -> AppResult<()> {
        debug!("Verifying Ollama connection at {}", self.base_url);

        let probe = ["connection check".to_string()];
        if let Err(e) = self.embed_with_retries(&probe).await {
            error!("Failed to connect to Ollama: {}", e);
            return Err(AppError::Knowledge(format!(
                "Ollama not available at {}. Ensure Ollama is running and model '{}' is installed. Run: ollama pull {}",
                self.base_url, self.model, self.model
            )));
        }

        debug!("Ollama connection verified, model '{}' ready", self.model);
        Ok(())
    }

    async fn embed_with_retries(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut attempt = 1;
        loop {
            match self.request_embeddings(texts).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(e) if attempt >= MAX_ATTEMPTS => return Err(e),
                Err(e) => {
                    let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                    warn!(
                        "Embedding failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt, MAX_ATTEMPTS, backoff_ms, e
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    attempt += 1;
                }
            }
        }
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len()))]
    async fn request_embeddings(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, EMBED_ENDPOINT))
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to send request to Ollama: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error)
                .unwrap_or(error_text);

            return Err(AppError::Knowledge(format!(
                "Ollama API error ({}): {}",
                status, message
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to parse Ollama response: {}", e)))?;

        self.check_embeddings(texts.len(), body.embeddings)
    }

    fn check_embeddings(&self, expected: usize, embeddings: Vec<Vec<f32>>) -> AppResult<Vec<Vec<f32>>> {
        if embeddings.len() != expected {
            return Err(AppError::Knowledge(format!(
                "Ollama returned {} embeddings for {} texts",
                embeddings.len(),
                expected
            )));
        }

        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimensions) {
            return Err(AppError::Knowledge(format!(
                "Ollama model '{}' returned {} dimensions, expected {}",
                self.model,
                bad.len(),
                self.dimensions
            )));
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(AppError::Knowledge("Cannot embed empty text".to_string()));
        }

        let mut results = self.embed_with_retries(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Knowledge("No embedding returned".to_string()))
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "ollama", model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed_with_retries(texts).await
    }
}
