//! Gemini embedding provider.
//!
//! Calls `batchEmbedContents` on the Google Generative Language API.
//! Documents are embedded with the `RETRIEVAL_DOCUMENT` task type and
//! queries with `RETRIEVAL_QUERY`. The key is sent as the
//! `x-goog-api-key` header, never in the URL.

use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use juris_core::{AppError, AppResult, EmbeddingSettings};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const API_KEY_HEADER: &str = "x-goog-api-key";

const TASK_DOCUMENT: &str = "RETRIEVAL_DOCUMENT";
const TASK_QUERY: &str = "RETRIEVAL_QUERY";

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Hosted embedding provider backed by Gemini.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    /// Always in `models/<name>` form
    model: String,
    dimensions: usize,
    api_key: String,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(settings: &EmbeddingSettings, api_key: impl Into<String>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::Knowledge(format!("Failed to create HTTP client for Gemini: {}", e))
            })?;

        let model = if settings.model.starts_with("models/") {
            settings.model.clone()
        } else {
            format!("models/{}", settings.model)
        };

        Ok(Self {
            client,
            base_url: settings
                .endpoint
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model,
            dimensions: settings.dimensions,
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/{}:batchEmbedContents", self.base_url, self.model)
    }

    fn build_request<'a>(&'a self, texts: &'a [String], task_type: &'static str) -> BatchEmbedRequest<'a> {
        BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: &self.model,
                    content: Content {
                        parts: vec![Part { text }],
                    },
                    task_type,
                })
                .collect(),
        }
    }

    fn check_response(&self, expected: usize, response: BatchEmbedResponse) -> AppResult<Vec<Vec<f32>>> {
        if response.embeddings.len() != expected {
            return Err(AppError::Knowledge(format!(
                "Gemini returned {} embeddings for {} texts",
                response.embeddings.len(),
                expected
            )));
        }

        response
            .embeddings
            .into_iter()
            .map(|e| {
                if e.values.len() == self.dimensions {
                    Ok(e.values)
                } else {
                    Err(AppError::Knowledge(format!(
                        "Unexpected embedding dimensions: got {}, expected {}",
                        e.values.len(),
                        self.dimensions
                    )))
                }
            })
            .collect()
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), task = task_type))]
    async fn embed_with_task(&self, texts: &[String], task_type: &'static str) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = self.build_request(texts, task_type);
        debug!("Sending {} texts to {}", texts.len(), self.model);

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AppError::Knowledge(format!(
                    "Failed to send embedding request to Gemini: {}",
                    e.without_url()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let message = serde_json::from_str::<ErrorEnvelope>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);

            return Err(AppError::Knowledge(format!(
                "Gemini embedding API error ({}): {}",
                status, message
            )));
        }

        let parsed: BatchEmbedResponse = response
            .json()
            .await
            .map_err(|e| {
                AppError::Knowledge(format!(
                    "Failed to parse Gemini embedding response: {}",
                    e.without_url()
                ))
            })?;

        self.check_response(texts.len(), parsed)
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.embed_with_task(texts, TASK_DOCUMENT).await
    }

    async fn embed_query(&self, query: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_with_task(&[query.to_string()], TASK_QUERY).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Knowledge("No embedding returned".to_string()))
    }
}
