//! Ollama client for running the assistant against a local model.
//!
//! Uses the non-streaming `/api/generate` endpoint.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use juris_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Local models can be slow on a cold start.
const REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Options>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Options {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    model: String,
    response: String,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Client for `http://localhost:11434`.
    pub fn new() -> AppResult<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to create HTTP client for Ollama: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn build_request<'a>(&self, request: &'a LlmRequest) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            options: request.temperature.map(|temperature| Options { temperature }),
            stream: false,
        }
    }

    fn convert_response(&self, response: GenerateResponse) -> AppResult<LlmResponse> {
        if response.response.trim().is_empty() {
            return Err(AppError::Llm(format!(
                "Ollama model '{}' returned an empty response",
                response.model
            )));
        }

        Ok(LlmResponse {
            content: response.response,
            model: response.model,
            finish_reason: response.done_reason,
            usage: LlmUsage::new(response.prompt_eval_count, response.eval_count),
        })
    }
}

/// Pull the message out of an Ollama `{"error": "..."}` body.
fn error_message(body: String) -> String {
    serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.error)
        .unwrap_or(body)
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(model = %request.model, "Sending completion request to Ollama");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&self.build_request(request))
            .send()
            .await
            .map_err(|e| {
                AppError::Llm(format!(
                    "Failed to reach Ollama at {}: {}",
                    self.base_url, e
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Llm(format!(
                "Ollama API error ({}): {}",
                status,
                error_message(body)
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Ollama response: {}", e)))?;

        let converted = self.convert_response(parsed)?;
        tracing::info!(
            total_tokens = converted.usage.total_tokens,
            "Received completion from Ollama"
        );
        Ok(converted)
    }
}
