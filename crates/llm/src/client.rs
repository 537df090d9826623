//! Text-in/text-out generation API shared by every provider.

use juris_core::AppResult;
use serde::{Deserialize, Serialize};

/// One generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// Fully rendered prompt
    pub prompt: String,

    /// Model identifier, e.g. "gemini-1.5-flash" or "llama3.2"
    pub model: String,

    /// Sampling temperature. Provider default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Generated text plus provider bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,

    /// Model that produced the text, as reported by the provider
    pub model: String,

    /// Why generation stopped ("STOP", "MAX_TOKENS", "length", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,

    #[serde(default)]
    pub usage: LlmUsage,
}

impl LlmResponse {
    pub fn new(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            finish_reason: None,
            usage: LlmUsage::default(),
        }
    }

    /// True when the provider cut the answer short at its token limit.
    pub fn is_truncated(&self) -> bool {
        matches!(
            self.finish_reason.as_deref(),
            Some("MAX_TOKENS") | Some("length")
        )
    }
}

/// Token counts reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LlmUsage {
    #[serde(default)]
    pub prompt_tokens: u32,

    #[serde(default)]
    pub completion_tokens: u32,

    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// A hosted or local language model.
///
/// Agents only see this trait, so tests swap in a scripted client.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider name, e.g. "gemini" or "ollama".
    fn provider_name(&self) -> &str;

    /// Generate a complete (non-streaming) answer for `request`.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = LlmRequest::new("Hello", "gemini-1.5-flash").with_temperature(0.3);

        assert_eq!(request.prompt, "Hello");
        assert_eq!(request.model, "gemini-1.5-flash");
        assert_eq!(request.temperature, Some(0.3));
    }

    #[test]
    fn test_usage_totals() {
        let usage = LlmUsage::new(12, 30);
        assert_eq!(usage.total_tokens, 42);
    }

    #[test]
    fn test_request_skips_empty_options() {
        let json = serde_json::to_value(LlmRequest::new("q", "m")).unwrap();
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_truncation_reasons() {
        let mut response = LlmResponse::new("partial", "m");
        assert!(!response.is_truncated());

        response.finish_reason = Some("MAX_TOKENS".to_string());
        assert!(response.is_truncated());

        response.finish_reason = Some("length".to_string());
        assert!(response.is_truncated());

        response.finish_reason = Some("STOP".to_string());
        assert!(!response.is_truncated());
    }
}
