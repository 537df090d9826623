//! Summarization agent: turns retrieved material into the reply the user
//! sees.
//!
//! A question is either a first ask, which gets a two or three sentence
//! answer ending in an offer to go deeper, or a follow-up asking for
//! detail, which gets a structured explanation that also sees the recent
//! conversation.

use juris_core::AppResult;
use juris_llm::{LlmClient, LlmRequest};
use juris_prompt::{build_prompt, PromptDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_SUMMARY_TEMPERATURE: f32 = 0.5;

/// Phrases that mark a request for a detailed answer.
pub const DETAIL_KEYWORDS: [&str; 11] = [
    "explain",
    "detail",
    "tell me more",
    "elaborate",
    "specific",
    "how exactly",
    "what exactly",
    "more about",
    "step by step",
    "break down",
    "in depth",
];

/// Case-insensitive check for any of [`DETAIL_KEYWORDS`].
pub fn is_detailed_request(query: &str) -> bool {
    let query = query.to_lowercase();
    DETAIL_KEYWORDS.iter().any(|k| query.contains(k))
}

/// Shape of the generated reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    Initial,
    Detailed,
}

impl ResponseMode {
    pub fn classify(query: &str) -> Self {
        if is_detailed_request(query) {
            ResponseMode::Detailed
        } else {
            ResponseMode::Initial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Initial => "initial",
            ResponseMode::Detailed => "detailed",
        }
    }
}

pub struct SummarizationAgent {
    llm: Arc<dyn LlmClient>,
    initial_prompt: PromptDefinition,
    detailed_prompt: PromptDefinition,
    model: String,
    temperature: f32,
}

impl SummarizationAgent {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        initial_prompt: PromptDefinition,
        detailed_prompt: PromptDefinition,
        model: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            initial_prompt,
            detailed_prompt,
            model: model.into(),
            temperature: DEFAULT_SUMMARY_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Generate the reply for `query` from the query agent's output.
    ///
    /// `conversation_history` only reaches the model for detailed requests.
    pub async fn generate(
        &self,
        query: &str,
        retrieval_output: &str,
        conversation_history: &str,
    ) -> AppResult<String> {
        let mode = ResponseMode::classify(query);
        tracing::debug!(mode = mode.as_str(), "Summarizing response");

        let mut variables = HashMap::new();
        variables.insert("query".to_string(), query.to_string());
        variables.insert("context".to_string(), retrieval_output.to_string());

        let definition = match mode {
            ResponseMode::Detailed => {
                variables.insert(
                    "conversation_history".to_string(),
                    conversation_history.to_string(),
                );
                &self.detailed_prompt
            }
            ResponseMode::Initial => &self.initial_prompt,
        };

        let built = build_prompt(definition, variables)?;
        let request = LlmRequest::new(built.text, &self.model).with_temperature(self.temperature);
        let response = self.llm.complete(&request).await?;
        if response.is_truncated() {
            tracing::warn!(mode = mode.as_str(), "Response hit the model token limit");
        }

        Ok(response.content.trim().to_string())
    }

    /// Like [`generate`](Self::generate), with failures rendered as text.
    pub async fn summarize(
        &self,
        query: &str,
        retrieval_output: &str,
        conversation_history: &str,
    ) -> String {
        match self.generate(query, retrieval_output, conversation_history).await {
            Ok(text) => text,
            Err(e) => render_generation_error(&e),
        }
    }
}

pub(crate) fn render_generation_error(error: &juris_core::AppError) -> String {
    tracing::error!("Response generation failed: {}", error);
    format!("Error generating response: {}", error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{prompt, StubLlm};
    use juris_prompt::{DETAILED_PROMPT_ID, INITIAL_PROMPT_ID};

    fn agent(llm: Arc<StubLlm>) -> SummarizationAgent {
        SummarizationAgent::new(
            llm,
            prompt(INITIAL_PROMPT_ID),
            prompt(DETAILED_PROMPT_ID),
            "gemini-1.5-flash",
        )
    }

    #[test]
    fn test_classification() {
        assert!(is_detailed_request("Can you elaborate on filing a suit?"));
        assert!(!is_detailed_request("How do I file a suit?"));
        assert!(is_detailed_request("Walk me through it STEP BY STEP"));
        assert!(is_detailed_request("What are the specifics?"));
        assert_eq!(ResponseMode::classify("Tell me more"), ResponseMode::Detailed);
        assert_eq!(ResponseMode::classify("What is bail?"), ResponseMode::Initial);
    }

    #[test]
    fn test_every_keyword_triggers_detail() {
        for keyword in DETAIL_KEYWORDS {
            assert!(is_detailed_request(&format!("Please {} this", keyword)));
        }
    }

    #[tokio::test]
    async fn test_initial_uses_brief_prompt() {
        let llm = Arc::new(StubLlm::new().with_reply("  File a plaint. Would you like more details on any step?\n"));
        let agent = agent(llm.clone());

        let text = agent
            .generate("How do I file a suit?", "File a plaint.", "User: earlier\nAssistant: reply")
            .await
            .unwrap();
        assert_eq!(text, "File a plaint. Would you like more details on any step?");

        let request = &llm.requests()[0];
        assert_eq!(request.temperature, Some(0.5));
        assert!(request.prompt.contains("Would you like more details on any step?"));
        assert!(request.prompt.contains("File a plaint."));
        assert!(!request.prompt.contains("User: earlier"));
    }

    #[tokio::test]
    async fn test_detailed_includes_history() {
        let llm = Arc::new(StubLlm::new());
        let agent = agent(llm.clone());

        agent
            .generate(
                "Can you elaborate on filing a suit?",
                "File a plaint.",
                "User: How do I file a suit?\nAssistant: File a plaint.",
            )
            .await
            .unwrap();

        let request = &llm.requests()[0];
        assert!(request.prompt.contains("Previous conversation context"));
        assert!(request
            .prompt
            .contains("User: How do I file a suit?\nAssistant: File a plaint."));
        assert!(request.prompt.contains("Do NOT end with"));
    }

    #[tokio::test]
    async fn test_summarize_renders_failure() {
        let llm = Arc::new(StubLlm::new().with_failure("model overloaded"));
        let agent = agent(llm);

        let text = agent.summarize("q", "ctx", "").await;
        assert!(text.starts_with("Error generating response: "));
        assert!(text.contains("model overloaded"));
    }

    #[tokio::test]
    async fn test_calls_are_independent() {
        let llm = Arc::new(StubLlm::new().with_reply("first").with_reply("second"));
        let agent = agent(llm.clone());

        assert_eq!(agent.summarize("q1", "ctx", "").await, "first");
        assert_eq!(agent.summarize("q2", "ctx", "").await, "second");
        assert_eq!(llm.call_count(), 2);
    }
}
