//! Query agent: answers a question from retrieved passages.

use juris_core::AppResult;
use juris_knowledge::{Retriever, DEFAULT_TOP_K};
use juris_llm::{LlmClient, LlmRequest};
use juris_prompt::{build_prompt, PromptDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Shown when retrieval finds nothing to answer from.
pub const NO_CONTEXT_MESSAGE: &str = "I apologize, but I couldn't find specific information about that in the legal documents. Would you like to try rephrasing your question?";

pub const DEFAULT_QUERY_TEMPERATURE: f32 = 0.3;

/// Outcome of a successful query run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieval {
    /// Model answer grounded in retrieved passages
    Answer(String),
    /// Retrieval returned no usable text; the model was not called
    NoContext,
}

/// How the retrieval step of a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStatus {
    Answered,
    NoContext,
    Failed,
}

/// Render a query result as the text handed to the next stage.
pub fn render_retrieval(result: AppResult<Retrieval>) -> (String, RetrievalStatus) {
    match result {
        Ok(Retrieval::Answer(text)) => (text, RetrievalStatus::Answered),
        Ok(Retrieval::NoContext) => (NO_CONTEXT_MESSAGE.to_string(), RetrievalStatus::NoContext),
        Err(e) => {
            tracing::error!("Query failed: {}", e);
            (format!("Error processing query: {}", e), RetrievalStatus::Failed)
        }
    }
}

/// Retrieves passages for a query and asks the model to answer from them.
pub struct QueryAgent {
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    model: String,
    top_k: usize,
    temperature: f32,
}

impl QueryAgent {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        llm: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        model: impl Into<String>,
    ) -> Self {
        Self {
            retriever,
            llm,
            prompt,
            model: model.into(),
            top_k: DEFAULT_TOP_K,
            temperature: DEFAULT_QUERY_TEMPERATURE,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Retrieve passages and answer from them.
    ///
    /// Returns [`Retrieval::NoContext`] without calling the model when the
    /// retrieved passages are empty or blank.
    pub async fn run(&self, query: &str) -> AppResult<Retrieval> {
        let chunks = self.retriever.retrieve(query, self.top_k).await?;
        tracing::debug!("Retrieved {} chunks for query", chunks.len());

        let context = chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        if context.trim().is_empty() {
            tracing::info!("No relevant passages found");
            return Ok(Retrieval::NoContext);
        }

        let mut variables = HashMap::new();
        variables.insert("query".to_string(), query.to_string());
        variables.insert("context".to_string(), context);
        let built = build_prompt(&self.prompt, variables)?;

        let request = LlmRequest::new(built.text, &self.model).with_temperature(self.temperature);
        let response = self.llm.complete(&request).await?;

        Ok(Retrieval::Answer(response.content.trim().to_string()))
    }

    /// Like [`run`](Self::run), rendered for display. Never fails.
    pub async fn process_query(&self, query: &str) -> String {
        render_retrieval(self.run(query).await).0
    }
}
