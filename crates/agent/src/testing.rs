//! Stub collaborators for agent and session tests.

use async_trait::async_trait;
use juris_core::{AppError, AppResult};
use juris_knowledge::{PageExtractor, Retriever, TextChunk};
use juris_llm::{LlmClient, LlmRequest, LlmResponse};
use juris_prompt::{load_prompt, PromptDefinition};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Language model that records requests and replies from a script.
#[derive(Default)]
pub struct StubLlm {
    replies: Mutex<VecDeque<AppResult<String>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl StubLlm {
    /// Answers `"  stub answer  "` once the scripted replies run out.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, text: &str) -> Self {
        self.push(Ok(text.to_string()));
        self
    }

    pub fn with_failure(self, message: &str) -> Self {
        self.push(Err(AppError::Llm(message.to_string())));
        self
    }

    fn push(&self, reply: AppResult<String>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for StubLlm {
    fn provider_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("  stub answer  ".to_string()))?;

        Ok(LlmResponse::new(reply, request.model.clone()))
    }
}

/// Retriever returning a fixed result.
pub struct StubRetriever {
    result: Result<Vec<TextChunk>, String>,
    calls: AtomicUsize,
}

impl StubRetriever {
    pub fn returning(chunks: Vec<TextChunk>) -> Self {
        Self {
            result: Ok(chunks),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for StubRetriever {
    async fn retrieve(&self, _query: &str, k: usize) -> AppResult<Vec<TextChunk>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.result {
            Ok(chunks) => Ok(chunks.iter().take(k).cloned().collect()),
            Err(message) => Err(AppError::Knowledge(message.clone())),
        }
    }
}

/// Page extractor treating files as UTF-8 text with form feeds between
/// pages.
pub struct TextPages;

impl PageExtractor for TextPages {
    fn extract_pages(&self, bytes: &[u8]) -> AppResult<Vec<String>> {
        Ok(String::from_utf8_lossy(bytes)
            .split('\x0c')
            .map(str::to_string)
            .collect())
    }
}

/// Built-in prompt by id.
pub fn prompt(id: &str) -> PromptDefinition {
    let workspace = tempfile::TempDir::new().unwrap();
    load_prompt(workspace.path(), id).unwrap()
}
