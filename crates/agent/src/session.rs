//! Conversation session.
//!
//! A session owns everything one user's conversation needs: the loaded
//! knowledge base, both agents, the rolling memory and the visible
//! transcript. Documents are loaded once; every turn then goes query agent,
//! then summarization agent, then memory.

use crate::memory::{ConversationMemory, DEFAULT_MEMORY_CAPACITY};
use crate::query::{render_retrieval, QueryAgent, RetrievalStatus, DEFAULT_QUERY_TEMPERATURE};
use crate::summarize::{
    render_generation_error, ResponseMode, SummarizationAgent, DEFAULT_SUMMARY_TEMPERATURE,
};
use chrono::{DateTime, Utc};
use juris_core::{AppConfig, AppError, AppResult, DocumentSpec};
use juris_knowledge::{
    create_provider, DocumentLoader, EmbeddingProvider, ProgressReporter, Retriever, TextChunk,
    VectorStore, DEFAULT_BATCH_SIZE, DEFAULT_TOP_K,
};
use juris_llm::{create_client, LlmClient};
use juris_prompt::{load_prompt, PromptDefinition, DETAILED_PROMPT_ID, INITIAL_PROMPT_ID, QUERY_PROMPT_ID};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// The three prompts a session runs on.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub query: PromptDefinition,
    pub initial: PromptDefinition,
    pub detailed: PromptDefinition,
}

impl PromptSet {
    /// Load the prompts, honouring overrides in `workspace`.
    pub fn load(workspace: &Path) -> AppResult<Self> {
        Ok(Self {
            query: load_prompt(workspace, QUERY_PROMPT_ID)?,
            initial: load_prompt(workspace, INITIAL_PROMPT_ID)?,
            detailed: load_prompt(workspace, DETAILED_PROMPT_ID)?,
        })
    }
}

/// Tunables for a session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Model used for both generation calls
    pub model: String,
    pub top_k: usize,
    pub memory_capacity: usize,
    pub query_temperature: f32,
    pub summary_temperature: f32,
    /// Texts per embedding request during load
    pub batch_size: usize,
    /// Display name for session info
    pub user: String,
}

impl SessionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            top_k: config.top_k,
            memory_capacity: config.memory_capacity,
            query_temperature: config.query_temperature,
            summary_temperature: config.summary_temperature,
            batch_size: config.embedding.batch_size,
            user: config.user.clone(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            top_k: DEFAULT_TOP_K,
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            query_temperature: DEFAULT_QUERY_TEMPERATURE,
            summary_temperature: DEFAULT_SUMMARY_TEMPERATURE,
            batch_size: DEFAULT_BATCH_SIZE,
            user: "guest".to_string(),
        }
    }
}

/// Chunks contributed by one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub name: String,
    pub path: PathBuf,
    pub chunks: usize,
}

/// Summary of a completed load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub documents: Vec<DocumentReport>,
    pub indexed_chunks: usize,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One visible message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl TranscriptEntry {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            at: Utc::now(),
        }
    }
}

/// Result of one conversational turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub query: String,
    pub response: String,
    pub mode: ResponseMode,
    pub retrieval: RetrievalStatus,
    pub generation_failed: bool,
}

struct Loaded {
    store: Arc<VectorStore>,
    query_agent: QueryAgent,
    summarizer: SummarizationAgent,
    report: LoadReport,
}

pub struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    settings: SessionSettings,
    llm: Arc<dyn LlmClient>,
    embedder: Arc<dyn EmbeddingProvider>,
    prompts: PromptSet,
    memory: ConversationMemory,
    transcript: Vec<TranscriptEntry>,
    progress: ProgressReporter,
    loaded: Option<Loaded>,
}

impl Session {
    pub fn new(
        settings: SessionSettings,
        llm: Arc<dyn LlmClient>,
        embedder: Arc<dyn EmbeddingProvider>,
        prompts: PromptSet,
    ) -> Self {
        let memory = ConversationMemory::new(settings.memory_capacity);
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            settings,
            llm,
            embedder,
            prompts,
            memory,
            transcript: Vec::new(),
            progress: ProgressReporter::noop(),
            loaded: None,
        }
    }

    /// Build a session with the clients and prompts `config` describes.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        let llm = create_client(
            &config.provider,
            config.endpoint.as_deref(),
            config.api_key.as_deref(),
        )?;
        let embedder = create_provider(&config.embedding, config.api_key.as_deref()).await?;
        let prompts = PromptSet::load(&config.workspace)?;

        tracing::debug!(
            provider = %config.provider,
            model = %config.model,
            embedding = %embedder.model_name(),
            "Session clients ready"
        );

        Ok(Self::new(
            SessionSettings::from_config(config),
            llm,
            embedder,
            prompts,
        ))
    }

    /// Report load and embedding progress through `progress`.
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Load and index `documents`.
    ///
    /// Any document failing to load aborts the whole load and leaves the
    /// session unloaded. Calling this on a loaded session returns the
    /// earlier report without reloading.
    pub async fn load(
        &mut self,
        loader: &DocumentLoader,
        documents: &[DocumentSpec],
    ) -> AppResult<LoadReport> {
        if let Some(loaded) = &self.loaded {
            tracing::debug!("Documents already loaded");
            return Ok(loaded.report.clone());
        }

        let start = Instant::now();
        tracing::info!("Loading {} documents", documents.len());

        let loader = loader.clone().with_progress(self.progress.clone());
        let docs = loader.load_documents(documents)?;
        let chunks: Vec<TextChunk> = docs.iter().flat_map(|d| d.chunks.iter().cloned()).collect();

        let mut store = VectorStore::new(self.embedder.clone())
            .with_batch_size(self.settings.batch_size)
            .with_progress(self.progress.clone());
        let indexed_chunks = store.ingest(chunks).await?;
        let store = Arc::new(store);

        let retriever: Arc<dyn Retriever> = store.clone();
        let query_agent = QueryAgent::new(
            retriever,
            self.llm.clone(),
            self.prompts.query.clone(),
            &self.settings.model,
        )
        .with_top_k(self.settings.top_k)
        .with_temperature(self.settings.query_temperature);

        let summarizer = SummarizationAgent::new(
            self.llm.clone(),
            self.prompts.initial.clone(),
            self.prompts.detailed.clone(),
            &self.settings.model,
        )
        .with_temperature(self.settings.summary_temperature);

        let report = LoadReport {
            documents: docs
                .iter()
                .map(|d| DocumentReport {
                    name: d.name.clone(),
                    path: d.path.clone(),
                    chunks: d.chunks.len(),
                })
                .collect(),
            indexed_chunks,
            duration_secs: start.elapsed().as_secs_f64(),
        };

        tracing::info!(
            "Loaded {} documents, {} chunks indexed in {:.2}s",
            report.documents.len(),
            report.indexed_chunks,
            report.duration_secs
        );

        self.loaded = Some(Loaded {
            store,
            query_agent,
            summarizer,
            report: report.clone(),
        });

        Ok(report)
    }

    /// Answer one user query and remember the exchange.
    ///
    /// # Errors
    /// - `AppError::NotInitialized` before documents are loaded
    /// - `AppError::Config` for a blank query
    ///
    /// Agent failures do not fail the turn; they become the response text.
    pub async fn handle_turn(&mut self, query: &str) -> AppResult<Turn> {
        let loaded = self.loaded.as_ref().ok_or_else(|| {
            AppError::NotInitialized("Please load the legal documents first.".to_string())
        })?;

        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::Config("Query cannot be empty".to_string()));
        }

        self.transcript.push(TranscriptEntry::new(Role::User, query));

        let (retrieval_output, retrieval) = render_retrieval(loaded.query_agent.run(query).await);
        let history = self.memory.get_context();
        let mode = ResponseMode::classify(query);

        let (response, generation_failed) = match loaded
            .summarizer
            .generate(query, &retrieval_output, &history)
            .await
        {
            Ok(text) => (text, false),
            Err(e) => (render_generation_error(&e), true),
        };

        self.memory.add_interaction(query, response.clone());
        self.transcript
            .push(TranscriptEntry::new(Role::Assistant, response.clone()));

        Ok(Turn {
            query: query.to_string(),
            response,
            mode,
            retrieval,
            generation_failed,
        })
    }

    /// Search the loaded documents directly, with similarity scores.
    pub async fn search(&self, query: &str, k: usize) -> AppResult<Vec<(TextChunk, f32)>> {
        let loaded = self.loaded.as_ref().ok_or_else(|| {
            AppError::NotInitialized("Please load the legal documents first.".to_string())
        })?;
        loaded.store.search_with_scores(query, k).await
    }

    /// Forget earlier turns. The transcript is kept.
    pub fn clear_memory(&mut self) {
        self.memory.clear();
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn load_report(&self) -> Option<&LoadReport> {
        self.loaded.as_ref().map(|l| &l.report)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::NO_CONTEXT_MESSAGE;
    use crate::testing::{StubLlm, TextPages};
    use juris_knowledge::embeddings::TrigramProvider;
    use juris_knowledge::Phase;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        documents: Vec<DocumentSpec>,
        prompts: PromptSet,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();

        let guide = dir.path().join("guide.txt");
        std::fs::write(
            &guide,
            "Filing a civil suit starts with a plaint\x0c\x0cThe plaint states the cause of action\x0cCourt fees are paid when filing",
        )
        .unwrap();

        let compliance = dir.path().join("compliance.txt");
        std::fs::write(
            &compliance,
            [
                "A contract requires offer and acceptance",
                "Consideration must be lawful",
                "Companies file annual returns",
                "Directors owe fiduciary duties",
                "Breach of contract entitles damages",
            ]
            .join("\x0c"),
        )
        .unwrap();

        let prompts = PromptSet::load(dir.path()).unwrap();
        Fixture {
            documents: vec![
                DocumentSpec::new("Guide to Litigation", guide),
                DocumentSpec::new("Compliance", compliance),
            ],
            prompts,
            _dir: dir,
        }
    }

    fn session(fx: &Fixture, llm: Arc<StubLlm>) -> Session {
        Session::new(
            SessionSettings::default(),
            llm,
            Arc::new(TrigramProvider::new(256)),
            fx.prompts.clone(),
        )
    }

    fn loader() -> DocumentLoader {
        DocumentLoader::with_extractor(Arc::new(TextPages))
    }

    #[tokio::test]
    async fn test_load_reports_chunks_per_document() {
        let fx = fixture();
        let mut session = session(&fx, Arc::new(StubLlm::new()));

        let report = session.load(&loader(), &fx.documents).await.unwrap();
        assert!(session.is_loaded());
        assert_eq!(report.indexed_chunks, 8);
        assert_eq!(report.documents[0].chunks, 3);
        assert_eq!(report.documents[1].chunks, 5);

        let hits = session.search("contract", 3).await.unwrap();
        assert!(!hits.is_empty() && hits.len() <= 3);
    }

    #[tokio::test]
    async fn test_second_load_is_noop() {
        let fx = fixture();
        let mut session = session(&fx, Arc::new(StubLlm::new()));

        let first = session.load(&loader(), &fx.documents).await.unwrap();
        let second = session.load(&loader(), &[]).await.unwrap();
        assert_eq!(first.indexed_chunks, second.indexed_chunks);
        assert_eq!(second.documents.len(), 2);
    }

    #[tokio::test]
    async fn test_load_is_all_or_nothing() {
        let fx = fixture();
        let mut session = session(&fx, Arc::new(StubLlm::new()));

        let mut documents = fx.documents.clone();
        documents.push(DocumentSpec::new("Missing", "/no/such/file.pdf"));

        let err = session.load(&loader(), &documents).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(!session.is_loaded());
        assert!(matches!(
            session.handle_turn("How do I file a suit?").await,
            Err(AppError::NotInitialized(_))
        ));
    }

    #[tokio::test]
    async fn test_turn_before_load_fails() {
        let fx = fixture();
        let mut session = session(&fx, Arc::new(StubLlm::new()));

        let err = session.handle_turn("hello").await.unwrap_err();
        assert!(matches!(err, AppError::NotInitialized(_)));
        assert!(session.transcript().is_empty());
        assert!(matches!(
            session.search("plaint", 3).await,
            Err(AppError::NotInitialized(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_query_rejected() {
        let fx = fixture();
        let llm = Arc::new(StubLlm::new());
        let mut session = session(&fx, llm.clone());
        session.load(&loader(), &fx.documents).await.unwrap();

        let err = session.handle_turn("   ").await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_turn_runs_both_agents_and_records() {
        let fx = fixture();
        let llm = Arc::new(
            StubLlm::new()
                .with_reply("Present a plaint.")
                .with_reply("File a plaint with court fees. Would you like more details on any step?"),
        );
        let mut session = session(&fx, llm.clone());
        session.load(&loader(), &fx.documents).await.unwrap();

        let turn = session.handle_turn("How do I file a suit?").await.unwrap();
        assert_eq!(turn.mode, ResponseMode::Initial);
        assert_eq!(turn.retrieval, RetrievalStatus::Answered);
        assert!(!turn.generation_failed);
        assert!(turn.response.ends_with("Would you like more details on any step?"));

        let requests = llm.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].prompt.contains("Present a plaint."));

        assert_eq!(session.memory().len(), 1);
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[0].role, Role::User);
        assert_eq!(session.transcript()[1].content, turn.response);
    }

    #[tokio::test]
    async fn test_detailed_follow_up_sees_history() {
        let fx = fixture();
        let llm = Arc::new(
            StubLlm::new()
                .with_reply("r1")
                .with_reply("Short answer.")
                .with_reply("r2")
                .with_reply("Long answer."),
        );
        let mut session = session(&fx, llm.clone());
        session.load(&loader(), &fx.documents).await.unwrap();

        session.handle_turn("How do I file a suit?").await.unwrap();
        let turn = session
            .handle_turn("Can you elaborate on filing a suit?")
            .await
            .unwrap();

        assert_eq!(turn.mode, ResponseMode::Detailed);
        let detailed = &llm.requests()[3];
        assert!(detailed
            .prompt
            .contains("User: How do I file a suit?\nAssistant: Short answer."));
    }

    #[tokio::test]
    async fn test_generation_failure_becomes_response() {
        let fx = fixture();
        let llm = Arc::new(StubLlm::new().with_reply("ok").with_failure("quota exceeded"));
        let mut session = session(&fx, llm);
        session.load(&loader(), &fx.documents).await.unwrap();

        let turn = session.handle_turn("How do I file a suit?").await.unwrap();
        assert!(turn.generation_failed);
        assert!(turn.response.starts_with("Error generating response: "));
        assert_eq!(session.memory().len(), 1);
    }

    #[tokio::test]
    async fn test_retrieval_failure_still_summarized() {
        let fx = fixture();
        let llm = Arc::new(StubLlm::new().with_failure("timeout").with_reply("Sorry."));
        let mut session = session(&fx, llm.clone());
        session.load(&loader(), &fx.documents).await.unwrap();

        let turn = session.handle_turn("How do I file a suit?").await.unwrap();
        assert_eq!(turn.retrieval, RetrievalStatus::Failed);
        assert_eq!(turn.response, "Sorry.");
        assert!(llm.requests()[1]
            .prompt
            .contains("Error processing query: "));
    }

    #[tokio::test]
    async fn test_memory_window_and_clear() {
        let fx = fixture();
        let mut session = session(&fx, Arc::new(StubLlm::new()));
        session.load(&loader(), &fx.documents).await.unwrap();

        for i in 1..=6 {
            session
                .handle_turn(&format!("Question {} about a plaint", i))
                .await
                .unwrap();
        }

        assert_eq!(session.memory().len(), 5);
        assert_eq!(
            session.memory().iter().next().map(|i| i.query.as_str()),
            Some("Question 2 about a plaint")
        );
        assert_eq!(session.transcript().len(), 12);

        session.clear_memory();
        assert_eq!(session.memory().get_context(), "");
        assert_eq!(session.transcript().len(), 12);
    }

    #[tokio::test]
    async fn test_progress_events_during_load() {
        let fx = fixture();
        let phases = Arc::new(Mutex::new(Vec::new()));
        let sink = phases.clone();

        let mut session = session(&fx, Arc::new(StubLlm::new())).with_progress(
            ProgressReporter::new(Arc::new(move |event| {
                sink.lock().unwrap().push(event.phase);
            })),
        );
        session.load(&loader(), &fx.documents).await.unwrap();

        let phases = phases.lock().unwrap();
        for phase in [Phase::Load, Phase::Embed, Phase::Index] {
            assert!(phases.contains(&phase), "missing {}", phase);
        }
    }

    #[tokio::test]
    async fn test_from_config_offline() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.workspace = dir.path().to_path_buf();
        config.provider = "ollama".to_string();
        config.model = "llama3.2".to_string();
        config.embedding.provider = "trigram".to_string();
        config.embedding.dimensions = 64;
        config.top_k = 2;
        config.user = "advocate".to_string();

        let session = Session::from_config(&config).await.unwrap();
        assert!(!session.is_loaded());
        assert_eq!(session.settings().model, "llama3.2");
        assert_eq!(session.settings().top_k, 2);
        assert_eq!(session.settings().user, "advocate");
        assert_eq!(session.memory().capacity(), config.memory_capacity);
    }

    #[tokio::test]
    async fn test_from_config_rejects_unknown_embedding_provider() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.workspace = dir.path().to_path_buf();
        config.provider = "ollama".to_string();
        config.embedding.provider = "word2vec".to_string();

        assert!(Session::from_config(&config).await.is_err());
    }

    #[test]
    fn test_turn_json_shape() {
        let turn = Turn {
            query: "q".to_string(),
            response: NO_CONTEXT_MESSAGE.to_string(),
            mode: ResponseMode::Initial,
            retrieval: RetrievalStatus::NoContext,
            generation_failed: false,
        };
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["mode"], "initial");
        assert_eq!(json["retrieval"], "no_context");
        assert_eq!(json["generationFailed"], false);
    }
}
