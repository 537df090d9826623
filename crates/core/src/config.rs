//! Configuration management for the Juris assistant.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults (the two bundled legal documents, Gemini provider)
//! - Config files (.juris/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources take precedence over earlier ones.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Prefix every Google Generative Language API key starts with.
const API_KEY_PREFIX: &str = "AI";

/// Keys of this length or shorter are rejected outright.
const API_KEY_MIN_LEN: usize = 10;

const KNOWN_LLM_PROVIDERS: [&str; 2] = ["gemini", "ollama"];
const KNOWN_EMBEDDING_PROVIDERS: [&str; 3] = ["gemini", "ollama", "trigram"];

/// A document in the fixed corpus: logical name plus file location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSpec {
    /// Human-readable document name, used as the chunk source
    pub name: String,

    /// Path to the PDF file (relative paths resolve against the workspace)
    pub path: PathBuf,
}

impl DocumentSpec {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Provider name: "gemini", "ollama", "trigram"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Maximum number of texts sent per embedding request
    #[serde(rename = "batchSize", default = "default_batch_size")]
    pub batch_size: usize,

    /// Optional custom endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

fn default_batch_size() -> usize {
    100
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "models/embedding-001".to_string(),
            dimensions: 768,
            batch_size: default_batch_size(),
            endpoint: None,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .juris/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// LLM provider ("gemini" or "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Optional custom LLM endpoint
    pub endpoint: Option<String>,

    /// API key for the hosted LLM and embedding provider
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Embedding provider settings
    pub embedding: EmbeddingSettings,

    /// Documents loaded into the knowledge base
    pub documents: Vec<DocumentSpec>,

    /// Number of interactions kept as conversation context
    pub memory_capacity: usize,

    /// Number of chunks retrieved per query
    pub top_k: usize,

    /// Sampling temperature for the retrieval answer
    pub query_temperature: f32,

    /// Sampling temperature for the final response
    pub summary_temperature: f32,

    /// Display name shown in session info
    pub user: String,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    embedding: Option<EmbeddingSettings>,
    documents: Option<Vec<DocumentSpec>>,
    session: Option<SessionSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionSection {
    #[serde(rename = "memoryCapacity")]
    memory_capacity: Option<usize>,
    #[serde(rename = "topK")]
    top_k: Option<usize>,
    #[serde(rename = "queryTemperature")]
    query_temperature: Option<f32>,
    #[serde(rename = "summaryTemperature")]
    summary_temperature: Option<f32>,
    user: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

/// The bundled legal corpus.
pub fn default_documents() -> Vec<DocumentSpec> {
    vec![
        DocumentSpec::new(
            "Guide to Litigation in India",
            "data/guide_to_litigation_india.pdf",
        ),
        DocumentSpec::new(
            "Legal Compliance & Corporate Laws",
            "data/legal_compliance_corporate_laws.pdf",
        ),
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "gemini".to_string(),
            model: "gemini-1.5-flash".to_string(),
            endpoint: None,
            api_key: None,
            embedding: EmbeddingSettings::default(),
            documents: default_documents(),
            memory_capacity: 5,
            top_k: 3,
            query_temperature: 0.3,
            summary_temperature: 0.5,
            user: std::env::var("USER").unwrap_or_else(|_| "guest".to_string()),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML config file and
    /// environment variables.
    ///
    /// Environment variables:
    /// - `JURIS_WORKSPACE`: Override workspace path
    /// - `JURIS_CONFIG`: Path to config file
    /// - `JURIS_PROVIDER`: LLM provider
    /// - `JURIS_MODEL`: Model identifier
    /// - `JURIS_API_KEY` (or `GOOGLE_API_KEY`): API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use juris_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like [`load`](Self::load), with the workspace and config file given
    /// explicitly. `None` falls back to `JURIS_WORKSPACE` / `JURIS_CONFIG`.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace
            .or_else(|| std::env::var("JURIS_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("JURIS_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.juris_dir().join("config.yaml"),
        };

        let mut api_key_env = None;
        if config_path.exists() {
            let (merged, key_env) = config.merge_yaml(&config_path)?;
            config = merged;
            api_key_env = key_env;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("JURIS_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("JURIS_MODEL") {
            config.model = model;
        }

        config.api_key = std::env::var("JURIS_API_KEY")
            .ok()
            .or_else(|| api_key_env.and_then(|var| std::env::var(var).ok()))
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok());

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    ///
    /// Returns the merged config and the name of the environment variable
    /// the file designates for the API key, if any.
    fn merge_yaml(&self, path: &Path) -> AppResult<(Self, Option<String>)> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<(Self, Option<String>)> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;
        let mut result = self.clone();
        let mut api_key_env = None;

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if llm.endpoint.is_some() {
                result.endpoint = llm.endpoint;
            }
            api_key_env = llm.api_key_env;
        }

        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }

        if let Some(documents) = config_file.documents {
            result.documents = documents;
        }

        if let Some(session) = config_file.session {
            if let Some(capacity) = session.memory_capacity {
                result.memory_capacity = capacity;
            }
            if let Some(top_k) = session.top_k {
                result.top_k = top_k;
            }
            if let Some(t) = session.query_temperature {
                result.query_temperature = t;
            }
            if let Some(t) = session.summary_temperature {
                result.summary_temperature = t;
            }
            if let Some(user) = session.user {
                result.user = user;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok((result, api_key_env))
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and
    /// the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        api_key: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(api_key) = api_key {
            self.api_key = Some(api_key);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .juris directory.
    pub fn juris_dir(&self) -> PathBuf {
        self.workspace.join(".juris")
    }

    /// Documents with relative paths resolved against the workspace.
    pub fn resolved_documents(&self) -> Vec<DocumentSpec> {
        self.documents
            .iter()
            .map(|doc| {
                let path = if doc.path.is_absolute() {
                    doc.path.clone()
                } else {
                    self.workspace.join(&doc.path)
                };
                DocumentSpec::new(doc.name.clone(), path)
            })
            .collect()
    }

    /// Whether any configured provider talks to the hosted Gemini API.
    pub fn requires_api_key(&self) -> bool {
        self.provider == "gemini" || self.embedding.provider == "gemini"
    }

    /// Validate configuration for the active providers.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_LLM_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_LLM_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.requires_api_key() {
            match self.api_key.as_deref() {
                None => {
                    return Err(AppError::Config(
                        "API key required. Set JURIS_API_KEY or pass --api-key.".to_string(),
                    ))
                }
                Some(key) if !validate_api_key(key) => {
                    return Err(AppError::Config(
                        "Invalid API Key format. Please check your key.".to_string(),
                    ))
                }
                Some(_) => {}
            }
        }

        if self.top_k == 0 {
            return Err(AppError::Config("topK must be at least 1".to_string()));
        }

        if self.memory_capacity == 0 {
            return Err(AppError::Config(
                "memoryCapacity must be at least 1".to_string(),
            ));
        }

        if self.documents.is_empty() {
            return Err(AppError::Config("No documents configured".to_string()));
        }

        Ok(())
    }
}

/// Superficial format check for a Gemini API key.
///
/// Accepts keys that start with `AI` and are longer than ten characters.
/// This only catches obvious typos; the provider is the real authority.
pub fn validate_api_key(api_key: &str) -> bool {
    !api_key.is_empty() && api_key.starts_with(API_KEY_PREFIX) && api_key.len() > API_KEY_MIN_LEN
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_key() -> String {
        "AIzaSyExampleKey123".to_string()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.memory_capacity, 5);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.documents.len(), 2);
        assert!(!config.verbose);
    }

    #[test]
    fn test_load_from_workspace_reads_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".juris")).unwrap();
        std::fs::write(
            dir.path().join(".juris/config.yaml"),
            "session:\n  topK: 7\n  user: advocate\n",
        )
        .unwrap();

        let config = AppConfig::load_from(Some(dir.path().to_path_buf()), None).unwrap();
        assert_eq!(config.workspace, dir.path());
        assert_eq!(config.top_k, 7);
        assert_eq!(config.user, "advocate");
    }

    #[test]
    fn test_load_from_missing_workspace() {
        let result = AppConfig::load_from(Some(PathBuf::from("/no/such/workspace")), None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_juris_dir() {
        let config = AppConfig::default();
        assert!(config.juris_dir().ends_with(".juris"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            Some(valid_key()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "ollama");
        assert_eq!(overridden.model, "llama3.2");
        assert_eq!(overridden.api_key, Some(valid_key()));
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
llm:
  provider: ollama
  model: llama3.2
  endpoint: http://localhost:11434
  apiKeyEnv: MY_KEY
embedding:
  provider: trigram
  model: trigram-v1
  dimensions: 384
documents:
  - name: Contract Act
    path: docs/contract_act.pdf
session:
  memoryCapacity: 3
  topK: 4
  user: counsel
logging:
  level: debug
  color: false
"#
        )
        .unwrap();

        let (merged, key_env) = AppConfig::default().merge_yaml(file.path()).unwrap();
        assert_eq!(merged.provider, "ollama");
        assert_eq!(merged.endpoint.as_deref(), Some("http://localhost:11434"));
        assert_eq!(merged.embedding.provider, "trigram");
        assert_eq!(merged.embedding.batch_size, 100);
        assert_eq!(merged.documents, vec![DocumentSpec::new("Contract Act", "docs/contract_act.pdf")]);
        assert_eq!(merged.memory_capacity, 3);
        assert_eq!(merged.top_k, 4);
        assert_eq!(merged.user, "counsel");
        assert_eq!(merged.log_level.as_deref(), Some("debug"));
        assert!(merged.no_color);
        assert_eq!(key_env.as_deref(), Some("MY_KEY"));
    }

    #[test]
    fn test_merge_partial_yaml_keeps_defaults() {
        let (merged, key_env) = AppConfig::default()
            .merge_yaml_str("session:\n  topK: 5\n")
            .unwrap();
        assert_eq!(merged.top_k, 5);
        assert_eq!(merged.memory_capacity, 5);
        assert_eq!(merged.provider, "gemini");
        assert!(key_env.is_none());
    }

    #[test]
    fn test_merge_invalid_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "llm: [unclosed").unwrap();
        assert!(AppConfig::default().merge_yaml(file.path()).is_err());
    }

    #[test]
    fn test_resolved_documents() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/srv/juris");
        let docs = config.resolved_documents();
        assert_eq!(
            docs[0].path,
            PathBuf::from("/srv/juris/data/guide_to_litigation_india.pdf")
        );
    }

    #[test]
    fn test_validate_api_key_format() {
        assert!(validate_api_key("AIzaSyExampleKey123"));
        assert!(!validate_api_key(""));
        assert!(!validate_api_key("AIshort"));
        assert!(!validate_api_key("AI12345678"));
        assert!(validate_api_key("AI123456789"));
        assert!(!validate_api_key("sk-1234567890abcdef"));
    }

    #[test]
    fn test_validate_requires_key_for_gemini() {
        let config = AppConfig::default();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.api_key = Some("not-a-key".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid API Key format"));

        let mut config = AppConfig::default();
        config.api_key = Some(valid_key());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_local_providers_without_key() {
        let mut config = AppConfig::default();
        config.provider = "ollama".to_string();
        config.embedding.provider = "trigram".to_string();
        assert!(!config.requires_api_key());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.api_key = Some(valid_key());
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let mut config = AppConfig::default();
        config.api_key = Some(valid_key());
        config.top_k = 0;
        assert!(config.validate().is_err());
    }
}
