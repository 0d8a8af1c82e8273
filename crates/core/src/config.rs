//! Configuration management for docchat.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - A YAML config file (`docchat.yaml` or `DOCCHAT_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! Credentials are never stored in the file; the file names the environment
//! variable that holds them (`apiKeyEnv`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default config file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "docchat.yaml";

/// LLM providers the workspace can talk to.
pub const KNOWN_LLM_PROVIDERS: [&str; 2] = ["gemini", "ollama"];

/// Embedding providers the workspace can talk to.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["hash", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Optional config file path
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// Language-model service settings
    pub llm: LlmSettings,

    /// Embedding service settings
    pub embedding: EmbeddingSettings,

    /// Chunking and retrieval settings
    pub retrieval: RetrievalSettings,

    /// Conversation memory settings
    pub memory: MemorySettings,

    /// Ingestion settings
    pub ingest: IngestSettings,

    /// Prompt settings
    pub prompt: PromptSettings,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    #[serde(skip)]
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Language-model service configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmSettings {
    /// Provider identifier ("gemini" or "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Optional custom endpoint URL
    pub endpoint: Option<String>,

    /// Name of the environment variable holding the API credential
    pub api_key_env: String,

    /// Sampling temperature; kept low to favour grounded answers
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,

    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,

    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-flash-latest".to_string(),
            endpoint: None,
            api_key_env: "GOOGLE_API_KEY".to_string(),
            temperature: 0.1,
            max_tokens: None,
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

/// Embedding service configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingSettings {
    /// Provider identifier ("hash" or "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Optional custom endpoint URL
    pub endpoint: Option<String>,

    /// Texts per embedding request batch
    pub batch_size: usize,

    /// Batches embedded concurrently during ingestion
    pub concurrency: usize,

    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
            endpoint: None,
            batch_size: 32,
            concurrency: 4,
            max_retries: 2,
        }
    }
}

/// Chunking and retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievalSettings {
    /// Maximum characters per chunk
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,

    /// Number of chunks retrieved per question
    pub top_k: usize,

    /// Optional minimum cosine similarity; `None` returns all top-k results
    pub min_score: Option<f32>,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
            min_score: None,
        }
    }
}

/// Conversation memory configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MemorySettings {
    /// Turns retained for prompt context; `None` keeps every turn
    pub max_turns: Option<usize>,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            max_turns: Some(20),
        }
    }
}

/// What to do when one document in a batch fails to load.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LoadPolicy {
    /// Fail the whole ingestion on the first unloadable document
    #[default]
    AbortAll,
    /// Skip unloadable documents and report them alongside the result
    SkipAndReport,
}

/// Ingestion configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct IngestSettings {
    /// Policy for per-document load failures
    pub load_policy: LoadPolicy,
}

/// Prompt configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptSettings {
    /// Optional YAML prompt definition replacing the built-in answer template
    pub template_file: Option<PathBuf>,

    /// Rewrite follow-up questions into standalone questions before retrieval
    pub condense_questions: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            llm: LlmSettings::default(),
            embedding: EmbeddingSettings::default(),
            retrieval: RetrievalSettings::default(),
            memory: MemorySettings::default(),
            ingest: IngestSettings::default(),
            prompt: PromptSettings::default(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file, environment variables and defaults.
    ///
    /// Environment variables:
    /// - `DOCCHAT_CONFIG`: Path to config file
    /// - `DOCCHAT_PROVIDER`: LLM provider
    /// - `DOCCHAT_MODEL`: LLM model identifier
    /// - `DOCCHAT_EMBEDDING_PROVIDER`: Embedding provider
    /// - `DOCCHAT_EMBEDDING_MODEL`: Embedding model identifier
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use docchat_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None).expect("Failed to load config");
    /// println!("Model: {}", config.llm.model);
    /// ```
    pub fn load(config_file: Option<&Path>) -> AppResult<Self> {
        let explicit = config_file
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("DOCCHAT_CONFIG").ok().map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                Self::from_yaml_file(&path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_yaml_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("DOCCHAT_PROVIDER") {
            config.llm.provider = provider;
        }

        if let Ok(model) = std::env::var("DOCCHAT_MODEL") {
            config.llm.model = model;
        }

        if let Ok(provider) = std::env::var("DOCCHAT_EMBEDDING_PROVIDER") {
            config.embedding.provider = provider;
        }

        if let Ok(model) = std::env::var("DOCCHAT_EMBEDDING_MODEL") {
            config.embedding.model = model;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Parse a YAML config file. Missing sections fall back to defaults.
    pub fn from_yaml_file(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let mut config = Self::from_yaml_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;
        config.config_file = Some(path.to_path_buf());

        tracing::debug!("Loaded config file {:?}", path);
        Ok(config)
    }

    /// Parse YAML configuration text.
    pub fn from_yaml_str(contents: &str) -> AppResult<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the file.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.llm.provider = provider;
        }

        if let Some(model) = model {
            self.llm.model = model;
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

    /// Resolve the LLM API key from the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Whether the configured LLM provider needs a credential.
    pub fn requires_api_key(&self) -> bool {
        self.llm.provider.eq_ignore_ascii_case("gemini")
    }

    /// Validate the configuration without touching the network.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.llm.provider.to_lowercase();
        if !KNOWN_LLM_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown LLM provider: {}. Supported: {}",
                self.llm.provider,
                KNOWN_LLM_PROVIDERS.join(", ")
            )));
        }

        let embedding_provider = self.embedding.provider.to_lowercase();
        if !KNOWN_EMBEDDING_PROVIDERS.contains(&embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(AppError::Config(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 || self.embedding.concurrency == 0 {
            return Err(AppError::Config(
                "Embedding batchSize and concurrency must be greater than zero".to_string(),
            ));
        }

        let retrieval = &self.retrieval;
        if retrieval.chunk_size == 0 {
            return Err(AppError::Config(
                "chunkSize must be greater than zero".to_string(),
            ));
        }

        if retrieval.chunk_overlap >= retrieval.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                retrieval.chunk_overlap, retrieval.chunk_size
            )));
        }

        if retrieval.top_k == 0 {
            return Err(AppError::Config("topK must be at least 1".to_string()));
        }

        if let Some(min_score) = retrieval.min_score {
            if !(-1.0..=1.0).contains(&min_score) {
                return Err(AppError::Config(format!(
                    "minScore must be a cosine similarity in [-1.0, 1.0], got {}",
                    min_score
                )));
            }
        }

        if self.memory.max_turns == Some(0) {
            return Err(AppError::Config(
                "memory.maxTurns must be at least 1 (omit it for unbounded history)".to_string(),
            ));
        }

        if self.requires_api_key() && self.resolve_api_key().is_none() {
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                self.llm.api_key_env
            )));
        }

        Ok(())
    }
}
