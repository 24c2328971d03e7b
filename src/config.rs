use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::noise::NoisePolicy;
use crate::rag::ConfidencePolicy;
use crate::ThreadQaError;

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Backend family spoken by an embedding or completion endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceProvider {
    /// `OpenAI`-compatible REST API
    OpenAI,
    /// Ollama local server
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
}

pub(crate) fn default_chunk_size() -> usize {
    300
}

pub(crate) fn default_chunk_overlap() -> usize {
    20
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Byte cap on the assembled context; the best chunk is always kept
    #[serde(default)]
    pub max_context_length: Option<usize>,
}

pub(crate) fn default_top_k() -> usize {
    4
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_context_length: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default = "default_provider")]
    pub provider: ServiceProvider,
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> ServiceProvider {
    ServiceProvider::OpenAI
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

pub(crate) fn default_batch_size() -> usize {
    100
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: default_openai_endpoint(),
            model: default_embedding_model(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: ServiceProvider,
    #[serde(default = "default_openai_endpoint")]
    pub llm_endpoint: String,
    /// Falls back to `OPENAI_API_KEY` when absent
    #[serde(default)]
    pub llm_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_model() -> String {
    "gpt-3.5-turbo".to_string()
}

pub(crate) fn default_temperature() -> f32 {
    0.2
}

pub(crate) fn default_max_tokens() -> usize {
    256
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            llm_endpoint: default_openai_endpoint(),
            llm_key: None,
            llm_model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionLogConfig {
    #[serde(default = "default_interaction_log_path")]
    pub path: PathBuf,
}

fn default_interaction_log_path() -> PathBuf {
    PathBuf::from("logs/qa_log.jsonl")
}

impl Default for InteractionLogConfig {
    fn default() -> Self {
        Self {
            path: default_interaction_log_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub noise: NoisePolicy,
    #[serde(default)]
    pub confidence: ConfidencePolicy,
    #[serde(default)]
    pub interaction_log: InteractionLogConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default config file path
    pub fn load() -> crate::Result<Self> {
        // Try threadqa.toml first, then the example file, then built-in defaults
        if Path::new("threadqa.toml").exists() {
            Self::from_file("threadqa.toml")
        } else if Path::new("threadqa.example.toml").exists() {
            tracing::warn!("Using threadqa.example.toml. Create threadqa.toml for real use.");
            Self::from_file("threadqa.example.toml")
        } else {
            tracing::debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Check value ranges and endpoint URLs
    pub fn validate(&self) -> crate::Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(ThreadQaError::InvalidConfig(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.chunking.overlap >= self.chunking.chunk_size {
            return Err(ThreadQaError::InvalidConfig(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(ThreadQaError::InvalidConfig(
                "top_k must be greater than 0".to_string(),
            ));
        }
        if self.retrieval.max_context_length == Some(0) {
            return Err(ThreadQaError::InvalidConfig(
                "max_context_length must be greater than 0".to_string(),
            ));
        }
        if self.embeddings.batch_size == 0 {
            return Err(ThreadQaError::InvalidConfig(
                "embedding batch_size must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ThreadQaError::InvalidConfig(format!(
                "temperature {} is outside [0, 2]",
                self.llm.temperature
            )));
        }
        self.noise.validate()?;
        self.confidence.validate()?;

        for endpoint in [&self.embeddings.endpoint, &self.llm.llm_endpoint] {
            url::Url::parse(endpoint).map_err(|e| {
                ThreadQaError::ConfigError(format!("invalid endpoint '{endpoint}': {e}"))
            })?;
        }

        Ok(())
    }

    /// Get chunk size in characters
    pub fn chunk_size(&self) -> usize {
        self.chunking.chunk_size
    }

    /// Get chunk overlap in characters
    pub fn chunk_overlap(&self) -> usize {
        self.chunking.overlap
    }

    /// Get number of chunks retrieved per question
    pub fn top_k(&self) -> usize {
        self.retrieval.top_k
    }

    /// Get LLM endpoint
    pub fn llm_endpoint(&self) -> &str {
        &self.llm.llm_endpoint
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.llm_model
    }

    /// API key from the config file, or from the environment
    pub fn api_key(&self) -> Option<String> {
        self.llm
            .llm_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
    }

    /// Get interaction log path
    pub fn interaction_log_path(&self) -> &Path {
        &self.interaction_log.path
    }
}
