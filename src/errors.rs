use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThreadQaError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Malformed data: {0}")]
    MalformedData(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Embedding service error: {0}")]
    EmbeddingServiceError(String),

    #[error("Index is empty: nothing to retrieve from")]
    EmptyIndex,

    #[error("Pipeline not ready: call ingest before ask")]
    NotReady,

    #[error("Completion service error: {0}")]
    CompletionServiceError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ThreadQaError {
    /// Errors that abort `ingest` and leave the previous index in place
    #[must_use]
    pub const fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable(_)
                | Self::MalformedData(_)
                | Self::InvalidConfig(_)
                | Self::EmbeddingServiceError(_)
        )
    }

    /// Workflow errors that are always surfaced to the caller of `ask`
    #[must_use]
    pub const fn is_workflow_error(&self) -> bool {
        matches!(self, Self::NotReady | Self::EmptyIndex)
    }
}

pub type Result<T> = std::result::Result<T, ThreadQaError>;
