//! Error types for concierge

use thiserror::Error;

/// Result type alias using ConciergeError
pub type Result<T> = std::result::Result<T, ConciergeError>;

/// Error type alias for convenience
pub type Error = ConciergeError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
    pub const RATE_LIMITED: i32 = 4;
}

/// Main error type for concierge
#[derive(Debug, Error)]
pub enum ConciergeError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input text is empty")]
    EmptyInput,

    #[error("Embedding generation failed: {0}")]
    EmbeddingGeneration(#[source] Box<ConciergeError>),

    #[error("Vector dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("Search failed: {0}")]
    SearchFailed(#[source] Box<ConciergeError>),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for tool {tool}: {source}")]
    ArgumentParse {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("{0} timed out after {1:?}")]
    Timeout(&'static str, std::time::Duration),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("External service error: {0}")]
    ExternalError(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl ConciergeError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound(_) => exit_codes::NOT_FOUND,
            Self::EmptyInput | Self::InvalidInput(_) | Self::Config(_) => {
                exit_codes::INVALID_INPUT
            }
            _ => exit_codes::GENERAL_ERROR,
        }
    }
}
