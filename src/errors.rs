//! Error types for docbuddy
//!
//! `AgentError` covers everything that aborts a run or a setup step.
//! `ToolError` covers tool failures, which the control loop turns into
//! observations instead of propagating.

use thiserror::Error;

/// Main error type for the docbuddy agent system
#[derive(Error, Debug)]
pub enum AgentError {
    /// State machine transition errors
    #[error("Invalid state transition from {from:?} to {to:?}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    /// Corpus contains the same document id twice
    #[error("Duplicate document id '{id}' in corpus")]
    DuplicateDocumentId { id: String },

    /// Corpus contains a document without an id
    #[error("Document at position {position} has an empty id")]
    EmptyDocumentId { position: usize },

    /// Corpus file could not be read or decoded
    #[error("Failed to load corpus: {0}")]
    CorpusLoad(String),

    /// Tool rejected by the capability table
    #[error("Invalid tool registration: {0}")]
    InvalidToolRegistration(String),

    /// Generation service failed; fatal for the current run
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Streaming errors
    #[error("Streaming error: {0}")]
    StreamingError(String),

    /// JSON parsing errors
    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    /// Ollama API errors
    #[error("Ollama API error: {0}")]
    OllamaApiError(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AgentError {
    /// Whether this error belongs to the index-build family
    pub fn is_index_build(&self) -> bool {
        matches!(
            self,
            AgentError::DuplicateDocumentId { .. } | AgentError::EmptyDocumentId { .. }
        )
    }
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Recoverable tool failure, reported back to the model as an observation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Unknown tool '{name}'. Available tools: {available}")]
    UnknownTool { name: String, available: String },

    #[error("Invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Tool '{tool}' failed: {reason}")]
    Execution { tool: String, reason: String },
}
