//! Error types shared across the pipeline.

use std::time::Duration;
use thiserror::Error;

/// Result type for completion backend calls
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Crate-level result type
pub type SynthResult<T> = Result<T, SynthError>;

/// Failure of a single call to the completion backend.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("backend returned no text")]
    EmptyResponse,

    #[error("backend error: {0}")]
    Backend(String),
}

/// Tool specs rejected at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("invalid tool name '{0}'")]
    InvalidName(String),

    #[error("tool '{0}' is already registered")]
    Duplicate(String),

    #[error("tool '{tool}' has invalid parameter name '{param}'")]
    InvalidParameter { tool: String, param: String },

    #[error("tool '{tool}' declares parameter '{param}' more than once")]
    DuplicateParameter { tool: String, param: String },
}

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("generation failed for '{function}' (run {run}): {source}")]
    Generation {
        function: String,
        run: usize,
        #[source]
        source: GenerationError,
    },

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
