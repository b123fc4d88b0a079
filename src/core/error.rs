//! Custom error types for refill
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for refill operations
#[derive(Error, Debug)]
pub enum RefillError {
    /// Selector parse or matching errors
    #[error("Selector error: {0}")]
    Selector(String),

    /// Recorder lifecycle errors
    #[error("Recorder error: {0}")]
    Recorder(String),

    /// Replay host errors (probe, injection, resume)
    #[error("Replay host error: {0}")]
    Host(String),

    /// Script store errors
    #[error("Script store error: {0}")]
    Store(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown script id
    #[error("Script '{0}' not found in the store")]
    ScriptNotFound(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for refill operations
pub type Result<T> = std::result::Result<T, RefillError>;

impl RefillError {
    /// Create a selector error
    pub fn selector(msg: impl Into<String>) -> Self {
        Self::Selector(msg.into())
    }

    /// Create a recorder error
    pub fn recorder(msg: impl Into<String>) -> Self {
        Self::Recorder(msg.into())
    }

    /// Create a replay host error
    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }

    /// Create a script store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap an error with additional context
    pub fn with_context<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(error),
        }
    }
}
