//! Error types for Lorekeeper

use thiserror::Error;

/// Result type alias for Lorekeeper operations
pub type Result<T> = std::result::Result<T, LoreError>;

/// Main error type for Lorekeeper
#[derive(Error, Debug)]
pub enum LoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Fact rejected: {0}")]
    FactRejected(#[from] crate::types::FactRejection),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Timeout after {0}s")]
    Timeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    #[cfg(feature = "openai")]
    Http(#[from] reqwest::Error),

    #[error("HTTP request error: {0}")]
    #[cfg(not(feature = "openai"))]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LoreError {
    /// Errors that callers may retry (external services, timeouts)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LoreError::Embedding(_)
                | LoreError::Generation(_)
                | LoreError::Timeout(_)
                | LoreError::Http(_)
        )
    }

    /// Errors that the fact/retrieval paths absorb into degraded behavior
    /// instead of surfacing to the client.
    pub fn is_degradable(&self) -> bool {
        self.is_retryable() || matches!(self, LoreError::FactRejected(_))
    }
}
