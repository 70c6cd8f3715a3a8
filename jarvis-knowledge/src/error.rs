//! Knowledge acquisition errors.

use thiserror::Error;

/// Errors that can occur while acquiring external knowledge.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// HTTP request failed.
    #[error("Knowledge request failed: {0}")]
    RequestFailed(String),

    /// Request timed out.
    #[error("Knowledge request timed out after {0}ms")]
    Timeout(u64),

    /// Source is disabled or unreachable.
    #[error("Knowledge source unavailable: {0}")]
    Unavailable(String),

    /// The source has nothing for this query.
    #[error("No knowledge found for: {0}")]
    NotFound(String),

    /// The source answered with something that isn't usable JSON.
    #[error("Failed to parse knowledge response: {0}")]
    Parse(String),
}

impl KnowledgeError {
    /// Whether another attempt could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RequestFailed(_) | Self::Timeout(_) | Self::Unavailable(_))
    }
}

impl From<reqwest::Error> for KnowledgeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            KnowledgeError::Timeout(0)
        } else if err.is_connect() {
            KnowledgeError::Unavailable(err.to_string())
        } else if err.is_decode() {
            KnowledgeError::Parse(err.to_string())
        } else {
            KnowledgeError::RequestFailed(err.to_string())
        }
    }
}

/// Result alias for knowledge operations.
pub type Result<T> = std::result::Result<T, KnowledgeError>;
