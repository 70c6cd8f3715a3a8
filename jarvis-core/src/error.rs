//! Error types for the JARVIS core library.

use thiserror::Error;

/// Failures of the durable fact backend.
///
/// The fact store never lets one of these leave its index half-updated: a
/// write that fails here is not applied in memory either.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// SQLite reported an error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A fact could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A stored row is unreadable (bad timestamp, unknown source, ...).
    #[error("Corrupt fact record for topic '{topic}': {reason}")]
    Corrupt {
        /// Topic of the offending row.
        topic: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The backend refused the operation (used by test doubles and closed stores).
    #[error("Persistence backend unavailable: {0}")]
    Unavailable(String),
}

/// Top-level error type for core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Fact persistence failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A fact topic was empty after normalization.
    #[error("Invalid fact topic: {0:?}")]
    InvalidTopic(String),

    /// An arithmetic expression was malformed or undefined.
    #[error("Expression error: {0}")]
    Expression(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Whether this error came from the durable store.
    #[must_use]
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, CoreError>;
