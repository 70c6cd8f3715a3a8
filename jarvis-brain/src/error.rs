//! Orchestrator error types.
//!
//! These never reach a caller of [`crate::Brain::process`]: the pipeline
//! converts them into an apology response and an `Error` event.

use thiserror::Error;

use jarvis_core::CoreError;

/// Failures inside one pass of the request pipeline.
#[derive(Debug, Error)]
pub enum BrainError {
    /// The fact store could not complete a write the request depends on.
    #[error("Fact store failure: {0}")]
    Persistence(#[from] CoreError),

    /// A blocking store task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result alias for orchestrator operations.
pub type Result<T> = std::result::Result<T, BrainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failures_convert() {
        let err: BrainError = CoreError::InvalidTopic(String::new()).into();
        assert!(matches!(err, BrainError::Persistence(CoreError::InvalidTopic(_))));
        assert!(err.to_string().starts_with("Fact store failure"));
    }
}
