//! # jarvis-knowledge: External Knowledge for JARVIS
//!
//! Questions and weather requests may need facts the assistant doesn't hold.
//! This crate defines the call shape for acquiring them and a few sources:
//!   - **None** (the default): every acquisition fails, answers fall back to memory
//!   - **Static**: an in-process table, for offline use and tests
//!   - **HTTP**: a JSON endpoint with timeout and retry
//!
//! A failed acquisition is never fatal. The orchestrator logs it and answers
//! from stored facts instead.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod error;
pub mod source;
pub mod types;

use std::sync::Arc;

use jarvis_core::config::KnowledgeConfig;

pub use client::HttpKnowledge;
pub use error::{KnowledgeError, Result};
pub use source::{KnowledgeSource, NoKnowledge, StaticKnowledge};
pub use types::KnowledgeQuery;

/// Build the configured knowledge source.
///
/// # Errors
/// Returns `KnowledgeError::Unavailable` if the HTTP provider is selected
/// without a base URL or its client cannot be built.
pub fn from_config(config: &KnowledgeConfig) -> Result<Arc<dyn KnowledgeSource>> {
    match config.provider.trim().to_lowercase().as_str() {
        "http" => Ok(Arc::new(HttpKnowledge::from_config(config)?)),
        "none" | "" => Ok(Arc::new(NoKnowledge)),
        other => {
            tracing::warn!(provider = other, "Unknown knowledge provider, disabling knowledge");
            Ok(Arc::new(NoKnowledge))
        }
    }
}
