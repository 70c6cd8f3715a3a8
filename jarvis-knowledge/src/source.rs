//! The knowledge call shape and the in-process sources.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{KnowledgeError, Result};
use crate::types::KnowledgeQuery;

/// Something that can answer questions the fact store can't.
///
/// Implementations must be cheap to share; the orchestrator holds one behind
/// an `Arc` and calls it from many sessions at once.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Acquire knowledge for `query`. Arrays are rendered as bullet lists,
    /// anything else is stringified.
    async fn acquire(&self, query: &KnowledgeQuery) -> Result<Value>;
}

/// The disabled source: every acquisition reports `Unavailable`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoKnowledge;

#[async_trait]
impl KnowledgeSource for NoKnowledge {
    fn name(&self) -> &str {
        "none"
    }

    async fn acquire(&self, _query: &KnowledgeQuery) -> Result<Value> {
        Err(KnowledgeError::Unavailable("no knowledge source configured".into()))
    }
}

/// A fixed lookup table keyed by [`KnowledgeQuery::key`].
#[derive(Debug, Default)]
pub struct StaticKnowledge {
    entries: RwLock<HashMap<String, Value>>,
}

impl StaticKnowledge {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with_entry(self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    /// Add or replace an entry. Keys are matched case-insensitively.
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.entries.write().insert(key.into().to_lowercase(), value);
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl KnowledgeSource for StaticKnowledge {
    fn name(&self) -> &str {
        "static"
    }

    async fn acquire(&self, query: &KnowledgeQuery) -> Result<Value> {
        let key = query.key().to_lowercase();
        self.entries
            .read()
            .get(&key)
            .cloned()
            .ok_or(KnowledgeError::NotFound(key))
    }
}
