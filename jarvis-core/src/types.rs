//! Core type definitions shared across the assistant.
//!
//! Facts are serializable so any backend can persist them in the same
//! logical shape: `{topic, value, confidence, createdAt, lastAccessed,
//! accessCount, source, tags}`.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier of a fact. Kept stable across blended updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactId(pub Uuid);

impl FactId {
    /// Create a new random fact ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier of a conversation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Facts
// ---------------------------------------------------------------------------

/// Where a fact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactSource {
    /// Stated explicitly by the user ("remember ...").
    User,
    /// Picked up from conversation by the learning step.
    Inference,
    /// Written by the application itself (settings panels, defaults).
    System,
}

impl FactSource {
    /// Stable lowercase name, used as the persisted representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Inference => "inference",
            Self::System => "system",
        }
    }

    /// Parse the persisted representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "inference" => Some(Self::Inference),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

impl fmt::Display for FactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A confidence-weighted, topic-keyed unit of long-term memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// Identity, preserved across blended writes.
    pub id: FactId,
    /// Normalized (lowercase, trimmed) topic. Unique within a store.
    pub topic: String,
    /// Opaque payload.
    pub value: serde_json::Value,
    /// Trust in this fact (0.0 to 1.0).
    pub confidence: f32,
    /// When the topic was first written.
    pub created_at: DateTime<Utc>,
    /// Last write or successful read.
    pub last_accessed: DateTime<Utc>,
    /// Number of successful reads.
    pub access_count: u32,
    /// Origin of the most recent write.
    pub source: FactSource,
    /// Free-form labels, merged across writes.
    pub tags: BTreeSet<String>,
}

impl Fact {
    /// Create a fresh fact stamped at `now`.
    #[must_use]
    pub fn new(
        topic: impl Into<String>,
        value: serde_json::Value,
        confidence: f32,
        source: FactSource,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: FactId::new(),
            topic: normalize_topic(&topic.into()),
            value,
            confidence: confidence.clamp(0.0, 1.0),
            created_at: now,
            last_accessed: now,
            access_count: 0,
            source,
            tags: BTreeSet::new(),
        }
    }

    /// Attach tags (builder style).
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Render the value for speech: strings verbatim, everything else as JSON.
    #[must_use]
    pub fn display_value(&self) -> String {
        display_value(&self.value)
    }
}

/// Canonical topic key: lowercase, trimmed, inner whitespace collapsed.
#[must_use]
pub fn normalize_topic(topic: &str) -> String {
    topic
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Render a JSON payload for speech: strings verbatim, arrays as a
/// comma-separated list, everything else as JSON.
#[must_use]
pub fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Ranking Score
// ---------------------------------------------------------------------------

/// Totally ordered score used to rank search hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RankScore(pub OrderedFloat<f64>);

impl RankScore {
    /// Wrap a raw score.
    #[must_use]
    pub fn new(score: f64) -> Self {
        Self(OrderedFloat(score))
    }

    /// Raw score value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0.into_inner()
    }
}
