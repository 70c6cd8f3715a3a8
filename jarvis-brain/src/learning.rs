//! Auto-learning: pick simple statements out of ordinary conversation.
//!
//! Recognised shapes:
//!   - "my name is X" / "call me X"      → `name`
//!   - "my X is Y"                       → `X = Y`
//!   - "i like / love / enjoy Y"         → `likes` (array)
//!   - "i hate / dislike / can't stand Y" → `dislikes` (array)
//!
//! Confidence is `intent_confidence * (0.5 + 0.5 * trust)`: the more the
//! user is trusted right now, the more a passing remark counts.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};
use tracing::debug;

use jarvis_core::{FactMetadata, FactSource, FactStore, IntentKind, Result};

/// A statement worth remembering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// How the user wants to be addressed.
    Name(String),
    /// `my <topic> is <value>`.
    Attribute {
        /// Fact topic.
        topic: String,
        /// Fact value.
        value: String,
    },
    /// Something the user likes.
    Like(String),
    /// Something the user dislikes.
    Dislike(String),
}

static NAME: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\b(?:my name is|call me|i am called|i'm called) ([\p{L}][\p{L}' -]*?)[.!]*$").ok()
});
static ATTRIBUTE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\bmy ([\p{L}0-9' -]+?) (?:is|are) ([\p{L}0-9' .,-]+?)[.!]*$").ok()
});
static LIKE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\bi (?:really )?(?:like|love|enjoy) ([\p{L}0-9' -]+?)[.!]*$").ok()
});
static DISLIKE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\bi (?:really )?(?:hate|dislike|can't stand) ([\p{L}0-9' -]+?)[.!]*$").ok()
});

/// Objects too vague to remember as a preference.
const VAGUE: &[&str] = &["you", "it", "that", "this", "them", "him", "her", "me"];

fn capture(re: &LazyLock<Option<Regex>>, text: &str, group: usize) -> Option<String> {
    re.as_ref()?
        .captures(text)?
        .get(group)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Whether an utterance with this intent should be mined at all. Explicit
/// stores, reminders and corrections are written by the pipeline itself;
/// questions aren't statements.
#[must_use]
pub fn should_learn(intent: IntentKind, text: &str) -> bool {
    !matches!(
        intent,
        IntentKind::MemoryStore
            | IntentKind::MemoryRecall
            | IntentKind::Reminder
            | IntentKind::Correction
            | IntentKind::Question
    ) && !text.trim_end().ends_with('?')
}

/// Extract statements from a normalized utterance.
#[must_use]
pub fn extract(text: &str) -> Vec<Statement> {
    let mut found = Vec::new();

    if let Some(name) = capture(&NAME, text, 1) {
        found.push(Statement::Name(name));
    } else if let Some(re) = ATTRIBUTE.as_ref() {
        if let Some(caps) = re.captures(text) {
            if let (Some(topic), Some(value)) = (caps.get(1), caps.get(2)) {
                found.push(Statement::Attribute {
                    topic: topic.as_str().trim().to_string(),
                    value: value.as_str().trim().to_string(),
                });
            }
        }
    }

    if let Some(liked) = capture(&LIKE, text, 1).filter(|o| !VAGUE.contains(&o.as_str())) {
        found.push(Statement::Like(liked));
    }
    if let Some(disliked) = capture(&DISLIKE, text, 1).filter(|o| !VAGUE.contains(&o.as_str())) {
        found.push(Statement::Dislike(disliked));
    }
    found
}

/// Confidence for a learned fact.
#[must_use]
pub fn learned_confidence(intent_confidence: f32, trust: f32) -> f32 {
    (intent_confidence * (0.5 + 0.5 * trust.clamp(0.0, 1.0))).clamp(0.0, 1.0)
}

/// Write statements into the store. Returns the topics written.
///
/// # Errors
/// Returns the first persistence failure; statements before it are kept.
pub fn apply(facts: &FactStore, statements: &[Statement], confidence: f32) -> Result<Vec<String>> {
    let meta = || {
        FactMetadata::default()
            .with_confidence(confidence)
            .with_source(FactSource::Inference)
            .with_tag("learned")
    };

    let mut written = Vec::with_capacity(statements.len());
    for statement in statements {
        let fact = match statement {
            Statement::Name(name) => facts.set_fact("name", json!(name), meta())?,
            Statement::Attribute { topic, value } => facts.set_fact(topic, json!(value), meta())?,
            Statement::Like(item) => facts.update_fact("likes", |old| appended(old, item), meta())?,
            Statement::Dislike(item) => {
                facts.update_fact("dislikes", |old| appended(old, item), meta())?
            }
        };
        debug!(topic = %fact.topic, confidence, "Learned fact");
        written.push(fact.topic);
    }
    Ok(written)
}

/// `current` as a list with `item` added once.
fn appended(current: Option<&Value>, item: &str) -> Value {
    let mut items: Vec<Value> = match current {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other.clone()],
    };
    let item = json!(item);
    if !items.contains(&item) {
        items.push(item);
    }
    Value::Array(items)
}
