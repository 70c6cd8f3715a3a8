//! Intent Recognizer: pattern-based classification with entity extraction
//! and follow-up boosting.
//!
//! Recognition is deterministic. Every registered intent is scored against
//! the normalized utterance, the best one wins (registration order breaks
//! ties), and a recognised follow-up of the previous intent gets a fixed
//! boost. Anything under the recognition threshold resolves to
//! [`IntentKind::Unknown`], which is a normal outcome rather than an error.

pub mod entities;
pub mod registry;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::IntentConfig;
use registry::{DEFINITIONS, IntentDefinition};

pub use entities::resolve_datetime;

/// Classified purpose of an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// "hello", "good morning".
    Greeting,
    /// "bye", "see you later".
    Farewell,
    /// "remember my favorite color is blue".
    MemoryStore,
    /// "what is my favorite color".
    MemoryRecall,
    /// "remind me to call mom at 5 pm".
    Reminder,
    /// "what is 2 + 2".
    Calculate,
    /// "what time is it".
    Time,
    /// "what's the date".
    Date,
    /// "what's the weather in paris".
    Weather,
    /// "tell me a joke".
    Joke,
    /// "thanks".
    Thanks,
    /// "what can you do".
    Help,
    /// "who are you".
    Identity,
    /// "no, it's green".
    Correction,
    /// "yes".
    Confirmation,
    /// "no".
    Negation,
    /// Any other question.
    Question,
    /// Nothing cleared the recognition threshold.
    Unknown,
}

impl IntentKind {
    /// Registered intents in tie-break order (`Unknown` is the fallback, not registered).
    pub const REGISTERED: [IntentKind; 17] = [
        IntentKind::Greeting,
        IntentKind::Farewell,
        IntentKind::MemoryStore,
        IntentKind::MemoryRecall,
        IntentKind::Reminder,
        IntentKind::Calculate,
        IntentKind::Time,
        IntentKind::Date,
        IntentKind::Weather,
        IntentKind::Joke,
        IntentKind::Thanks,
        IntentKind::Help,
        IntentKind::Identity,
        IntentKind::Correction,
        IntentKind::Confirmation,
        IntentKind::Negation,
        IntentKind::Question,
    ];

    /// Stable snake_case label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Farewell => "farewell",
            Self::MemoryStore => "memory_store",
            Self::MemoryRecall => "memory_recall",
            Self::Reminder => "reminder",
            Self::Calculate => "calculate",
            Self::Time => "time",
            Self::Date => "date",
            Self::Weather => "weather",
            Self::Joke => "joke",
            Self::Thanks => "thanks",
            Self::Help => "help",
            Self::Identity => "identity",
            Self::Correction => "correction",
            Self::Confirmation => "confirmation",
            Self::Negation => "negation",
            Self::Question => "question",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed fragment extracted from an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// What the utterance is about ("favorite color").
    Topic,
    /// What is asserted about the topic ("blue").
    Value,
    /// A clock time, relative day or duration phrase.
    Datetime,
    /// An arithmetic expression.
    Expression,
    /// A place name.
    Location,
}

/// Result of recognising one utterance. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentMatch {
    /// Winning label.
    pub intent: IntentKind,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// Extracted entities; absent types are simply missing.
    pub entities: BTreeMap<EntityKind, String>,
    /// The answer needs the knowledge collaborator.
    pub requires_external_data: bool,
    /// The utterance amends an earlier statement.
    pub is_correction: bool,
}

impl IntentMatch {
    /// The fallback match.
    #[must_use]
    pub fn unknown(confidence: f32) -> Self {
        Self {
            intent: IntentKind::Unknown,
            confidence,
            entities: BTreeMap::new(),
            requires_external_data: false,
            is_correction: false,
        }
    }

    /// Value of one entity, if extracted.
    #[must_use]
    pub fn entity(&self, kind: EntityKind) -> Option<&str> {
        self.entities.get(&kind).map(String::as_str)
    }

    /// Shorthand for the topic entity.
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.entity(EntityKind::Topic)
    }

    /// Shorthand for the value entity.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.entity(EntityKind::Value)
    }

    /// Whether the match is strong enough to act on (store, correct).
    #[must_use]
    pub fn is_committed(&self, action_threshold: f32) -> bool {
        self.intent != IntentKind::Unknown && self.confidence >= action_threshold
    }
}

/// Pattern-based intent classifier.
#[derive(Debug, Clone)]
pub struct IntentRecognizer {
    config: IntentConfig,
}

impl Default for IntentRecognizer {
    fn default() -> Self {
        Self::new(IntentConfig::default())
    }
}

impl IntentRecognizer {
    /// Create a recognizer over the built-in registry.
    #[must_use]
    pub fn new(config: IntentConfig) -> Self {
        Self { config }
    }

    /// Thresholds in effect.
    #[must_use]
    pub fn config(&self) -> &IntentConfig {
        &self.config
    }

    /// Compiled registry entries, in tie-break order.
    #[must_use]
    pub fn definitions(&self) -> &'static [IntentDefinition] {
        DEFINITIONS.as_slice()
    }

    /// Every intent with a non-zero score, best first (stable in registry order).
    #[must_use]
    pub fn rank(&self, input: &str) -> Vec<(IntentKind, f32)> {
        let mut scored: Vec<(IntentKind, f32)> = self
            .definitions()
            .iter()
            .map(|def| (def.spec.kind, def.score(input)))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
    }

    /// Whether `next` is a configured follow-up of `previous`.
    #[must_use]
    pub fn is_follow_up(&self, previous: IntentKind, next: IntentKind) -> bool {
        self.config
            .follow_ups
            .iter()
            .any(|rule| rule.after == previous && rule.then.contains(&next))
    }

    /// Classify a normalized utterance.
    ///
    /// `recent` holds the session's recent intents, oldest first; only the
    /// last one is consulted for the follow-up boost.
    #[must_use]
    pub fn recognize(&self, input: &str, recent: &[IntentKind]) -> IntentMatch {
        let ranked = self.rank(input);
        let Some(&(kind, score)) = ranked.first() else {
            return self.fallback(input, 0.0);
        };

        let mut confidence = score;
        if let Some(&previous) = recent.last() {
            if self.is_follow_up(previous, kind) {
                confidence = (confidence + self.config.follow_up_boost).min(1.0);
            }
        }

        if confidence < self.config.recognition_threshold {
            return self.fallback(input, confidence);
        }

        let Some(def) = self.definitions().iter().find(|d| d.spec.kind == kind) else {
            return self.fallback(input, confidence);
        };

        let mut entities = BTreeMap::new();
        for &entity in def.spec.entities.iter().chain(std::iter::once(&EntityKind::Datetime)) {
            if let Some(found) = entities::extract(entity, input) {
                entities.insert(entity, found);
            }
        }

        debug!(intent = %kind, confidence, entities = entities.len(), "Intent recognised");

        IntentMatch {
            intent: kind,
            confidence: confidence.clamp(0.0, 1.0),
            entities,
            requires_external_data: def.spec.requires_external_data,
            is_correction: def.spec.is_correction,
        }
    }

    fn fallback(&self, input: &str, best: f32) -> IntentMatch {
        debug!(best, "No intent cleared the threshold");
        let mut unknown = IntentMatch::unknown(self.config.unknown_confidence);
        if let Some(found) = entities::extract(EntityKind::Datetime, input) {
            unknown.entities.insert(EntityKind::Datetime, found);
        }
        unknown
    }
}
