//! Knowledge request types.

use serde::Serialize;

use jarvis_core::{EntityKind, IntentKind, IntentMatch};

/// What the orchestrator wants to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeQuery {
    /// Intent that needs the knowledge.
    pub intent: IntentKind,
    /// Subject of a question.
    pub topic: Option<String>,
    /// Place, for weather.
    pub location: Option<String>,
    /// The normalized utterance.
    pub text: String,
}

impl KnowledgeQuery {
    /// Build a query from a recognised intent.
    #[must_use]
    pub fn from_match(intent: &IntentMatch, text: impl Into<String>) -> Self {
        Self {
            intent: intent.intent,
            topic: intent.topic().map(str::to_string),
            location: intent.entity(EntityKind::Location).map(str::to_string),
            text: text.into(),
        }
    }

    /// Lookup key: `weather:<location>` for weather, the topic (or the whole
    /// text) otherwise.
    #[must_use]
    pub fn key(&self) -> String {
        match self.intent {
            IntentKind::Weather => {
                format!("weather:{}", self.location.as_deref().unwrap_or("here"))
            }
            _ => self.topic.clone().unwrap_or_else(|| self.text.clone()),
        }
    }
}
