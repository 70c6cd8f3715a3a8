//! Per-session conversation context: the bounded recent-history buffer used
//! to disambiguate follow-up intents.

use std::collections::VecDeque;

use serde::Serialize;

use crate::intent::IntentKind;

/// Recent normalized utterances and recognised intents, FIFO-bounded.
///
/// Owned by a single session. Both buffers share the same bound; the oldest
/// entry is dropped first once it is reached.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationContext {
    utterances: VecDeque<String>,
    intents: VecDeque<IntentKind>,
    max: usize,
    turns: u64,
}

impl ConversationContext {
    /// Create an empty context holding at most `max` entries per buffer.
    #[must_use]
    pub fn new(max: usize) -> Self {
        let max = max.max(1);
        Self {
            utterances: VecDeque::with_capacity(max),
            intents: VecDeque::with_capacity(max),
            max,
            turns: 0,
        }
    }

    /// Append a normalized utterance, evicting the oldest if full.
    pub fn push_utterance(&mut self, utterance: impl Into<String>) {
        if self.utterances.len() == self.max {
            self.utterances.pop_front();
        }
        self.utterances.push_back(utterance.into());
        self.turns += 1;
    }

    /// Append a recognised intent, evicting the oldest if full.
    pub fn push_intent(&mut self, intent: IntentKind) {
        if self.intents.len() == self.max {
            self.intents.pop_front();
        }
        self.intents.push_back(intent);
    }

    /// Recent intents, oldest first.
    #[must_use]
    pub fn recent_intents(&self) -> Vec<IntentKind> {
        self.intents.iter().copied().collect()
    }

    /// The most recent intent, if any.
    #[must_use]
    pub fn last_intent(&self) -> Option<IntentKind> {
        self.intents.back().copied()
    }

    /// Recent utterances, oldest first.
    pub fn utterances(&self) -> impl Iterator<Item = &str> {
        self.utterances.iter().map(String::as_str)
    }

    /// Number of utterances currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    /// Whether no utterance has been held yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }

    /// Configured bound.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.max
    }

    /// Utterances seen over the whole session, including evicted ones.
    #[must_use]
    pub fn turn_count(&self) -> u64 {
        self.turns
    }
}
