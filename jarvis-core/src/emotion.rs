//! Emotional State Model: a six-dimension affect tracker with decay.
//!
//! Each analysed utterance produces a keyword-density signal per dimension.
//! Dimensions that received a signal move toward it by `volatility`; the
//! others hold. A negation marker anywhere in the utterance halves every
//! signal first. Between utterances, [`EmotionModel::decay`] pulls all
//! dimensions back toward the baseline so idle sessions cool off.
//!
//! Derived values:
//!
//! ```text
//! valence = ((joy + trust) / 2 - (sadness + anger + fear) / 3 + 1) / 2
//! arousal = (anger + fear + surprise + joy) / 4
//! ```
//!
//! The dominant emotion is the dimension exceeding
//! `max(dominance_threshold, baseline)` by the largest margin (ties go to
//! the earlier dimension); otherwise the state is neutral.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::EmotionConfig;

/// A labelled affect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    /// No dimension stands out.
    #[default]
    Neutral,
    /// Pleasure, excitement.
    Joy,
    /// Sadness, disappointment.
    Sadness,
    /// Anger, frustration.
    Anger,
    /// Fear, worry.
    Fear,
    /// Surprise, astonishment.
    Surprise,
    /// Trust, gratitude.
    Trust,
}

impl Emotion {
    /// The six tracked dimensions, in tie-break order.
    pub const DIMENSIONS: [Emotion; 6] = [
        Emotion::Joy,
        Emotion::Sadness,
        Emotion::Anger,
        Emotion::Fear,
        Emotion::Surprise,
        Emotion::Trust,
    ];

    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Joy => "joy",
            Self::Sadness => "sadness",
            Self::Anger => "anger",
            Self::Fear => "fear",
            Self::Surprise => "surprise",
            Self::Trust => "trust",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values of the six dimensions, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Joy.
    pub joy: f32,
    /// Sadness.
    pub sadness: f32,
    /// Anger.
    pub anger: f32,
    /// Fear.
    pub fear: f32,
    /// Surprise.
    pub surprise: f32,
    /// Trust.
    pub trust: f32,
}

impl Dimensions {
    /// All dimensions at `value`.
    #[must_use]
    pub fn uniform(value: f32) -> Self {
        let v = value.clamp(0.0, 1.0);
        Self { joy: v, sadness: v, anger: v, fear: v, surprise: v, trust: v }
    }

    /// Value of one dimension (`Neutral` reads as 0).
    #[must_use]
    pub fn get(&self, emotion: Emotion) -> f32 {
        match emotion {
            Emotion::Neutral => 0.0,
            Emotion::Joy => self.joy,
            Emotion::Sadness => self.sadness,
            Emotion::Anger => self.anger,
            Emotion::Fear => self.fear,
            Emotion::Surprise => self.surprise,
            Emotion::Trust => self.trust,
        }
    }

    fn slot(&mut self, emotion: Emotion) -> Option<&mut f32> {
        match emotion {
            Emotion::Neutral => None,
            Emotion::Joy => Some(&mut self.joy),
            Emotion::Sadness => Some(&mut self.sadness),
            Emotion::Anger => Some(&mut self.anger),
            Emotion::Fear => Some(&mut self.fear),
            Emotion::Surprise => Some(&mut self.surprise),
            Emotion::Trust => Some(&mut self.trust),
        }
    }

    /// Set one dimension, clamped to `[0, 1]`.
    pub fn set(&mut self, emotion: Emotion, value: f32) {
        if let Some(slot) = self.slot(emotion) {
            *slot = value.clamp(0.0, 1.0);
        }
    }

    /// `(dimension, value)` pairs in tie-break order.
    #[must_use]
    pub fn pairs(&self) -> [(Emotion, f32); 6] {
        Emotion::DIMENSIONS.map(|e| (e, self.get(e)))
    }
}

/// Snapshot of the affect tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionalState {
    /// Raw dimensions.
    pub dimensions: Dimensions,
    /// Pleasantness, `[0, 1]`.
    pub valence: f32,
    /// Activation, `[0, 1]`.
    pub arousal: f32,
    /// Dominant label.
    pub current: Emotion,
    /// Strength of the dominant label, `[0, 1]`.
    pub intensity: f32,
}

impl EmotionalState {
    /// A resting state with every dimension at `baseline`.
    #[must_use]
    pub fn at_rest(config: &EmotionConfig) -> Self {
        Self::derive(Dimensions::uniform(config.baseline), config)
    }

    fn derive(dimensions: Dimensions, config: &EmotionConfig) -> Self {
        let d = dimensions;
        let valence = (((d.joy + d.trust) / 2.0 - (d.sadness + d.anger + d.fear) / 3.0 + 1.0) / 2.0)
            .clamp(0.0, 1.0);
        let arousal = ((d.anger + d.fear + d.surprise + d.joy) / 4.0).clamp(0.0, 1.0);

        let floor = config.dominance_threshold.max(config.baseline);
        let mut current = Emotion::Neutral;
        let mut best_margin = 0.0_f32;
        for (emotion, value) in d.pairs() {
            let margin = value - floor;
            if margin > best_margin {
                best_margin = margin;
                current = emotion;
            }
        }

        let intensity = if current == Emotion::Neutral {
            ((arousal - 0.5).abs() * 2.0).clamp(0.0, 1.0)
        } else {
            d.get(current)
        };

        Self {
            dimensions,
            valence,
            arousal,
            current,
            intensity,
        }
    }
}

/// Feedback from a completed exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionOutcome {
    /// The response served the request.
    pub helpful: bool,
    /// The request failed.
    pub error: bool,
}

// ---------------------------------------------------------------------------
// Lexicon
// ---------------------------------------------------------------------------

const JOY_WORDS: &[&str] = &[
    "happy", "glad", "great", "awesome", "love", "wonderful", "excellent", "amazing",
    "fantastic", "good", "nice", "yay", "excited", "thrilled", "delighted", "fun", "cool",
    "perfect", "brilliant", "haha", "lol", "enjoy",
];
const SADNESS_WORDS: &[&str] = &[
    "sad", "unhappy", "depressed", "down", "lonely", "miss", "cry", "crying", "upset",
    "disappointed", "awful", "hurt", "tired", "bad", "miserable", "gloomy",
];
const ANGER_WORDS: &[&str] = &[
    "hate", "angry", "mad", "furious", "annoyed", "stupid", "useless", "idiot", "worst",
    "frustrated", "annoying", "terrible", "damn", "ridiculous", "rage",
];
const FEAR_WORDS: &[&str] = &[
    "scared", "afraid", "worried", "anxious", "nervous", "fear", "panic", "terrified",
    "scary", "danger", "dangerous", "frightened",
];
const SURPRISE_WORDS: &[&str] = &[
    "wow", "whoa", "really", "surprised", "unexpected", "omg", "unbelievable", "incredible",
    "shocked", "seriously", "suddenly",
];
const TRUST_WORDS: &[&str] = &[
    "thanks", "thank", "trust", "reliable", "appreciate", "rely", "believe", "confident",
    "honest", "friend", "safe", "depend",
];
const NEGATIONS: &[&str] = &[
    "not", "no", "never", "don't", "dont", "doesn't", "isn't", "wasn't", "aren't", "can't",
    "cannot", "won't", "nothing", "neither", "nor",
];

fn lexicon(emotion: Emotion) -> &'static [&'static str] {
    match emotion {
        Emotion::Neutral => &[],
        Emotion::Joy => JOY_WORDS,
        Emotion::Sadness => SADNESS_WORDS,
        Emotion::Anger => ANGER_WORDS,
        Emotion::Fear => FEAR_WORDS,
        Emotion::Surprise => SURPRISE_WORDS,
        Emotion::Trust => TRUST_WORDS,
    }
}

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Per-session affect tracker.
#[derive(Debug, Clone)]
pub struct EmotionModel {
    config: EmotionConfig,
    state: EmotionalState,
    history: VecDeque<EmotionalState>,
}

impl EmotionModel {
    /// A tracker at rest.
    #[must_use]
    pub fn new(config: EmotionConfig) -> Self {
        let state = EmotionalState::at_rest(&config);
        Self {
            history: VecDeque::with_capacity(config.history_len.min(1024)),
            config,
            state,
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn state(&self) -> EmotionalState {
        self.state
    }

    /// Snapshots recorded by [`EmotionModel::analyze`], oldest first.
    pub fn history(&self) -> impl Iterator<Item = &EmotionalState> {
        self.history.iter()
    }

    /// Per-dimension signal strengths for `text`, after negation damping.
    #[must_use]
    pub fn signals(&self, text: &str) -> Dimensions {
        let words = words(text);
        let mut signals = Dimensions::uniform(0.0);
        if words.is_empty() {
            return signals;
        }

        #[allow(clippy::cast_precision_loss)]
        let total = words.len() as f32;
        let negated = words.iter().any(|w| NEGATIONS.contains(&w.as_str()));

        for emotion in Emotion::DIMENSIONS {
            let lexicon = lexicon(emotion);
            let hits = words.iter().filter(|w| lexicon.contains(&w.as_str())).count();
            #[allow(clippy::cast_precision_loss)]
            let mut signal = (hits as f32 / total * self.config.keyword_gain).min(1.0);
            if negated {
                signal *= 0.5;
            }
            signals.set(emotion, signal);
        }
        signals
    }

    /// Fold an utterance into the state and return the new snapshot.
    pub fn analyze(&mut self, text: &str) -> EmotionalState {
        let signals = self.signals(text);
        let volatility = self.config.volatility.clamp(0.0, 1.0);

        let mut dims = self.state.dimensions;
        for (emotion, signal) in signals.pairs() {
            if signal > 0.0 {
                let current = dims.get(emotion);
                dims.set(emotion, current + (signal - current) * volatility);
            }
        }

        self.state = EmotionalState::derive(dims, &self.config);
        self.history.push_back(self.state);
        while self.history.len() > self.config.history_len {
            self.history.pop_front();
        }

        tracing::trace!(
            current = %self.state.current,
            intensity = self.state.intensity,
            valence = self.state.valence,
            "Emotion analysed"
        );
        self.state
    }

    /// Pull every dimension `decay_rate` of the way back to baseline.
    pub fn decay(&mut self) {
        let rate = self.config.decay_rate.clamp(0.0, 1.0);
        let baseline = self.config.baseline;
        let mut dims = self.state.dimensions;
        for (emotion, value) in dims.pairs() {
            dims.set(emotion, value + (baseline - value) * rate);
        }
        self.state = EmotionalState::derive(dims, &self.config);
    }

    /// Nudge joy up after a helpful exchange and sadness up after an error.
    pub fn update_from_interaction(&mut self, outcome: InteractionOutcome) {
        let nudge = self.config.interaction_nudge;
        let mut dims = self.state.dimensions;
        if outcome.helpful {
            dims.set(Emotion::Joy, dims.joy + nudge);
        }
        if outcome.error {
            dims.set(Emotion::Sadness, dims.sadness + nudge);
        }
        self.state = EmotionalState::derive(dims, &self.config);
    }
}
