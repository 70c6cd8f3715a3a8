//! Configuration for the assistant core.
//!
//! Maps directly to `jarvis.toml`. Every section has serde defaults, so a
//! partial file (or an empty one) is a valid configuration. The blending and
//! pruning constants are policy knobs, not derived values.

use serde::{Deserialize, Serialize};

use crate::intent::IntentKind;
use crate::response::Personality;

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JarvisConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Fact store blending, search and pruning.
    #[serde(default)]
    pub facts: FactConfig,
    /// Emotional state dynamics.
    #[serde(default)]
    pub emotion: EmotionConfig,
    /// Intent recognition thresholds and follow-up table.
    #[serde(default)]
    pub intent: IntentConfig,
    /// Response style.
    #[serde(default)]
    pub response: ResponseConfig,
    /// Per-session behaviour.
    #[serde(default)]
    pub session: SessionConfig,
    /// Durable store settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// External knowledge collaborator.
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

impl JarvisConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `CoreError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::CoreError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Fact store policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactConfig {
    /// Weight kept by the existing confidence on a repeated write
    /// (`blended = old * r + new * (1 - r)`).
    #[serde(default = "default_0_7")]
    pub blend_retention: f32,
    /// Confidence given to a write that doesn't specify one.
    #[serde(default = "default_1_0")]
    pub default_confidence: f32,
    /// Facts below this confidence are prune candidates.
    #[serde(default = "default_0_3")]
    pub prune_confidence: f32,
    /// Facts read fewer times than this are prune candidates.
    #[serde(default = "default_5")]
    pub prune_access_count: u32,
    /// Days without access before a weak fact may be pruned.
    #[serde(default = "default_30")]
    pub retention_days: u32,
    /// Default number of search hits.
    #[serde(default = "default_10_usize")]
    pub search_limit: usize,
    /// Default minimum confidence for search hits.
    #[serde(default = "default_0_5")]
    pub search_min_confidence: f32,
}

impl Default for FactConfig {
    fn default() -> Self {
        Self {
            blend_retention: 0.7,
            default_confidence: 1.0,
            prune_confidence: 0.3,
            prune_access_count: 5,
            retention_days: 30,
            search_limit: 10,
            search_min_confidence: 0.5,
        }
    }
}

/// Emotional state dynamics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionConfig {
    /// How far each analysis moves a dimension toward its new signal.
    #[serde(default = "default_0_3")]
    pub volatility: f32,
    /// Resting value every dimension decays toward.
    #[serde(default = "default_0_5")]
    pub baseline: f32,
    /// A dimension must exceed this to be dominant.
    #[serde(default = "default_0_3")]
    pub dominance_threshold: f32,
    /// Fraction of the distance to baseline removed per decay tick.
    #[serde(default = "default_0_05")]
    pub decay_rate: f32,
    /// Multiplier from keyword density to signal strength.
    #[serde(default = "default_3_0")]
    pub keyword_gain: f32,
    /// Bounded number of history snapshots.
    #[serde(default = "default_100_usize")]
    pub history_len: usize,
    /// Step applied by helpful/error interaction feedback.
    #[serde(default = "default_0_05")]
    pub interaction_nudge: f32,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            volatility: 0.3,
            baseline: 0.5,
            dominance_threshold: 0.3,
            decay_rate: 0.05,
            keyword_gain: 3.0,
            history_len: 100,
            interaction_nudge: 0.05,
        }
    }
}

/// A follow-up adjacency rule: after `after`, any of `then` gets a boost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpRule {
    /// The immediately preceding intent.
    pub after: IntentKind,
    /// Intents that count as a natural follow-up.
    pub then: Vec<IntentKind>,
}

/// Intent recognition thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentConfig {
    /// Below this the utterance resolves to `unknown`.
    #[serde(default = "default_0_5")]
    pub recognition_threshold: f32,
    /// Side effects (storing, correcting) require at least this.
    #[serde(default = "default_0_7")]
    pub action_threshold: f32,
    /// Confidence reported for the `unknown` fallback.
    #[serde(default = "default_0_5")]
    pub unknown_confidence: f32,
    /// Boost for a recognised follow-up of the previous intent.
    #[serde(default = "default_0_15")]
    pub follow_up_boost: f32,
    /// Follow-up adjacency table.
    #[serde(default = "default_follow_ups")]
    pub follow_ups: Vec<FollowUpRule>,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            recognition_threshold: 0.5,
            action_threshold: 0.7,
            unknown_confidence: 0.5,
            follow_up_boost: 0.15,
            follow_ups: default_follow_ups(),
        }
    }
}

/// Response style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseConfig {
    /// Post-processing personality.
    #[serde(default)]
    pub personality: Personality,
    /// Append an emoji for strong emotions.
    #[serde(default)]
    pub use_emoji: bool,
    /// Responses longer than this many characters are truncated.
    #[serde(default = "default_500_usize")]
    pub max_length: usize,
    /// Templates remembered per category to avoid reuse.
    #[serde(default = "default_5_usize")]
    pub template_history: usize,
    /// Emitted responses remembered to avoid verbatim repeats.
    #[serde(default = "default_10_usize")]
    pub recent_window: usize,
    /// Address used in formal and enthusiastic tones when no name is known.
    #[serde(default = "default_formal_name")]
    pub formal_name: String,
    /// Address used in casual tone when no name is known.
    #[serde(default = "default_casual_name")]
    pub casual_name: String,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            personality: Personality::default(),
            use_emoji: false,
            max_length: 500,
            template_history: 5,
            recent_window: 10,
            formal_name: default_formal_name(),
            casual_name: default_casual_name(),
        }
    }
}

/// Per-session behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum utterances (and intents) kept in the context window.
    #[serde(default = "default_20_usize")]
    pub context_window: usize,
    /// Extract and store simple statements from every utterance.
    #[serde(default = "default_true")]
    pub auto_learn: bool,
    /// Buffered lifecycle events per subscriber.
    #[serde(default = "default_256_usize")]
    pub event_capacity: usize,
    /// Emotion decay period in milliseconds.
    #[serde(default = "default_5000")]
    pub decay_interval_ms: u64,
    /// Fact maintenance period in seconds.
    #[serde(default = "default_3600")]
    pub maintenance_interval_secs: u64,
    /// How often due reminders are checked, in seconds.
    #[serde(default = "default_60")]
    pub reminder_check_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            context_window: 20,
            auto_learn: true,
            event_capacity: 256,
            decay_interval_ms: 5000,
            maintenance_interval_secs: 3600,
            reminder_check_secs: 60,
        }
    }
}

/// Durable store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Use WAL mode for concurrent reads.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self { wal_mode: true }
    }
}

/// External knowledge collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Provider: "none" or "http".
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Base URL of the HTTP knowledge endpoint.
    #[serde(default)]
    pub base_url: String,
    /// Hard timeout for one acquisition, in milliseconds.
    #[serde(default = "default_3000")]
    pub timeout_ms: u64,
    /// Retries after the first failed attempt.
    #[serde(default = "default_1")]
    pub max_retries: u32,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: String::new(),
            timeout_ms: 3000,
            max_retries: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_provider() -> String { "none".to_string() }
fn default_formal_name() -> String { "Sir".to_string() }
fn default_casual_name() -> String { "friend".to_string() }
fn default_0_05() -> f32 { 0.05 }
fn default_0_15() -> f32 { 0.15 }
fn default_0_3() -> f32 { 0.3 }
fn default_0_5() -> f32 { 0.5 }
fn default_0_7() -> f32 { 0.7 }
fn default_1_0() -> f32 { 1.0 }
fn default_3_0() -> f32 { 3.0 }
fn default_1() -> u32 { 1 }
fn default_5() -> u32 { 5 }
fn default_30() -> u32 { 30 }
fn default_5_usize() -> usize { 5 }
fn default_10_usize() -> usize { 10 }
fn default_20_usize() -> usize { 20 }
fn default_100_usize() -> usize { 100 }
fn default_256_usize() -> usize { 256 }
fn default_500_usize() -> usize { 500 }
fn default_60() -> u64 { 60 }
fn default_3000() -> u64 { 3000 }
fn default_3600() -> u64 { 3600 }
fn default_5000() -> u64 { 5000 }

fn default_follow_ups() -> Vec<FollowUpRule> {
    use IntentKind::{
        Calculate, Confirmation, Correction, Greeting, Help, Joke, MemoryStore, Negation, Question,
        Thanks,
    };
    vec![
        FollowUpRule { after: Question, then: vec![Confirmation, Negation, Question] },
        FollowUpRule { after: Greeting, then: vec![Question, Help] },
        FollowUpRule { after: MemoryStore, then: vec![Confirmation, Correction] },
        FollowUpRule { after: Calculate, then: vec![Calculate] },
        FollowUpRule { after: Joke, then: vec![Joke, Thanks] },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = JarvisConfig::from_toml("").expect("parse");
        assert!((config.facts.blend_retention - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.facts.retention_days, 30);
        assert_eq!(config.session.context_window, 20);
        assert_eq!(config.session.reminder_check_secs, 60);
        assert_eq!(config.intent.follow_ups.len(), 5);
        assert_eq!(config.response.personality, Personality::Professional);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = JarvisConfig::from_toml(
            r#"
            [facts]
            prune_confidence = 0.2

            [response]
            personality = "witty"
            use_emoji = true

            [[intent.follow_ups]]
            after = "weather"
            then = ["weather", "thanks"]
            "#,
        )
        .expect("parse");

        assert!((config.facts.prune_confidence - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.facts.prune_access_count, 5);
        assert_eq!(config.response.personality, Personality::Witty);
        assert!(config.response.use_emoji);
        assert_eq!(
            config.intent.follow_ups,
            vec![FollowUpRule {
                after: IntentKind::Weather,
                then: vec![IntentKind::Weather, IntentKind::Thanks],
            }]
        );
    }

    #[test]
    fn unknown_personality_falls_back_to_default() {
        let config = JarvisConfig::from_toml("[response]\npersonality = \"pirate\"").expect("parse");
        assert_eq!(config.response.personality, Personality::Default);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = JarvisConfig::from_toml("[facts\nblend").expect_err("should fail");
        assert!(matches!(err, crate::CoreError::Config(_)));
    }
}
