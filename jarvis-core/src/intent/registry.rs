//! The intent registry: one declarative record per intent.
//!
//! Order matters. When two intents score the same, the one listed first
//! wins, so the table doubles as the tie-break order.
//!
//! Coverage is part of the score (`base * (0.5 + coverage * 0.5)`), so each
//! intent lists a whole-utterance pattern for its canonical phrasings and,
//! where useful, a keyword pattern that scores lower on longer inputs.

use std::sync::LazyLock;

use regex::Regex;

use super::{EntityKind, IntentKind};

/// Declarative description of one intent.
#[derive(Debug)]
pub struct IntentSpec {
    /// Label produced when this intent wins.
    pub kind: IntentKind,
    /// Confidence for a match covering the whole utterance.
    pub base_confidence: f32,
    /// Regular expressions tested against the normalized utterance.
    pub patterns: &'static [&'static str],
    /// Entity types extracted when this intent wins.
    pub entities: &'static [EntityKind],
    /// The answer needs an external knowledge source.
    pub requires_external_data: bool,
    /// The utterance amends something said earlier.
    pub is_correction: bool,
}

/// Spoken arithmetic: digits, symbols and operator words, with at least one digit.
const EXPRESSION: &str = r"^(?:what is |what's |whats |how much is |calculate |compute |solve )?(?:[-+*/%^x=().,\s\d]|plus|minus|times|multiplied by|divided by|over|mod|to the power of)*\d(?:[-+*/%^x=().,\s\d]|plus|minus|times|multiplied by|divided by|over|mod|to the power of)*\??$";

/// The built-in registry, in tie-break order.
pub static REGISTRY: &[IntentSpec] = &[
    IntentSpec {
        kind: IntentKind::Greeting,
        base_confidence: 0.9,
        patterns: &[
            r"^(?:hello|hi|hey|hiya|howdy|greetings|yo|good (?:morning|afternoon|evening))(?: there)?(?: jarvis)?[!.]*$",
            r"\b(?:hello|hi|hey|howdy|greetings|good (?:morning|afternoon|evening))\b",
        ],
        entities: &[],
        requires_external_data: false,
        is_correction: false,
    },
    IntentSpec {
        kind: IntentKind::Farewell,
        base_confidence: 0.9,
        patterns: &[
            r"^(?:goodbye|bye|bye bye|see you(?: later| soon)?|see ya|farewell|good night|later)(?: jarvis)?[!.]*$",
            r"\b(?:goodbye|bye|see you|farewell|good night)\b",
        ],
        entities: &[],
        requires_external_data: false,
        is_correction: false,
    },
    IntentSpec {
        kind: IntentKind::MemoryStore,
        base_confidence: 0.95,
        patterns: &[
            r"^(?:please )?(?:remember|note|memorize|save|store|write down)(?: that)? .+$",
            r"^my name is .+$",
            r"^call me .+$",
        ],
        entities: &[EntityKind::Topic, EntityKind::Value],
        requires_external_data: false,
        is_correction: false,
    },
    IntentSpec {
        kind: IntentKind::MemoryRecall,
        base_confidence: 0.9,
        patterns: &[
            r"^(?:what is|what's|whats|what are|what was|tell me) my [\p{L}0-9' -]+\??$",
            r"^what do i (?:like|love|enjoy)\??$",
            r"^who am i\??$",
            r"^do you (?:remember|know) my [\p{L}0-9' -]+\??$",
            r"^what do you (?:know|remember) about .+$",
        ],
        entities: &[EntityKind::Topic],
        requires_external_data: false,
        is_correction: false,
    },
    IntentSpec {
        kind: IntentKind::Reminder,
        base_confidence: 0.95,
        patterns: &[
            r"^(?:please )?remind me (?:to|about|that|at|on|in|by|tomorrow|tonight) .+$",
            r"^(?:please )?(?:set|create|add|make) (?:a |an )?(?:reminder|alarm)\b.*$",
        ],
        entities: &[EntityKind::Value],
        requires_external_data: false,
        is_correction: false,
    },
    IntentSpec {
        kind: IntentKind::Calculate,
        base_confidence: 0.9,
        patterns: &[EXPRESSION, r"^(?:calculate|compute|solve) .+$"],
        entities: &[EntityKind::Expression],
        requires_external_data: false,
        is_correction: false,
    },
    IntentSpec {
        kind: IntentKind::Time,
        base_confidence: 0.95,
        patterns: &[
            r"^(?:what's the (?:current )?time|what is the (?:current )?time|what time is it|(?:tell me )?the time|current time|time)(?: now| please| right now)?\??$",
            r"\bwhat time\b",
        ],
        entities: &[],
        requires_external_data: false,
        is_correction: false,
    },
    IntentSpec {
        kind: IntentKind::Date,
        base_confidence: 0.95,
        patterns: &[
            r"^(?:what's (?:the |today's )?date(?: today)?|what is (?:the |today's )?date(?: today)?|what day is (?:it|today)|what is today|today's date|date)\??$",
            r"\b(?:what day|the date)\b",
        ],
        entities: &[],
        requires_external_data: false,
        is_correction: false,
    },
    IntentSpec {
        kind: IntentKind::Weather,
        base_confidence: 0.9,
        patterns: &[r"^.*\b(?:weather|forecast|raining|snowing|sunny|temperature outside)\b.*$"],
        entities: &[EntityKind::Location],
        requires_external_data: true,
        is_correction: false,
    },
    IntentSpec {
        kind: IntentKind::Joke,
        base_confidence: 0.9,
        patterns: &[r"^.*\b(?:joke|jokes|make me laugh|something funny)\b.*$"],
        entities: &[],
        requires_external_data: false,
        is_correction: false,
    },
    IntentSpec {
        kind: IntentKind::Thanks,
        base_confidence: 0.9,
        patterns: &[
            r"^(?:thanks|thank you|thank you so much|thanks a lot|cheers|much appreciated|ty)(?: jarvis)?[!.]*$",
            r"\b(?:thanks|thank you|appreciate it)\b",
        ],
        entities: &[],
        requires_external_data: false,
        is_correction: false,
    },
    IntentSpec {
        kind: IntentKind::Help,
        base_confidence: 0.9,
        patterns: &[
            r"^(?:help|help me|what can you do|what are your (?:capabilities|features)|how can you help(?: me)?)\??$",
            r"\b(?:help|what can you do)\b",
        ],
        entities: &[],
        requires_external_data: false,
        is_correction: false,
    },
    IntentSpec {
        kind: IntentKind::Identity,
        base_confidence: 0.9,
        patterns: &[
            r"^(?:who|what) are you\??$",
            r"^what(?:'s| is) your name\??$",
            r"\b(?:your name|who are you)\b",
        ],
        entities: &[],
        requires_external_data: false,
        is_correction: false,
    },
    IntentSpec {
        kind: IntentKind::Correction,
        base_confidence: 0.9,
        patterns: &[
            r"^(?:no|nope|actually|wait)[,.!]? (?:it's|its|it is|i meant|i said|make that|change it to|my [\p{L}0-9' -]+ (?:is|are)) .+$",
            r"^(?:that's|that is) (?:wrong|not right|incorrect)\b.*$",
            r"^i meant .+$",
        ],
        entities: &[EntityKind::Topic, EntityKind::Value],
        requires_external_data: false,
        is_correction: true,
    },
    IntentSpec {
        kind: IntentKind::Confirmation,
        base_confidence: 0.85,
        patterns: &[
            r"^(?:yes|yeah|yep|yup|sure|correct|right|exactly|ok|okay|affirmative|absolutely|of course)[!.]*$",
            r"\b(?:yes|yeah|yep|correct|exactly)\b",
        ],
        entities: &[],
        requires_external_data: false,
        is_correction: false,
    },
    IntentSpec {
        kind: IntentKind::Negation,
        base_confidence: 0.85,
        patterns: &[
            r"^(?:no|nope|nah|not really|negative|no thanks|never mind|nevermind)[!.]*$",
            r"\b(?:no|nope|nah)\b",
        ],
        entities: &[],
        requires_external_data: false,
        is_correction: false,
    },
    IntentSpec {
        kind: IntentKind::Question,
        base_confidence: 0.8,
        patterns: &[
            r"^(?:what|who|where|when|why|how|which|is|are|can|could|does|do|will|should)\b.+$",
            r"^.+\?$",
        ],
        entities: &[EntityKind::Topic],
        requires_external_data: true,
        is_correction: false,
    },
];

/// A registry entry with its patterns compiled.
#[derive(Debug)]
pub struct IntentDefinition {
    /// The declarative record.
    pub spec: &'static IntentSpec,
    patterns: Vec<Regex>,
}

impl IntentDefinition {
    /// Compile one record. Patterns that fail to compile are logged and skipped.
    #[must_use]
    pub fn compile(spec: &'static IntentSpec) -> Self {
        let patterns = spec
            .patterns
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::error!(intent = %spec.kind, pattern = *p, error = %e, "Bad intent pattern");
                    None
                }
            })
            .collect();
        Self { spec, patterns }
    }

    /// Number of usable patterns.
    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Best confidence contribution across this intent's patterns, or 0.
    ///
    /// `coverage` is the matched length over the input length.
    #[must_use]
    pub fn score(&self, input: &str) -> f32 {
        let total = input.chars().count();
        if total == 0 {
            return 0.0;
        }
        self.patterns
            .iter()
            .filter_map(|re| re.find(input))
            .map(|m| {
                #[allow(clippy::cast_precision_loss)]
                let coverage = m.as_str().chars().count() as f32 / total as f32;
                self.spec.base_confidence * (0.5 + coverage * 0.5)
            })
            .fold(0.0_f32, f32::max)
    }
}

/// The compiled built-in registry.
pub static DEFINITIONS: LazyLock<Vec<IntentDefinition>> =
    LazyLock::new(|| REGISTRY.iter().map(IntentDefinition::compile).collect());

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(kind: IntentKind) -> &'static IntentDefinition {
        DEFINITIONS
            .iter()
            .find(|d| d.spec.kind == kind)
            .expect("registered")
    }

    #[test]
    fn every_pattern_compiles() {
        for def in DEFINITIONS.iter() {
            assert_eq!(def.pattern_count(), def.spec.patterns.len(), "{}", def.spec.kind);
        }
    }

    #[test]
    fn registry_order_is_fixed() {
        let order: Vec<IntentKind> = REGISTRY.iter().map(|s| s.kind).collect();
        assert_eq!(order, IntentKind::REGISTERED.to_vec());
    }

    #[test]
    fn full_coverage_scores_base_confidence() {
        let score = definition(IntentKind::Greeting).score("hello");
        assert!((score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn partial_coverage_scores_lower() {
        let input = "hello, can you tell me something interesting";
        let score = definition(IntentKind::Greeting).score(input);
        let coverage = 5.0 / input.len() as f32;
        assert!((score - 0.9 * (0.5 + coverage * 0.5)).abs() < 1e-6);
    }

    #[test]
    fn no_match_scores_zero() {
        assert!(definition(IntentKind::Joke).score("what time is it").abs() < f32::EPSILON);
        assert!(definition(IntentKind::Greeting).score("").abs() < f32::EPSILON);
    }

    #[test]
    fn memory_store_phrasings() {
        let def = definition(IntentKind::MemoryStore);
        for input in [
            "remember my favorite color is blue",
            "please remember that the wifi password is hunter2",
            "note that my dentist is dr. brown",
            "my name is tony",
            "call me tony",
        ] {
            assert!((def.score(input) - 0.95).abs() < 1e-6, "{input}");
        }
    }

    #[test]
    fn reminder_phrasings() {
        let def = definition(IntentKind::Reminder);
        for input in [
            "remind me to call mom at 5 pm",
            "please remind me in 20 minutes to stretch",
            "set a reminder to water the plants tomorrow",
        ] {
            assert!((def.score(input) - 0.95).abs() < 1e-6, "{input}");
        }
        assert!(def.score("what are my reminders").abs() < f32::EPSILON);
    }

    #[test]
    fn arithmetic_needs_a_digit() {
        let def = definition(IntentKind::Calculate);
        assert!(def.score("what is 2 + 2") > 0.89);
        assert!(def.score("12 divided by 4") > 0.89);
        assert!(def.score("what is love").abs() < f32::EPSILON);
    }

    #[test]
    fn flags_are_declared_on_the_record() {
        assert!(definition(IntentKind::Weather).spec.requires_external_data);
        assert!(definition(IntentKind::Question).spec.requires_external_data);
        assert!(definition(IntentKind::Correction).spec.is_correction);
        assert!(!definition(IntentKind::Greeting).spec.requires_external_data);
    }
}
