//! Personality post-processing and emoji augmentation.

use std::fmt;
use std::sync::LazyLock;

use rand::Rng;
use rand::seq::SliceRandom;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

use crate::emotion::{Emotion, EmotionalState};

/// Voice applied to every response after rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Personality {
    /// Measured: no exclamation marks, no emoji.
    #[default]
    Professional,
    /// Warm: formal address and phrasing softened.
    Friendly,
    /// Dry: a wry aside appended.
    Witty,
    /// Text passes through untouched.
    Default,
}

impl Personality {
    /// Config name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Friendly => "friendly",
            Self::Witty => "witty",
            Self::Default => "default",
        }
    }
}

impl From<String> for Personality {
    fn from(name: String) -> Self {
        match name.trim().to_lowercase().as_str() {
            "professional" => Self::Professional,
            "friendly" => Self::Friendly,
            "witty" => Self::Witty,
            _ => Self::Default,
        }
    }
}

impl From<Personality> for String {
    fn from(p: Personality) -> Self {
        p.as_str().to_string()
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const WITTY_ASIDES: &[&str] = &[
    "Naturally.",
    "All part of the service.",
    "I do try to keep things interesting.",
    "You may applaud at your leisure.",
    "I'd raise an eyebrow if I had one.",
];

static FORMAL_ADDRESS: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\b[Ss]ir\b").ok());

static FRIENDLY_PHRASES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\bHow may I\b", "How can I"),
        (r"\bVery well\b", "Sure thing"),
        (r"\bGreetings\b", "Hi there"),
        (r"\bCertainly\b", "Sure"),
        (r"\bI'm afraid\b", "Sorry,"),
    ]
    .into_iter()
    .filter_map(|(p, r)| Regex::new(p).ok().map(|re| (re, r)))
    .collect()
});

/// Emoji for a strong emotion, if one is mapped.
#[must_use]
pub fn emoji_for(state: &EmotionalState) -> Option<&'static str> {
    match state.current {
        Emotion::Joy if state.arousal > 0.7 => Some("🎉"),
        Emotion::Joy => Some("😊"),
        Emotion::Surprise => Some("😮"),
        Emotion::Fear | Emotion::Sadness => Some("😟"),
        _ => None,
    }
}

fn is_emoji(c: char) -> bool {
    matches!(u32::from(c), 0x1F300..=0x1FAFF | 0x2600..=0x27BF | 0xFE0F | 0x200D)
}

/// Apply a personality to rendered text.
pub fn apply<R: Rng + ?Sized>(
    personality: Personality,
    text: &str,
    casual_name: &str,
    rng: &mut R,
) -> String {
    match personality {
        Personality::Professional => professional(text),
        Personality::Friendly => {
            let mut out = match FORMAL_ADDRESS.as_ref() {
                Some(re) => re.replace_all(text, NoExpand(casual_name)).into_owned(),
                None => text.to_string(),
            };
            for (re, replacement) in FRIENDLY_PHRASES.iter() {
                out = re.replace_all(&out, *replacement).into_owned();
            }
            out
        }
        Personality::Witty => match WITTY_ASIDES.choose(rng) {
            Some(aside) => format!("{text} {aside}"),
            None => text.to_string(),
        },
        Personality::Default => text.to_string(),
    }
}

/// Strip emoji and turn exclamations into full stops.
fn professional(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().filter(|c| !is_emoji(*c)) {
        if c == '!' {
            if !matches!(out.chars().last(), Some('.' | '?')) {
                out.push('.');
            }
        } else {
            out.push(c);
        }
    }
    out.trim_end().to_string()
}
