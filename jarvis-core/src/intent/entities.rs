//! Pattern-based entity extraction.
//!
//! Each entity type has an ordered list of rules; the first rule that matches
//! wins. A rule either captures group 1 or yields a fixed value. No match is
//! not an error, the entity is simply absent.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDateTime, NaiveTime, TimeDelta, Weekday};
use regex::Regex;

use super::EntityKind;

struct Rule {
    re: Regex,
    fixed: Option<&'static str>,
}

fn rules(specs: &[(&str, Option<&'static str>)]) -> Vec<Rule> {
    specs
        .iter()
        .filter_map(|(pattern, fixed)| {
            Regex::new(pattern).ok().map(|re| Rule { re, fixed: *fixed })
        })
        .collect()
}

static TOPIC_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    rules(&[
        (r"\b(?:call me|my name is|i am called)\b", Some("name")),
        (r"^who am i\b", Some("name")),
        (r"\bwhat do i (?:like|love|enjoy)\b", Some("likes")),
        (r"\bmy ([\p{L}0-9' -]+?) (?:is|are|was|were)\b", None),
        (
            r"^(?:please )?(?:remember|note|memorize|save|store|write down)(?: that)? (?:the |a |an )?([\p{L}0-9' -]+?) (?:is|are|was|were)\b",
            None,
        ),
        (r"\bmy ([\p{L}0-9' -]+?)\s*[?.!]*$", None),
        (r"\babout (?:the |a |an )?([\p{L}0-9' -]+?)\s*[?.!]*$", None),
        (
            r"^(?:what|who|where|when|which|how)(?: is| are| was| were|'s|s) (?:the |a |an )?([\p{L}0-9' -]+?)\s*[?.!]*$",
            None,
        ),
        (r"^(?:please )?(?:remember|note|memorize|save|store|write down)\b", Some("note")),
    ])
});

static VALUE_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    rules(&[
        (r"^(?:please )?remind me (?:about |that |to )?(.+?)[.!]*$", None),
        (
            r"^(?:please )?(?:set|create|add|make) (?:a |an )?(?:reminder|alarm)(?: (?:to|for|about|that))? (.+?)[.!]*$",
            None,
        ),
        (r"\bcall me ([\p{L}0-9' -]+?)[.!]*$", None),
        (
            r"^(?:no|nope|actually|wait)[,.!]? (?:it's |its |it is |i meant |i said |make that |change it to )(.+?)[.!]*$",
            None,
        ),
        (r"^i meant (.+?)[.!]*$", None),
        (r"\b(?:is|are|was|were) (.+?)[.!?]*$", None),
        (r"= ?(.+?)[.!?]*$", None),
        (r"'s (.+?)[.!?]*$", None),
        (
            r"^(?:please )?(?:remember|note|memorize|save|store|write down)(?: that)? (.+?)[.!]*$",
            None,
        ),
    ])
});

static EXPRESSION_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    rules(&[
        (
            r"^(?:what is |what's |whats |how much is |calculate |compute |solve )?(.*\d.*?)[?=\s]*$",
            None,
        ),
    ])
});

static LOCATION_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    rules(&[(
        r"\b(?:in|at|for) ([\p{L}][\p{L} .'-]*?)(?: today| tomorrow| tonight| this week| right now| now)?\s*[?.!]*$",
        None,
    )])
});

static DATETIME_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:in \d+ (?:seconds?|secs?|minutes?|mins?|hours?|hrs?|days?|weeks?)|\d{1,2}(?::\d{2})? ?(?:am|pm)|\d{1,2}:\d{2}|today|tonight|tomorrow|yesterday|noon|midnight|next (?:week|monday|tuesday|wednesday|thursday|friday|saturday|sunday))\b",
    )
    .ok()
});

const DATETIME_WORDS: &[&str] = &["today", "tomorrow", "tonight", "yesterday", "now"];

/// Extract one entity from a normalized utterance.
#[must_use]
pub fn extract(kind: EntityKind, input: &str) -> Option<String> {
    let found = match kind {
        EntityKind::Topic => apply(&TOPIC_RULES, input).map(|t| strip_articles(&t)),
        EntityKind::Value => apply(&VALUE_RULES, input),
        EntityKind::Expression => apply(&EXPRESSION_RULES, input),
        EntityKind::Location => apply(&LOCATION_RULES, input)
            .filter(|l| !DATETIME_WORDS.contains(&l.as_str())),
        EntityKind::Datetime => DATETIME_RE
            .as_ref()
            .and_then(|re| re.find(input))
            .map(|m| m.as_str().to_string()),
    }?;
    let trimmed = found.trim().to_string();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn apply(rules: &[Rule], input: &str) -> Option<String> {
    rules.iter().find_map(|rule| {
        let caps = rule.re.captures(input)?;
        match rule.fixed {
            Some(fixed) => Some(fixed.to_string()),
            None => caps.get(1).map(|m| m.as_str().to_string()),
        }
    })
}

fn strip_articles(topic: &str) -> String {
    let mut rest = topic.trim();
    for article in ["the ", "a ", "an ", "my "] {
        if let Some(stripped) = rest.strip_prefix(article) {
            rest = stripped;
        }
    }
    rest.trim().to_string()
}

// ---------------------------------------------------------------------------
// Datetime resolution
// ---------------------------------------------------------------------------

/// Turn an extracted datetime phrase into a concrete local time.
///
/// Clock times that have already passed today roll over to tomorrow.
/// Returns `None` for phrases it doesn't understand and for offsets that
/// fall outside the representable calendar.
#[must_use]
pub fn resolve_datetime(phrase: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let phrase = phrase.trim().to_lowercase();
    let today = now.date();
    let days = |n: i64| TimeDelta::try_days(n).and_then(|d| now.checked_add_signed(d));

    match phrase.as_str() {
        "today" => return Some(now),
        "tonight" => return Some(today.and_time(NaiveTime::from_hms_opt(20, 0, 0)?)),
        "tomorrow" => return days(1),
        "yesterday" => return days(-1),
        "noon" => return roll_forward(today.and_time(NaiveTime::from_hms_opt(12, 0, 0)?), now),
        "midnight" => return Some(today.succ_opt()?.and_time(NaiveTime::MIN)),
        "next week" => return days(7),
        _ => {}
    }

    if let Some(day) = phrase.strip_prefix("next ") {
        let weekday: Weekday = day.parse().ok()?;
        let ahead = (7 + weekday.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
        let ahead = if ahead == 0 { 7 } else { ahead };
        return days(i64::from(ahead));
    }

    if let Some(rest) = phrase.strip_prefix("in ") {
        let mut parts = rest.split_whitespace();
        let amount: i64 = parts.next()?.parse().ok()?;
        let unit = parts.next()?;
        let delta = match unit.trim_end_matches('s') {
            "second" | "sec" => TimeDelta::try_seconds(amount),
            "minute" | "min" => TimeDelta::try_minutes(amount),
            "hour" | "hr" => TimeDelta::try_hours(amount),
            "day" => TimeDelta::try_days(amount),
            "week" => TimeDelta::try_weeks(amount),
            _ => None,
        }?;
        return now.checked_add_signed(delta);
    }

    let time = parse_clock(&phrase)?;
    roll_forward(today.and_time(time), now)
}

fn roll_forward(candidate: NaiveDateTime, now: NaiveDateTime) -> Option<NaiveDateTime> {
    if candidate < now {
        candidate.checked_add_signed(TimeDelta::try_days(1)?)
    } else {
        Some(candidate)
    }
}

fn parse_clock(phrase: &str) -> Option<NaiveTime> {
    let compact = phrase.replace(' ', "");
    let (digits, meridiem) = if let Some(d) = compact.strip_suffix("am") {
        (d, Some(false))
    } else if let Some(d) = compact.strip_suffix("pm") {
        (d, Some(true))
    } else {
        (compact.as_str(), None)
    };

    let (hour, minute) = match digits.split_once(':') {
        Some((h, m)) => (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?),
        None => (digits.parse::<u32>().ok()?, 0),
    };

    let hour = match meridiem {
        Some(pm) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            match (hour, pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, true) => h + 12,
                (h, false) => h,
            }
        }
        None => hour,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}
