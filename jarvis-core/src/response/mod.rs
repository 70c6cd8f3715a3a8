//! Response Generator: templated, anti-repetition, personality-filtered text.
//!
//! Pipeline for one response:
//!
//! 1. Dispatch on the intent to a category and its template pool (tone
//!    picks the pool variant for the social categories).
//! 2. Select a template not among the category's recent picks, render it,
//!    and reselect if the rendered text is in the global recent window.
//! 3. Append an emoji for strong emotions (when enabled).
//! 4. Apply the personality filter.
//! 5. Truncate to `max_length`.
//!
//! Generation never fails: anything unrecognised ends up in the clarifying
//! pool.

pub mod personality;
pub mod templates;

use std::collections::{HashMap, VecDeque};

use chrono::{Datelike, NaiveDateTime, Timelike};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::agenda::{Listing, Note, Reminder};
use crate::calc;
use crate::config::ResponseConfig;
use crate::emotion::{Emotion, EmotionalState};
use crate::intent::{EntityKind, IntentKind, IntentMatch};
use crate::store::FactHit;
use crate::types::display_value;

pub use personality::Personality;
pub use templates::{ResponseCategory, Tone};

/// Per-session facts the generator may use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseContext {
    /// How the user wants to be addressed.
    pub name: Option<String>,
    /// Utterances seen in this session, including the current one.
    pub turn_count: u64,
    /// Topic rewritten by a correction in this request.
    pub correction_topic: Option<String>,
    /// Note saved by this request.
    pub note: Option<Note>,
    /// Reminder scheduled by this request.
    pub reminder: Option<Reminder>,
    /// Notes or reminders the user asked to see.
    pub listing: Option<Listing>,
}

/// Everything the generator needs for one response.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// Recognised intent.
    pub intent: &'a IntentMatch,
    /// Session context.
    pub context: &'a ResponseContext,
    /// Facts retrieved for the request, best first.
    pub memories: &'a [FactHit],
    /// Emotional state after analysing the utterance.
    pub emotion: &'a EmotionalState,
    /// External knowledge, when it was acquired.
    pub knowledge: Option<&'a serde_json::Value>,
    /// Local wall-clock time.
    pub now: NaiveDateTime,
}

/// Typed response metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseMetadata {
    /// Intent the response answers.
    pub intent: IntentKind,
    /// Confidence of that intent.
    pub confidence: f32,
    /// Template category used.
    pub category: ResponseCategory,
    /// Tone used.
    pub tone: Tone,
    /// Dominant emotion at generation time.
    pub emotion: Emotion,
    /// A fact was stored for this request.
    pub stored: bool,
    /// The response served the request.
    pub helpful: bool,
    /// The response reports a failure.
    pub error: bool,
    /// The text was cut to the length limit.
    pub truncated: bool,
    /// Topic of the fact the response is about, if any.
    pub fact_topic: Option<String>,
}

/// A finished response. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// Text for display or speech.
    pub text: String,
    /// Structured description of the text.
    pub metadata: ResponseMetadata,
}

/// A chosen category plus the placeholder values to render it with.
struct Plan {
    category: ResponseCategory,
    pool: &'static [&'static str],
    fields: Vec<(&'static str, String)>,
    stored: bool,
    fact_topic: Option<String>,
}

impl Plan {
    fn new(category: ResponseCategory, tone: Tone) -> Self {
        Self {
            category,
            pool: templates::pool(category, tone),
            fields: Vec::new(),
            stored: false,
            fact_topic: None,
        }
    }

    fn field(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((key, value.into()));
        self
    }
}

/// Stateful generator. One per session: the anti-repetition memory is what
/// keeps a conversation from sounding canned.
#[derive(Debug)]
pub struct ResponseGenerator {
    config: ResponseConfig,
    rng: StdRng,
    history: HashMap<ResponseCategory, VecDeque<&'static str>>,
    recent: VecDeque<String>,
}

impl ResponseGenerator {
    /// Create a generator seeded from the OS.
    #[must_use]
    pub fn new(config: ResponseConfig) -> Self {
        Self::from_rng(config, StdRng::from_entropy())
    }

    /// Create a generator with reproducible selection.
    #[must_use]
    pub fn with_seed(config: ResponseConfig, seed: u64) -> Self {
        Self::from_rng(config, StdRng::seed_from_u64(seed))
    }

    fn from_rng(config: ResponseConfig, rng: StdRng) -> Self {
        Self {
            recent: VecDeque::with_capacity(config.recent_window),
            config,
            rng,
            history: HashMap::new(),
        }
    }

    /// Settings in effect.
    #[must_use]
    pub fn config(&self) -> &ResponseConfig {
        &self.config
    }

    /// Recently emitted texts, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &str> {
        self.recent.iter().map(String::as_str)
    }

    /// Produce the response for one request.
    pub fn generate(&mut self, request: GenerationRequest<'_>) -> Response {
        let tone = Tone::from_intensity(request.emotion.intensity);
        let plan = Self::plan(&request, tone);
        let name = request
            .context
            .name
            .clone()
            .unwrap_or_else(|| self.default_name(tone).to_string());

        let (text, truncated) = self.realise(&plan, &name, request.now, request.emotion);
        tracing::debug!(
            intent = %request.intent.intent,
            category = ?plan.category,
            tone = ?tone,
            "Response generated"
        );

        Response {
            text,
            metadata: ResponseMetadata {
                intent: request.intent.intent,
                confidence: request.intent.confidence,
                category: plan.category,
                tone,
                emotion: request.emotion.current,
                stored: plan.stored,
                helpful: plan.category.is_helpful(),
                error: plan.category == ResponseCategory::Apology,
                truncated,
                fact_topic: plan.fact_topic,
            },
        }
    }

    /// The in-character failure response.
    pub fn apology(&mut self, intent: IntentKind, emotion: &EmotionalState) -> Response {
        let tone = Tone::from_intensity(emotion.intensity);
        let plan = Plan::new(ResponseCategory::Apology, tone);
        let name = self.default_name(tone).to_string();
        let now = chrono::Local::now().naive_local();
        let (text, truncated) = self.realise(&plan, &name, now, emotion);

        Response {
            text,
            metadata: ResponseMetadata {
                intent,
                confidence: 0.0,
                category: ResponseCategory::Apology,
                tone,
                emotion: emotion.current,
                stored: false,
                helpful: false,
                error: true,
                truncated,
                fact_topic: None,
            },
        }
    }

    fn default_name(&self, tone: Tone) -> &str {
        match tone {
            Tone::Casual => &self.config.casual_name,
            Tone::Formal | Tone::Enthusiastic => &self.config.formal_name,
        }
    }

    fn plan(request: &GenerationRequest<'_>, tone: Tone) -> Plan {
        use ResponseCategory as C;
        let intent = request.intent;

        match intent.intent {
            IntentKind::Greeting => Plan::new(C::Greeting, tone),
            IntentKind::Farewell => Plan::new(C::Farewell, tone),
            IntentKind::Thanks => Plan::new(C::Thanks, tone),
            IntentKind::Joke => Plan::new(C::Joke, tone),
            IntentKind::Help => Plan::new(C::Help, tone),
            IntentKind::Identity => Plan::new(C::Identity, tone),
            IntentKind::Time => {
                Plan::new(C::Time, tone).field("clock", request.now.format("%-I:%M %p").to_string())
            }
            IntentKind::Date => Plan::new(C::Date, tone)
                .field("date", request.now.format("%A, %B %-d, %Y").to_string()),
            IntentKind::MemoryStore => match &request.context.note {
                Some(note) => Self::plan_note(note, tone),
                None => Self::plan_store(intent, tone),
            },
            IntentKind::MemoryRecall => match &request.context.listing {
                Some(listing) => Self::plan_listing(listing, request.now, tone),
                None => Self::plan_recall(request, tone),
            },
            IntentKind::Reminder => match &request.context.reminder {
                Some(reminder) => {
                    let mut plan = Plan::new(C::ReminderSet, tone)
                        .field("task", reminder.text.clone())
                        .field("when", describe_due(local(reminder), request.now));
                    plan.stored = true;
                    plan.fact_topic = Some(reminder.topic.clone());
                    plan
                }
                None => Plan::new(C::ReminderUnclear, tone),
            },
            IntentKind::Question => Self::plan_question(request, tone),
            IntentKind::Calculate => Self::plan_calculation(intent, tone),
            IntentKind::Weather => match request.knowledge {
                Some(knowledge) => {
                    let location = intent
                        .entity(EntityKind::Location)
                        .map(|l| format!(" for {}", title_case(l)))
                        .unwrap_or_default();
                    Plan::new(C::Weather, tone)
                        .field("location", location)
                        .field("knowledge", format_knowledge(knowledge))
                }
                None => Plan::new(C::WeatherUnavailable, tone),
            },
            IntentKind::Correction => {
                match (request.context.correction_topic.as_deref(), intent.value()) {
                    (Some(topic), Some(value)) => {
                        let mut plan = Plan::new(C::Correction, tone)
                            .field("topic", topic)
                            .field("value", value);
                        plan.stored = true;
                        plan.fact_topic = Some(topic.to_string());
                        plan
                    }
                    _ => Plan::new(C::CorrectionUnclear, tone),
                }
            }
            IntentKind::Confirmation | IntentKind::Negation if request.context.turn_count <= 1 => {
                let mut plan = Plan::new(C::Filler, tone);
                plan.pool = templates::FILLER_FIRST_TURN;
                plan
            }
            IntentKind::Confirmation => Plan::new(C::Confirmation, tone),
            IntentKind::Negation => Plan::new(C::Negation, tone),
            IntentKind::Unknown => Plan::new(C::Clarify, tone),
        }
    }

    fn plan_recall(request: &GenerationRequest<'_>, tone: Tone) -> Plan {
        let Some(topic) = request.intent.topic() else {
            return Plan::new(ResponseCategory::Clarify, tone);
        };
        let hit = request
            .memories
            .iter()
            .find(|h| h.key == topic)
            .or_else(|| request.memories.iter().find(|h| h.key.contains(topic)));

        match hit {
            Some(hit) => {
                let mut plan = Plan::new(ResponseCategory::MemoryRecall, tone)
                    .field("topic", hit.key.clone())
                    .field("value", display_value(&hit.value))
                    .field("percent", percent(hit.confidence));
                plan.fact_topic = Some(hit.key.clone());
                plan
            }
            None => Plan::new(ResponseCategory::RecallMissing, tone).field("topic", topic),
        }
    }

    fn plan_store(intent: &IntentMatch, tone: Tone) -> Plan {
        match (intent.topic(), intent.value()) {
            (Some(topic), Some(value)) => {
                let mut plan = Plan::new(ResponseCategory::MemoryStore, tone)
                    .field("topic", topic)
                    .field("value", value);
                plan.stored = true;
                plan.fact_topic = Some(topic.to_string());
                plan
            }
            _ => Plan::new(ResponseCategory::Clarify, tone),
        }
    }

    fn plan_note(note: &Note, tone: Tone) -> Plan {
        let mut plan = Plan::new(ResponseCategory::NoteSaved, tone).field("note", note.text.clone());
        plan.stored = true;
        plan.fact_topic = Some(note.topic.clone());
        plan
    }

    fn plan_listing(listing: &Listing, now: NaiveDateTime, tone: Tone) -> Plan {
        let kind = match listing {
            Listing::Notes(_) => "notes",
            Listing::Reminders(_) => "reminders",
        };
        if listing.is_empty() {
            return Plan::new(ResponseCategory::ListingEmpty, tone).field("kind", kind);
        }
        let (category, count, items) = match listing {
            Listing::Notes(notes) => (
                ResponseCategory::NoteList,
                counted(notes.len(), "note"),
                notes.iter().map(|n| n.text.clone()).collect::<Vec<_>>(),
            ),
            Listing::Reminders(reminders) => (
                ResponseCategory::ReminderList,
                counted(reminders.len(), "reminder"),
                reminders
                    .iter()
                    .map(|r| format!("{} ({})", r.text, describe_due(local(r), now)))
                    .collect(),
            ),
        };
        Plan::new(category, tone)
            .field("count", count)
            .field("items", items.join("; "))
    }

    fn plan_question(request: &GenerationRequest<'_>, tone: Tone) -> Plan {
        if let Some(knowledge) = request.knowledge {
            return Plan::new(ResponseCategory::KnowledgeAnswer, tone)
                .field("knowledge", format_knowledge(knowledge));
        }
        match request.memories.first() {
            Some(hit) => {
                let mut plan = Plan::new(ResponseCategory::MemoryAnswer, tone)
                    .field("topic", hit.key.clone())
                    .field("value", display_value(&hit.value))
                    .field("percent", percent(hit.confidence));
                plan.fact_topic = Some(hit.key.clone());
                plan
            }
            None => Plan::new(ResponseCategory::Clarify, tone),
        }
    }

    fn plan_calculation(intent: &IntentMatch, tone: Tone) -> Plan {
        let Some(expr) = intent.entity(EntityKind::Expression) else {
            return Plan::new(ResponseCategory::CalculationFailed, tone);
        };
        match calc::evaluate(expr) {
            Ok(result) => Plan::new(ResponseCategory::Calculation, tone)
                .field("expr", expr)
                .field("result", calc::format_number(result)),
            Err(e) => {
                tracing::debug!(expr, error = %e, "Calculation failed");
                Plan::new(ResponseCategory::CalculationFailed, tone)
            }
        }
    }

    /// Select, render, decorate and bound the text for a plan.
    fn realise(
        &mut self,
        plan: &Plan,
        name: &str,
        now: NaiveDateTime,
        emotion: &EmotionalState,
    ) -> (String, bool) {
        let (greeting, period) = time_of_day(now);
        let mut fields: Vec<(&str, String)> = vec![
            ("name", name.to_string()),
            ("time", greeting.to_string()),
            ("period", period.to_string()),
        ];
        fields.extend(plan.fields.iter().map(|(k, v)| (*k, v.clone())));

        let history_len = self.config.template_history;
        let recent_history: Vec<&'static str> = self
            .history
            .get(&plan.category)
            .map(|h| h.iter().copied().collect())
            .unwrap_or_default();

        let mut tried: Vec<&'static str> = Vec::new();
        let mut chosen: Option<(&'static str, String, bool)> = None;

        while tried.len() < plan.pool.len() {
            let fresh: Vec<&'static str> = plan
                .pool
                .iter()
                .copied()
                .filter(|t| !tried.contains(t) && !recent_history.contains(t))
                .collect();
            let candidates = if fresh.is_empty() {
                plan.pool
                    .iter()
                    .copied()
                    .filter(|t| !tried.contains(t))
                    .collect()
            } else {
                fresh
            };
            let Some(&template) = candidates.choose(&mut self.rng) else {
                break;
            };

            let decorated = self.decorate(render(template, &fields), emotion);
            let (text, truncated) = truncate(&decorated, self.config.max_length);
            let collides = self.recent.contains(&text);
            chosen = Some((template, text, truncated));
            if !collides {
                break;
            }
            tried.push(template);
        }

        let (template, text, truncated) = chosen.unwrap_or_else(|| ("", "...".to_string(), false));

        if !template.is_empty() {
            let history = self.history.entry(plan.category).or_default();
            history.push_back(template);
            while history.len() > history_len {
                history.pop_front();
            }
        }

        self.recent.push_back(text.clone());
        while self.recent.len() > self.config.recent_window {
            self.recent.pop_front();
        }
        (text, truncated)
    }

    fn decorate(&mut self, text: String, emotion: &EmotionalState) -> String {
        let text = match personality::emoji_for(emotion) {
            Some(emoji) if self.config.use_emoji && emotion.intensity > 0.7 => {
                format!("{text} {emoji}")
            }
            _ => text,
        };
        personality::apply(
            self.config.personality,
            &text,
            &self.config.casual_name,
            &mut self.rng,
        )
    }
}

fn render(template: &str, fields: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (key, value) in fields {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    capitalize_first(&out)
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
}

fn time_of_day(now: NaiveDateTime) -> (&'static str, &'static str) {
    match now.hour() {
        0..=11 => ("Good morning", "morning"),
        12..=16 => ("Good afternoon", "afternoon"),
        _ => ("Good evening", "evening"),
    }
}

fn counted(n: usize, noun: &str) -> String {
    if n == 1 { format!("1 {noun}") } else { format!("{n} {noun}s") }
}

fn local(reminder: &Reminder) -> NaiveDateTime {
    reminder.due.with_timezone(&chrono::Local).naive_local()
}

/// Speak a due time relative to `now`: "at 5:00 PM", "tomorrow at 9:00 AM",
/// "on Friday at 8:00 PM", or a calendar date beyond a week.
#[must_use]
pub fn describe_due(due: NaiveDateTime, now: NaiveDateTime) -> String {
    let clock = due.format("%-I:%M %p");
    let days = due.date().signed_duration_since(now.date()).num_days();
    match days {
        0 => format!("at {clock}"),
        1 => format!("tomorrow at {clock}"),
        2..=6 => format!("on {} at {clock}", due.format("%A")),
        _ if due.year() == now.year() => format!("on {} at {clock}", due.format("%B %-d")),
        _ => format!("on {} at {clock}", due.format("%B %-d, %Y")),
    }
}

fn percent(confidence: f32) -> String {
    format!("{:.0}", (confidence.clamp(0.0, 1.0) * 100.0).round())
}

/// Arrays become bullet lines; strings pass through; anything else is JSON.
#[must_use]
pub fn format_knowledge(knowledge: &serde_json::Value) -> String {
    match knowledge {
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| format!("\n• {}", display_value(item)))
            .collect(),
        other => display_value(other),
    }
}

/// Cut `text` to at most `max` characters, ending in "..." when cut.
fn truncate(text: &str, max: usize) -> (String, bool) {
    if text.chars().count() <= max {
        return (text.to_string(), false);
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.truncate(out.trim_end().len());
    out.push_str("...");
    (out, true)
}
