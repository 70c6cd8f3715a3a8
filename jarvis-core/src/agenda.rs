//! Notes and reminders, kept in the fact store under reserved prefixes.
//!
//! Every note gets its own topic (`note:<id>`), so saving a second note
//! never blends into the first. Reminders live under `reminder:<id>` with a
//! JSON body of `{text, due, delivered}`; delivery flips `delivered` under
//! the topic's write lock, so a reminder fires at most once even with
//! several pollers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::store::{FactMetadata, FactStore};
use crate::types::{Fact, FactSource, display_value};

/// Topic prefix of saved notes.
pub const NOTE_PREFIX: &str = "note:";
/// Topic prefix of reminders.
pub const REMINDER_PREFIX: &str = "reminder:";

/// A free-form note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Fact topic the note is stored under.
    pub topic: String,
    /// The note itself.
    pub text: String,
    /// When it was saved.
    pub created_at: DateTime<Utc>,
}

/// Something to bring up again at a given time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    /// Fact topic the reminder is stored under.
    pub topic: String,
    /// What to remind about.
    pub text: String,
    /// When it falls due.
    pub due: DateTime<Utc>,
    /// Already announced.
    pub delivered: bool,
}

/// What the user asked to have listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// Saved notes, oldest first.
    Notes(Vec<Note>),
    /// Pending reminders, soonest first.
    Reminders(Vec<Reminder>),
}

impl Listing {
    /// The listing a recall topic asks for, if it names notes or reminders.
    #[must_use]
    pub fn kind_for(topic: &str) -> Option<ListingKind> {
        match topic.trim() {
            "note" | "notes" => Some(ListingKind::Notes),
            "reminder" | "reminders" => Some(ListingKind::Reminders),
            _ => None,
        }
    }

    /// Whether there is nothing to list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Notes(notes) => notes.is_empty(),
            Self::Reminders(reminders) => reminders.is_empty(),
        }
    }
}

/// Which collection a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    /// Notes.
    Notes,
    /// Reminders.
    Reminders,
}

#[derive(Serialize, Deserialize)]
struct ReminderBody {
    text: String,
    due: DateTime<Utc>,
    #[serde(default)]
    delivered: bool,
}

impl Note {
    fn from_fact(fact: &Fact) -> Option<Self> {
        fact.topic.starts_with(NOTE_PREFIX).then(|| Self {
            topic: fact.topic.clone(),
            text: display_value(&fact.value),
            created_at: fact.created_at,
        })
    }
}

impl Reminder {
    fn from_fact(fact: &Fact) -> Option<Self> {
        if !fact.topic.starts_with(REMINDER_PREFIX) {
            return None;
        }
        match serde_json::from_value::<ReminderBody>(fact.value.clone()) {
            Ok(body) => Some(Self {
                topic: fact.topic.clone(),
                text: body.text,
                due: body.due,
                delivered: body.delivered,
            }),
            Err(e) => {
                warn!(topic = %fact.topic, error = %e, "Unreadable reminder");
                None
            }
        }
    }

    fn body(&self) -> serde_json::Value {
        serde_json::json!({
            "text": self.text,
            "due": self.due,
            "delivered": self.delivered,
        })
    }
}

/// Strip the time phrase and its connectives from a reminder request,
/// leaving what to be reminded of.
///
/// `("call mom at 5 pm", Some("5 pm"))` gives `"call mom"`.
#[must_use]
pub fn reminder_subject(request: &str, when: Option<&str>) -> String {
    let mut text = request.to_string();
    if let Some(when) = when {
        text = text.replacen(when, " ", 1);
    }
    let mut words: Vec<&str> = text.split_whitespace().collect();
    while words
        .first()
        .is_some_and(|w| matches!(*w, "to" | "about" | "that" | "me" | "for"))
    {
        words.remove(0);
    }
    while words
        .last()
        .is_some_and(|w| matches!(*w, "at" | "on" | "in" | "by" | "for" | "to"))
    {
        words.pop();
    }
    words.join(" ")
}

impl FactStore {
    /// Save a note under a topic of its own.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidTopic` for a blank note and
    /// `CoreError::Persistence` if the backend rejected the write.
    pub fn add_note(&self, text: &str) -> Result<Note> {
        self.add_note_at(text, Utc::now())
    }

    /// [`FactStore::add_note`] with an explicit clock.
    ///
    /// # Errors
    /// See [`FactStore::add_note`].
    pub fn add_note_at(&self, text: &str, now: DateTime<Utc>) -> Result<Note> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::InvalidTopic(NOTE_PREFIX.to_string()));
        }
        let topic = format!("{NOTE_PREFIX}{}", Uuid::new_v4().simple());
        let meta = FactMetadata::default()
            .with_source(FactSource::User)
            .with_tag("note");
        let fact = self.set_fact_at(&topic, serde_json::Value::from(text), meta, now)?;
        debug!(topic = %fact.topic, "Note saved");
        Ok(Note {
            topic: fact.topic,
            text: text.to_string(),
            created_at: fact.created_at,
        })
    }

    /// All notes, oldest first.
    #[must_use]
    pub fn notes(&self) -> Vec<Note> {
        let mut notes: Vec<Note> = self
            .topics()
            .iter()
            .filter(|t| t.starts_with(NOTE_PREFIX))
            .filter_map(|t| self.fact(t))
            .filter_map(|f| Note::from_fact(&f))
            .collect();
        notes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.topic.cmp(&b.topic)));
        notes
    }

    /// Notes whose text mentions `query` (case-insensitive), oldest first.
    #[must_use]
    pub fn search_notes(&self, query: &str) -> Vec<Note> {
        let needle = query.trim().to_lowercase();
        self.notes()
            .into_iter()
            .filter(|n| n.text.to_lowercase().contains(&needle))
            .collect()
    }

    /// Schedule a reminder.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidTopic` for a blank reminder and
    /// `CoreError::Persistence` if the backend rejected the write.
    pub fn add_reminder(&self, text: &str, due: DateTime<Utc>) -> Result<Reminder> {
        self.add_reminder_at(text, due, Utc::now())
    }

    /// [`FactStore::add_reminder`] with an explicit clock.
    ///
    /// # Errors
    /// See [`FactStore::add_reminder`].
    pub fn add_reminder_at(
        &self,
        text: &str,
        due: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Reminder> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::InvalidTopic(REMINDER_PREFIX.to_string()));
        }
        let reminder = Reminder {
            topic: format!("{REMINDER_PREFIX}{}", Uuid::new_v4().simple()),
            text: text.to_string(),
            due,
            delivered: false,
        };
        let meta = FactMetadata::default()
            .with_source(FactSource::User)
            .with_tag("reminder");
        self.set_fact_at(&reminder.topic, reminder.body(), meta, now)?;
        debug!(topic = %reminder.topic, due = %due, "Reminder scheduled");
        Ok(reminder)
    }

    /// Reminders not yet delivered, soonest first.
    #[must_use]
    pub fn reminders(&self) -> Vec<Reminder> {
        let mut reminders: Vec<Reminder> = self
            .topics()
            .iter()
            .filter(|t| t.starts_with(REMINDER_PREFIX))
            .filter_map(|t| self.fact(t))
            .filter_map(|f| Reminder::from_fact(&f))
            .filter(|r| !r.delivered)
            .collect();
        reminders.sort_by(|a, b| a.due.cmp(&b.due).then_with(|| a.topic.cmp(&b.topic)));
        reminders
    }

    /// Mark every pending reminder due at or before `now` as delivered and
    /// return them, soonest first. A reminder is returned by exactly one call.
    ///
    /// # Errors
    /// Returns `CoreError::Persistence` if a delivery could not be recorded.
    /// Reminders already marked by this call are not returned again.
    pub fn take_due_reminders(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>> {
        let mut due = Vec::new();
        for pending in self.reminders().into_iter().filter(|r| r.due <= now) {
            let mut claimed = false;
            let meta = FactMetadata::default().with_source(FactSource::System);
            self.update_fact_at(
                &pending.topic,
                |current| {
                    let stored = current
                        .and_then(|v| serde_json::from_value::<ReminderBody>(v.clone()).ok());
                    match stored {
                        Some(body) if !body.delivered => {
                            claimed = true;
                            Reminder { delivered: true, ..pending.clone() }.body()
                        }
                        Some(_) => current.cloned().unwrap_or_default(),
                        None => Reminder { delivered: true, ..pending.clone() }.body(),
                    }
                },
                meta,
                now,
            )?;
            if claimed {
                due.push(Reminder { delivered: true, ..pending });
            }
        }
        Ok(due)
    }
}
