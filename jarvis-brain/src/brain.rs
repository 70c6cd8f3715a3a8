//! The orchestrator: one request pipeline shared by every session.
//!
//! ```text
//! normalize → context → recognize ─┬─ fact search (blocking pool) ─┬─ emotion
//!                                  └─ knowledge (bounded)         ─┘
//!     → store / note / remind / correct → generate → learn → feedback → Complete
//! ```
//!
//! Only [`Brain::process`] turns failures into user-facing text. Everything
//! it calls returns a `Result` or a safe default.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use chrono::{Local, Utc};

use jarvis_core::agenda::reminder_subject;
use jarvis_core::config::JarvisConfig;
use jarvis_core::intent::resolve_datetime;
use jarvis_core::normalize::normalize_input;
use jarvis_core::{
    CoreCounters, EntityKind, FactHit, FactMetadata, FactSource, FactStore, GenerationRequest,
    InteractionOutcome, IntentKind, IntentMatch, IntentRecognizer, Listing, ListingKind, Note,
    Reminder, Response, ResponseContext, ResponseGenerator, SearchOptions, SessionId,
};
use jarvis_knowledge::{KnowledgeQuery, KnowledgeSource};

use crate::background;
use crate::error::{BrainError, Result};
use crate::events::{BrainEvent, EventBus, RequestStatus};
use crate::learning;
use crate::session::{Session, SessionState};

/// The assistant's brain. Share it behind an `Arc`; all methods take `&self`.
pub struct Brain {
    config: JarvisConfig,
    facts: Arc<FactStore>,
    knowledge: Arc<dyn KnowledgeSource>,
    recognizer: IntentRecognizer,
    events: Arc<EventBus>,
    counters: Arc<CoreCounters>,
    next_request: AtomicU64,
    alive: Arc<()>,
}

impl std::fmt::Debug for Brain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Brain")
            .field("facts", &self.facts)
            .field("knowledge", &self.knowledge.name())
            .finish_non_exhaustive()
    }
}

impl Brain {
    /// Create a brain over a fact store and a knowledge source.
    #[must_use]
    pub fn new(
        config: JarvisConfig,
        facts: Arc<FactStore>,
        knowledge: Arc<dyn KnowledgeSource>,
    ) -> Self {
        Self {
            recognizer: IntentRecognizer::new(config.intent.clone()),
            events: Arc::new(EventBus::new(config.session.event_capacity)),
            counters: facts.counters().clone(),
            next_request: AtomicU64::new(0),
            alive: Arc::new(()),
            config,
            facts,
            knowledge,
        }
    }

    /// Configuration in effect.
    #[must_use]
    pub fn config(&self) -> &JarvisConfig {
        &self.config
    }

    /// The shared fact store.
    #[must_use]
    pub fn facts(&self) -> &Arc<FactStore> {
        &self.facts
    }

    /// Shared runtime counters.
    #[must_use]
    pub fn counters(&self) -> &Arc<CoreCounters> {
        &self.counters
    }

    /// Receive lifecycle events for every session from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BrainEvent> {
        self.events.subscribe()
    }

    /// Start a new conversation.
    #[must_use]
    pub fn new_session(&self) -> Session {
        let responder = ResponseGenerator::new(self.config.response.clone());
        Session::new(&self.config, responder, self.counters.clone())
    }

    /// Start a conversation whose template choices are reproducible.
    #[must_use]
    pub fn new_session_with_seed(&self, seed: u64) -> Session {
        let responder = ResponseGenerator::with_seed(self.config.response.clone(), seed);
        Session::new(&self.config, responder, self.counters.clone())
    }

    /// Run fact maintenance every `session.maintenance_interval_secs` until
    /// the brain is dropped.
    #[must_use = "dropping the handle detaches the task; keep it to abort maintenance early"]
    pub fn spawn_maintenance(&self) -> JoinHandle<()> {
        let period = Duration::from_secs(self.config.session.maintenance_interval_secs.max(1));
        background::spawn_maintenance(self.facts.clone(), Arc::downgrade(&self.alive), period)
    }

    /// Announce due reminders as [`BrainEvent::ReminderDue`], checking every
    /// `session.reminder_check_secs` until the brain is dropped.
    #[must_use = "dropping the handle detaches the task; keep it to abort reminder checks early"]
    pub fn spawn_reminders(&self) -> JoinHandle<()> {
        let period = Duration::from_secs(self.config.session.reminder_check_secs.max(1));
        background::spawn_reminders(
            self.facts.clone(),
            self.events.clone(),
            Arc::downgrade(&self.alive),
            period,
        )
    }

    /// Answer one utterance.
    ///
    /// Never fails: an internal error produces an in-character apology and
    /// an `Error` event. Requests on the same session run one at a time.
    pub async fn process(&self, session: &Session, input: &str) -> Response {
        let request = self.next_request.fetch_add(1, Ordering::Relaxed) + 1;
        let id = session.id();
        let start = Instant::now();

        let mut state = session.lock().await;
        self.publish_status(id, request, RequestStatus::Processing);

        match self.run(&mut state, id, request, input).await {
            Ok(response) => {
                CoreCounters::bump(&self.counters.responses_generated);
                debug!(
                    session = %id,
                    request,
                    intent = %response.metadata.intent,
                    confidence = response.metadata.confidence,
                    elapsed_us = start.elapsed().as_micros(),
                    "Request complete"
                );
                self.events.publish(BrainEvent::Complete {
                    session: id,
                    request,
                    response: response.clone(),
                });
                self.publish_status(id, request, RequestStatus::Idle);
                response
            }
            Err(e) => {
                CoreCounters::bump(&self.counters.pipeline_errors);
                warn!(session = %id, request, error = %e, "Request failed");

                let intent = state.context.last_intent().unwrap_or(IntentKind::Unknown);
                state
                    .emotion
                    .update_from_interaction(InteractionOutcome { helpful: false, error: true });
                let emotion = state.emotion.state();
                let response = state.responder.apology(intent, &emotion);

                self.events.publish(BrainEvent::Error {
                    session: id,
                    request,
                    cause: e.to_string(),
                });
                self.publish_status(id, request, RequestStatus::Error);
                self.publish_status(id, request, RequestStatus::Idle);
                response
            }
        }
    }

    fn publish_status(&self, session: SessionId, request: u64, status: RequestStatus) {
        self.events.publish(BrainEvent::Status { session, request, status });
    }

    async fn run(
        &self,
        state: &mut SessionState,
        session: SessionId,
        request: u64,
        input: &str,
    ) -> Result<Response> {
        let text = normalize_input(input);
        state.context.push_utterance(text.clone());

        let recent = state.context.recent_intents();
        let mut intent = self.recognizer.recognize(&text, &recent);
        state.context.push_intent(intent.intent);
        CoreCounters::bump(if intent.intent == IntentKind::Unknown {
            &self.counters.intents_unknown
        } else {
            &self.counters.intents_recognized
        });
        debug!(
            session = %session,
            request,
            intent = %intent.intent,
            confidence = intent.confidence,
            "Intent recognised"
        );

        let (memories, knowledge) =
            tokio::join!(self.recall(&intent), self.acquire_knowledge(&intent, &text));
        let memories = memories?;
        let listing = self.list(&intent).await?;
        let emotion = state.emotion.analyze(&text);

        let committed = intent.is_committed(self.config.intent.action_threshold);
        let mut correction_topic = None;
        let mut note = None;
        let mut reminder = None;
        match intent.intent {
            IntentKind::MemoryStore if committed => note = self.store(state, &intent).await?,
            IntentKind::MemoryStore => {
                debug!(confidence = intent.confidence, "Store below action threshold, not saved");
                intent.entities.clear();
            }
            IntentKind::Reminder if committed => reminder = self.remind(&intent).await?,
            IntentKind::Correction if committed => {
                correction_topic = self.correct(state, &intent).await?;
            }
            _ => {}
        }

        let context = ResponseContext {
            name: state.preferences.name.clone(),
            turn_count: state.context.turn_count(),
            correction_topic,
            note,
            reminder,
            listing,
        };
        let response = state.responder.generate(GenerationRequest {
            intent: &intent,
            context: &context,
            memories: &memories,
            emotion: &emotion,
            knowledge: knowledge.as_ref(),
            now: chrono::Local::now().naive_local(),
        });

        if self.config.session.auto_learn && learning::should_learn(intent.intent, &text) {
            self.learn(state, &text, &intent).await;
        }

        state.emotion.update_from_interaction(InteractionOutcome {
            helpful: response.metadata.helpful,
            error: false,
        });
        Ok(response)
    }

    /// Search the store for the intent's topic. A recall leads with the
    /// exact fact, whatever its confidence, and counts as a read of it.
    async fn recall(&self, intent: &IntentMatch) -> Result<Vec<FactHit>> {
        let Some(topic) = intent.topic().map(str::to_string) else {
            return Ok(Vec::new());
        };
        let facts = self.facts.clone();
        let is_recall = intent.intent == IntentKind::MemoryRecall;
        let options = SearchOptions::from_config(self.facts.config());

        let hits = tokio::task::spawn_blocking(move || {
            if is_recall {
                facts.recall(&topic, options)
            } else {
                facts.search(&topic, options)
            }
        })
        .await?;
        Ok(hits)
    }

    /// Notes or pending reminders, when a recall asks for them by name.
    async fn list(&self, intent: &IntentMatch) -> Result<Option<Listing>> {
        if intent.intent != IntentKind::MemoryRecall {
            return Ok(None);
        }
        let Some(kind) = intent.topic().and_then(Listing::kind_for) else {
            return Ok(None);
        };
        let facts = self.facts.clone();
        let listing = tokio::task::spawn_blocking(move || match kind {
            ListingKind::Notes => Listing::Notes(facts.notes()),
            ListingKind::Reminders => Listing::Reminders(facts.reminders()),
        })
        .await?;
        Ok(Some(listing))
    }

    /// Acquire external knowledge when the intent needs it. Failures are
    /// logged and become `None`.
    async fn acquire_knowledge(&self, intent: &IntentMatch, text: &str) -> Option<Value> {
        if !intent.requires_external_data {
            return None;
        }
        CoreCounters::bump(&self.counters.knowledge_requests);
        let query = KnowledgeQuery::from_match(intent, text);
        let limit = Duration::from_millis(self.config.knowledge.timeout_ms);

        match tokio::time::timeout(limit, self.knowledge.acquire(&query)).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                CoreCounters::bump(&self.counters.knowledge_failures);
                warn!(source = self.knowledge.name(), error = %e, "Knowledge unavailable");
                None
            }
            Err(_) => {
                CoreCounters::bump(&self.counters.knowledge_failures);
                warn!(
                    source = self.knowledge.name(),
                    timeout_ms = self.config.knowledge.timeout_ms,
                    "Knowledge timed out"
                );
                None
            }
        }
    }

    /// Save an explicit "remember" statement. Statements without a topic of
    /// their own ("remember to buy milk") become notes, returned so the
    /// reply can echo them.
    async fn store(&self, state: &mut SessionState, intent: &IntentMatch) -> Result<Option<Note>> {
        let (Some(topic), Some(value)) = (intent.topic(), intent.value()) else {
            return Ok(None);
        };
        if topic == "note" {
            let facts = self.facts.clone();
            let text = value.to_string();
            let note = tokio::task::spawn_blocking(move || facts.add_note(&text)).await??;
            state.last_stored_topic = Some(note.topic.clone());
            return Ok(Some(note));
        }
        let meta = FactMetadata::default()
            .with_confidence(intent.confidence)
            .with_source(FactSource::User);
        let fact = self.write(topic, json!(value), meta).await?;

        if fact.topic == "name" {
            state.preferences.name = Some(title_case(value));
        }
        state.last_stored_topic = Some(fact.topic);
        Ok(None)
    }

    /// Schedule a reminder. `None` when the request names no usable time or
    /// nothing to be reminded of.
    async fn remind(&self, intent: &IntentMatch) -> Result<Option<Reminder>> {
        let Some(request) = intent.value() else {
            return Ok(None);
        };
        let when = intent.entity(EntityKind::Datetime);
        let text = reminder_subject(request, when);
        let due = when
            .and_then(|phrase| resolve_datetime(phrase, Local::now().naive_local()))
            .and_then(|local| local.and_local_timezone(Local).earliest())
            .map(|due| due.with_timezone(&Utc));
        let Some(due) = due.filter(|_| !text.is_empty()) else {
            debug!(request, "Reminder without a time or a subject");
            return Ok(None);
        };

        let facts = self.facts.clone();
        let reminder =
            tokio::task::spawn_blocking(move || facts.add_reminder(&text, due)).await??;
        Ok(Some(reminder))
    }

    /// Rewrite the session's last stored fact. Returns the corrected topic,
    /// or `None` when there is nothing to correct.
    async fn correct(&self, state: &mut SessionState, intent: &IntentMatch) -> Result<Option<String>> {
        let (Some(topic), Some(value)) = (state.last_stored_topic.clone(), intent.value()) else {
            return Ok(None);
        };
        let meta = FactMetadata::default()
            .with_confidence(intent.confidence)
            .with_source(FactSource::User)
            .with_tag("corrected");
        let fact = self.write(&topic, json!(value), meta).await?;

        if fact.topic == "name" {
            state.preferences.name = Some(title_case(value));
        }
        Ok(Some(fact.topic))
    }

    /// Mine the utterance for statements. Persistence failures here are
    /// recovered: the request still succeeds.
    async fn learn(&self, state: &mut SessionState, text: &str, intent: &IntentMatch) {
        let statements = learning::extract(text);
        if statements.is_empty() {
            return;
        }
        if let Some(learning::Statement::Name(name)) = statements
            .iter()
            .find(|s| matches!(s, learning::Statement::Name(_)))
        {
            state.preferences.name = Some(title_case(name));
        }

        let confidence =
            learning::learned_confidence(intent.confidence, state.emotion.state().dimensions.trust);
        let facts = self.facts.clone();
        match tokio::task::spawn_blocking(move || learning::apply(&facts, &statements, confidence))
            .await
        {
            Ok(Ok(topics)) => debug!(?topics, confidence, "Auto-learned"),
            Ok(Err(e)) => warn!(error = %e, "Auto-learning not persisted"),
            Err(e) => warn!(error = %e, "Auto-learning task failed"),
        }
    }

    /// Write on the blocking pool. The write completes even if the caller
    /// stops waiting.
    async fn write(
        &self,
        topic: &str,
        value: Value,
        meta: FactMetadata,
    ) -> Result<jarvis_core::Fact> {
        let facts = self.facts.clone();
        let topic = topic.to_string();
        tokio::task::spawn_blocking(move || facts.set_fact(&topic, value, meta))
            .await?
            .map_err(BrainError::from)
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
