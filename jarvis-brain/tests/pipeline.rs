//! End-to-end tests of the request pipeline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};

use jarvis_brain::{Brain, BrainEvent, RequestStatus};
use jarvis_core::config::{FactConfig, JarvisConfig};
use jarvis_core::response::ResponseCategory;
use jarvis_core::response::templates::CLARIFY;
use jarvis_core::{Emotion, FactStore, IntentKind, MemoryFacts};
use jarvis_knowledge::{
    KnowledgeError, KnowledgeQuery, KnowledgeSource, NoKnowledge, StaticKnowledge,
};

fn store_over(backend: Arc<MemoryFacts>) -> Arc<FactStore> {
    Arc::new(FactStore::open(backend, FactConfig::default()).expect("open store"))
}

fn brain_with(knowledge: Arc<dyn KnowledgeSource>, config: JarvisConfig) -> Brain {
    Brain::new(config, store_over(Arc::new(MemoryFacts::new())), knowledge)
}

fn brain() -> Brain {
    brain_with(Arc::new(NoKnowledge), JarvisConfig::default())
}

/// A source that never answers in time.
struct Stalled;

#[async_trait]
impl KnowledgeSource for Stalled {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn acquire(&self, _query: &KnowledgeQuery) -> Result<Value, KnowledgeError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(json!("too late"))
    }
}

// ---------------------------------------------------------------------------
// Conversation scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn remember_then_recall() {
    let brain = brain();
    let session = brain.new_session_with_seed(1);

    let stored = brain.process(&session, "Remember my favorite color is blue").await;
    assert_eq!(stored.metadata.intent, IntentKind::MemoryStore);
    assert!(stored.metadata.stored);
    assert!(stored.text.contains("blue"), "{}", stored.text);
    let fact = brain.facts().fact("favorite color").expect("stored");
    assert_eq!(fact.value, json!("blue"));

    let recalled = brain.process(&session, "What is my favorite color?").await;
    assert_eq!(recalled.metadata.intent, IntentKind::MemoryRecall);
    assert!(recalled.text.contains("blue"), "{}", recalled.text);
    assert!(recalled.text.contains("95%"), "{}", recalled.text);
    assert_eq!(brain.facts().fact("favorite color").expect("fact").access_count, 1);
}

#[tokio::test]
async fn hostility_shifts_emotion() {
    let brain = brain();
    let session = brain.new_session();
    brain.process(&session, "I hate you").await;

    let snapshot = session.snapshot().await;
    assert!(snapshot.emotion.dimensions.anger > 0.5);
    assert_eq!(snapshot.emotion.current, Emotion::Anger);
    assert!(brain.facts().fact("dislikes").is_none());
}

#[tokio::test]
async fn gibberish_is_clarified() {
    let brain = brain();
    let session = brain.new_session();
    let r = brain.process(&session, "asdkjqwe").await;
    assert_eq!(r.metadata.intent, IntentKind::Unknown);
    assert!(CLARIFY.contains(&r.text.as_str()), "{}", r.text);
    assert_eq!(brain.counters().snapshot().intents_unknown, 1);
}

#[tokio::test]
async fn corrections_rewrite_the_last_stored_fact() {
    let brain = brain();
    let session = brain.new_session();
    brain.process(&session, "remember my favorite color is blue").await;

    let r = brain.process(&session, "No, it's green").await;
    assert_eq!(r.metadata.category, ResponseCategory::Correction);
    assert!(r.text.contains("green"), "{}", r.text);

    let fact = brain.facts().fact("favorite color").expect("fact");
    assert_eq!(fact.value, json!("green"));
    assert!(fact.tags.contains("corrected"));
    // a correction right after a store is a follow-up, so it arrives at 1.0
    assert!((fact.confidence - 0.965).abs() < 1e-4, "{}", fact.confidence);
}

#[tokio::test]
async fn correction_without_history_asks_for_more() {
    let brain = brain();
    let session = brain.new_session();
    let r = brain.process(&session, "no, it's green").await;
    assert_eq!(r.metadata.category, ResponseCategory::CorrectionUnclear);
    assert!(brain.facts().is_empty());
}

#[tokio::test]
async fn learned_name_is_used_in_greetings() {
    let brain = brain();
    let session = brain.new_session();
    brain.process(&session, "my name is tony").await;
    assert_eq!(session.preferences().await.name.as_deref(), Some("Tony"));

    let r = brain.process(&session, "hello").await;
    assert!(r.text.contains("Tony"), "{}", r.text);
}

#[tokio::test]
async fn passing_remarks_are_learned() {
    let brain = brain();
    let session = brain.new_session();
    brain.process(&session, "I love jazz").await;
    brain.process(&session, "I really enjoy coffee").await;

    let likes = brain.facts().fact("likes").expect("learned");
    assert_eq!(likes.value, json!(["jazz", "coffee"]));
    assert!(likes.confidence < 1.0);
}

#[tokio::test]
async fn learned_likes_can_be_recalled() {
    let brain = brain();
    let session = brain.new_session();
    brain.process(&session, "I love jazz").await;

    let r = brain.process(&session, "what do i like?").await;
    assert_eq!(r.metadata.intent, IntentKind::MemoryRecall);
    assert_eq!(r.metadata.category, ResponseCategory::MemoryRecall);
    assert!(r.text.contains("jazz"), "{}", r.text);
    assert_eq!(brain.facts().fact("likes").expect("learned").access_count, 1);
}

#[tokio::test]
async fn auto_learning_can_be_disabled() {
    let mut config = JarvisConfig::default();
    config.session.auto_learn = false;
    let brain = brain_with(Arc::new(NoKnowledge), config);
    let session = brain.new_session();
    brain.process(&session, "I love jazz").await;
    assert!(brain.facts().is_empty());
}

#[tokio::test]
async fn deeply_nested_arithmetic_is_refused() {
    let brain = brain();
    let session = brain.new_session();
    let depth = 100_000;
    let input = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));

    let r = brain.process(&session, &input).await;
    assert!(!r.metadata.error);
    assert!(
        matches!(
            r.metadata.category,
            ResponseCategory::CalculationFailed | ResponseCategory::Clarify
        ),
        "{:?}",
        r.metadata.category
    );
}

// ---------------------------------------------------------------------------
// Notes and reminders
// ---------------------------------------------------------------------------

#[tokio::test]
async fn notes_do_not_overwrite_each_other() {
    let brain = brain();
    let session = brain.new_session();

    let first = brain.process(&session, "remember to buy milk").await;
    assert_eq!(first.metadata.category, ResponseCategory::NoteSaved);
    assert!(first.text.contains("buy milk"), "{}", first.text);
    brain.process(&session, "remember to call the bank").await;

    let notes: Vec<String> = brain.facts().notes().into_iter().map(|n| n.text).collect();
    assert_eq!(notes.len(), 2);
    assert!(notes.iter().any(|n| n.contains("buy milk")));
    assert!(notes.iter().any(|n| n.contains("call the bank")));

    let listed = brain.process(&session, "what are my notes?").await;
    assert_eq!(listed.metadata.category, ResponseCategory::NoteList);
    assert!(listed.text.contains("buy milk"), "{}", listed.text);
    assert!(listed.text.contains("call the bank"), "{}", listed.text);
}

#[tokio::test]
async fn reminders_are_scheduled_and_listed() {
    let brain = brain();
    let session = brain.new_session();
    let before = Utc::now();

    let r = brain.process(&session, "remind me to call mom in 20 minutes").await;
    assert_eq!(r.metadata.intent, IntentKind::Reminder);
    assert_eq!(r.metadata.category, ResponseCategory::ReminderSet);
    assert!(r.text.contains("call mom"), "{}", r.text);

    let pending = brain.facts().reminders();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].text, "call mom");
    assert!(pending[0].due >= before + chrono::Duration::minutes(19));
    assert!(pending[0].due <= Utc::now() + chrono::Duration::minutes(21));

    let listed = brain.process(&session, "what are my reminders").await;
    assert_eq!(listed.metadata.category, ResponseCategory::ReminderList);
    assert!(listed.text.contains("call mom"), "{}", listed.text);
    assert!(brain.facts().fact("likes").is_none());
}

#[tokio::test]
async fn reminder_without_a_time_asks_for_one() {
    let brain = brain();
    let session = brain.new_session();
    let r = brain.process(&session, "remind me to stretch").await;
    assert_eq!(r.metadata.category, ResponseCategory::ReminderUnclear);
    assert!(brain.facts().reminders().is_empty());
}

#[tokio::test]
async fn due_reminders_are_announced_once() {
    let brain = brain();
    let mut events = brain.subscribe();
    brain
        .facts()
        .add_reminder("stretch", Utc::now() - chrono::Duration::minutes(1))
        .expect("reminder");
    brain
        .facts()
        .add_reminder("call mom", Utc::now() + chrono::Duration::hours(1))
        .expect("reminder");
    let reminders = brain.spawn_reminders();

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("announced in time")
        .expect("event");
    match event {
        BrainEvent::ReminderDue { reminder } => {
            assert_eq!(reminder.text, "stretch");
            assert!(reminder.delivered);
        }
        other => panic!("expected ReminderDue, got {other:?}"),
    }
    let pending: Vec<String> = brain.facts().reminders().into_iter().map(|r| r.text).collect();
    assert_eq!(pending, ["call mom"]);
    assert!(events.try_recv().is_err());
    reminders.abort();
}

// ---------------------------------------------------------------------------
// Knowledge
// ---------------------------------------------------------------------------

#[tokio::test]
async fn questions_use_external_knowledge() {
    let knowledge = StaticKnowledge::new()
        .with_entry("capital of france", json!(["Paris", "Population 2.1 million"]));
    let brain = brain_with(Arc::new(knowledge), JarvisConfig::default());
    let session = brain.new_session();

    let r = brain.process(&session, "What is the capital of France?").await;
    assert_eq!(r.metadata.category, ResponseCategory::KnowledgeAnswer);
    assert!(r.text.contains("• Paris"), "{}", r.text);
    assert_eq!(brain.counters().snapshot().knowledge_requests, 1);
}

#[tokio::test]
async fn slow_knowledge_is_abandoned() {
    let mut config = JarvisConfig::default();
    config.knowledge.timeout_ms = 50;
    let brain = brain_with(Arc::new(Stalled), config);
    let session = brain.new_session();

    let r = brain.process(&session, "what is the capital of france").await;
    assert_eq!(r.metadata.category, ResponseCategory::Clarify);
    assert_eq!(brain.counters().snapshot().knowledge_failures, 1);
}

#[tokio::test]
async fn weather_without_a_source_says_so() {
    let brain = brain();
    let session = brain.new_session();
    let r = brain.process(&session, "what's the weather in paris").await;
    assert_eq!(r.metadata.category, ResponseCategory::WeatherUnavailable);
}

// ---------------------------------------------------------------------------
// Events and failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn events_follow_the_request_lifecycle() {
    let brain = brain();
    let mut events = brain.subscribe();
    let session = brain.new_session();
    let response = brain.process(&session, "hello").await;

    let first = events.recv().await.expect("status");
    let second = events.recv().await.expect("complete");
    let third = events.recv().await.expect("idle");

    assert!(matches!(first, BrainEvent::Status { status: RequestStatus::Processing, .. }));
    match second {
        BrainEvent::Complete { response: published, session: id, .. } => {
            assert_eq!(published, response);
            assert_eq!(id, session.id());
        }
        other => panic!("expected Complete, got {other:?}"),
    }
    assert!(matches!(third, BrainEvent::Status { status: RequestStatus::Idle, .. }));
    assert_eq!(first.request(), third.request());
}

#[tokio::test]
async fn storage_failure_yields_an_apology() {
    let backend = Arc::new(MemoryFacts::new());
    let brain = Brain::new(
        JarvisConfig::default(),
        store_over(backend.clone()),
        Arc::new(NoKnowledge),
    );
    let mut events = brain.subscribe();
    let session = brain.new_session();
    backend.set_unavailable(true);

    let r = brain.process(&session, "remember my favorite color is blue").await;
    assert!(r.metadata.error);
    assert!(!r.text.is_empty());
    assert!(brain.facts().is_empty());

    assert!(matches!(
        events.recv().await.expect("status"),
        BrainEvent::Status { status: RequestStatus::Processing, .. }
    ));
    assert!(matches!(events.recv().await.expect("error"), BrainEvent::Error { .. }));
    assert!(matches!(
        events.recv().await.expect("status"),
        BrainEvent::Status { status: RequestStatus::Error, .. }
    ));
    assert!(matches!(
        events.recv().await.expect("status"),
        BrainEvent::Status { status: RequestStatus::Idle, .. }
    ));
    assert!(events.try_recv().is_err());
    let counters = brain.counters().snapshot();
    assert_eq!(counters.pipeline_errors, 1);
    assert!(counters.persistence_errors >= 1);

    // the session keeps working once storage is back
    backend.set_unavailable(false);
    let r = brain.process(&session, "remember my favorite color is blue").await;
    assert!(r.metadata.stored);
}

// ---------------------------------------------------------------------------
// Concurrency and background work
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sessions_do_not_share_state() {
    let brain = Arc::new(brain());
    let alice = brain.new_session();
    let bob = brain.new_session();

    let a = {
        let (brain, session) = (brain.clone(), alice.clone());
        tokio::spawn(async move {
            for _ in 0..5 {
                brain.process(&session, "remember my favorite color is blue").await;
                brain.process(&session, "I hate you").await;
            }
        })
    };
    let b = {
        let (brain, session) = (brain.clone(), bob.clone());
        tokio::spawn(async move {
            for _ in 0..5 {
                brain.process(&session, "remember my favorite food is pizza").await;
                brain.process(&session, "thank you").await;
            }
        })
    };
    a.await.expect("alice");
    b.await.expect("bob");

    let alice = alice.snapshot().await;
    let bob = bob.snapshot().await;
    assert!(alice.context.utterances().all(|u| u.contains("color") || u.contains("hate")));
    assert!(bob.context.utterances().all(|u| u.contains("food") || u.contains("thank")));
    assert_eq!(alice.context.turn_count(), 10);
    assert_eq!(bob.context.turn_count(), 10);
    assert_eq!(alice.last_stored_topic.as_deref(), Some("favorite color"));
    assert_eq!(bob.last_stored_topic.as_deref(), Some("favorite food"));
    assert!(alice.emotion.dimensions.anger > bob.emotion.dimensions.anger);
    assert_eq!(brain.facts().len(), 2);
}

#[tokio::test]
async fn same_session_requests_are_serialised() {
    let brain = Arc::new(brain());
    let session = brain.new_session();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let (brain, session) = (brain.clone(), session.clone());
            tokio::spawn(async move {
                brain.process(&session, &format!("remember my number {i} is {i}")).await
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.expect("task").metadata.stored);
    }

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.context.turn_count(), 8);
    assert_eq!(brain.facts().len(), 8);
}

#[tokio::test]
async fn each_maintenance_tick_counts_once() {
    let mut config = JarvisConfig::default();
    config.session.maintenance_interval_secs = 1;
    let brain = brain_with(Arc::new(NoKnowledge), config);
    let maintenance = brain.spawn_maintenance();

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(brain.counters().snapshot().maintenance_passes, 1);
    maintenance.abort();
}

#[tokio::test(start_paused = true)]
async fn emotion_decays_in_the_background() {
    let brain = brain();
    let session = brain.new_session();
    let decay = session.spawn_decay(Duration::from_millis(100));

    brain.process(&session, "I hate you").await;
    let before = session.snapshot().await.emotion.dimensions.anger;

    tokio::time::sleep(Duration::from_secs(10)).await;
    let after = session.snapshot().await.emotion.dimensions.anger;

    assert!(after < before, "{after} !< {before}");
    assert!(after >= 0.5);
    assert!(brain.counters().snapshot().decay_passes > 0);
    decay.abort();
}

#[tokio::test(start_paused = true)]
async fn decay_stops_when_the_session_is_dropped() {
    let brain = brain();
    let session = brain.new_session();
    let decay = session.spawn_decay(Duration::from_millis(100));
    drop(session);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(decay.is_finished());
}
