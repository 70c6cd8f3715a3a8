//! Integration Tests: end-to-end flows through the assistant core.
//!
//! These drive the same sequence the orchestrator does (normalize, recognize,
//! store, search, generate) without a runtime, plus durable-store round
//! trips against a real SQLite file.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use serde_json::json;

use jarvis_core::config::{FactConfig, JarvisConfig, PersistenceConfig};
use jarvis_core::normalize::normalize_input;
use jarvis_core::response::templates::CLARIFY;
use jarvis_core::response::ResponseCategory;
use jarvis_core::{
    Emotion, EmotionModel, EntityKind, Fact, FactMetadata, FactPersistence, FactSource,
    FactStore, GenerationRequest, IntentKind, IntentRecognizer, MemoryFacts, Response,
    ResponseContext, ResponseGenerator, SearchOptions, SqliteFacts,
};

struct Core {
    facts: FactStore,
    recognizer: IntentRecognizer,
    emotion: EmotionModel,
    responder: ResponseGenerator,
    turns: u64,
}

impl Core {
    fn with_backend(backend: Arc<dyn FactPersistence>) -> Self {
        let config = JarvisConfig::default();
        Self {
            facts: FactStore::open(backend, config.facts.clone()).expect("open store"),
            recognizer: IntentRecognizer::new(config.intent.clone()),
            emotion: EmotionModel::new(config.emotion.clone()),
            responder: ResponseGenerator::with_seed(config.response, 11),
            turns: 0,
        }
    }

    fn new() -> Self {
        Self::with_backend(Arc::new(MemoryFacts::new()))
    }

    fn say(&mut self, raw: &str) -> Response {
        self.turns += 1;
        let input = normalize_input(raw);
        let intent = self.recognizer.recognize(&input, &[]);
        let emotion = self.emotion.analyze(&input);

        if intent.intent == IntentKind::MemoryStore && intent.is_committed(0.7) {
            if let (Some(topic), Some(value)) = (intent.topic(), intent.value()) {
                self.facts
                    .set_fact(
                        topic,
                        json!(value),
                        FactMetadata::default().with_confidence(intent.confidence),
                    )
                    .expect("store fact");
            }
        }

        let memories = intent
            .topic()
            .map(|t| self.facts.search(t, SearchOptions::default()))
            .unwrap_or_default();
        let context = ResponseContext {
            turn_count: self.turns,
            ..ResponseContext::default()
        };
        self.responder.generate(GenerationRequest {
            intent: &intent,
            context: &context,
            memories: &memories,
            emotion: &emotion,
            knowledge: None,
            now: noon(),
        })
    }
}

fn noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .expect("valid time")
}

// ---------------------------------------------------------------------------
// Conversation flows
// ---------------------------------------------------------------------------

#[test]
fn store_then_recall_favorite_color() {
    let mut core = Core::new();

    let stored = core.say("Remember my favorite color is blue");
    assert_eq!(stored.metadata.intent, IntentKind::MemoryStore);
    assert!(stored.metadata.stored);
    assert!(stored.text.contains("blue"));

    let fact = core.facts.fact("favorite color").expect("fact stored");
    assert_eq!(fact.value, json!("blue"));

    let recalled = core.say("What is my favorite color?");
    assert_eq!(recalled.metadata.intent, IntentKind::MemoryRecall);
    assert!(recalled.text.contains("blue"), "{}", recalled.text);
    assert!(recalled.text.contains("95%"), "{}", recalled.text);
}

#[test]
fn hostile_input_moves_emotion_toward_anger() {
    let mut core = Core::new();
    let before = core.emotion.state();
    core.say("I hate you");
    let after = core.emotion.state();

    assert!(after.dimensions.anger > before.dimensions.anger);
    assert_eq!(after.current, Emotion::Anger);
}

#[test]
fn gibberish_gets_a_clarifying_answer() {
    let mut core = Core::new();
    let r = core.say("asdkjqwe");
    assert_eq!(r.metadata.intent, IntentKind::Unknown);
    assert_eq!(r.metadata.category, ResponseCategory::Clarify);
    assert!(CLARIFY.contains(&r.text.as_str()));
}

#[test]
fn calculation_and_clock_answers() {
    let mut core = Core::new();
    let r = core.say("What is 12 times 7?");
    assert_eq!(r.metadata.intent, IntentKind::Calculate);
    assert!(r.text.contains("84"), "{}", r.text);

    let r = core.say("what time is it");
    assert!(r.text.contains("12:00 PM"), "{}", r.text);
}

#[test]
fn weather_entities_survive_normalization() {
    let recognizer = IntentRecognizer::default();
    let m = recognizer.recognize(&normalize_input("What's the weather in Paris tomorrow?"), &[]);
    assert_eq!(m.intent, IntentKind::Weather);
    assert_eq!(m.entity(EntityKind::Location), Some("paris"));
    assert_eq!(m.entity(EntityKind::Datetime), Some("tomorrow"));
}

// ---------------------------------------------------------------------------
// Fact store semantics
// ---------------------------------------------------------------------------

#[test]
fn repeated_writes_blend_toward_new_confidence() {
    let store = FactStore::open(Arc::new(MemoryFacts::new()), FactConfig::default())
        .expect("open");
    store
        .set_fact("city", json!("paris"), FactMetadata::default().with_confidence(1.0))
        .expect("first write");
    let blended = store
        .set_fact("City", json!("lyon"), FactMetadata::default().with_confidence(0.0))
        .expect("second write");

    assert!((blended.confidence - 0.7).abs() < 1e-6);
    assert_eq!(blended.value, json!("lyon"));
    assert_eq!(store.len(), 1);
}

#[test]
fn search_prefers_recent_facts_of_equal_confidence() {
    let store = FactStore::open(Arc::new(MemoryFacts::new()), FactConfig::default())
        .expect("open");
    let now = Utc::now();
    let meta = || FactMetadata::default().with_confidence(0.8);
    store
        .set_fact_at("favorite book", json!("dune"), meta(), now - Duration::days(400))
        .expect("old write");
    store
        .set_fact_at("favorite film", json!("alien"), meta(), now)
        .expect("new write");

    let hits = store.search_at("favorite", SearchOptions::default(), now);
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].key, "favorite film");
    assert!(hits[0].score > hits[1].score);
}

#[test]
fn maintenance_prunes_only_stale_weak_facts() {
    let store = FactStore::open(Arc::new(MemoryFacts::new()), FactConfig::default())
        .expect("open");
    let now = Utc::now();
    let old = now - Duration::days(45);

    store
        .import(Fact::new("forgotten", json!("x"), 0.2, FactSource::Inference, old))
        .expect("import weak");
    store
        .import(Fact::new("trusted", json!("y"), 0.9, FactSource::User, old))
        .expect("import strong");
    let mut popular = Fact::new("popular", json!("z"), 0.2, FactSource::Inference, old);
    popular.access_count = 9;
    store.import(popular).expect("import popular");

    let report = store.perform_maintenance_at(now);
    assert_eq!(report.scanned, 3);
    assert_eq!(report.pruned, 1);
    assert_eq!(store.topics(), vec!["popular".to_string(), "trusted".to_string()]);

    // a second pass finds nothing more to do
    assert_eq!(store.perform_maintenance_at(now).pruned, 0);
}

// ---------------------------------------------------------------------------
// Durable store round trips
// ---------------------------------------------------------------------------

#[test]
fn facts_survive_a_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("facts.db");

    {
        let backend = SqliteFacts::open(&path, &PersistenceConfig::default()).expect("open db");
        let mut core = Core::with_backend(Arc::new(backend));
        core.say("remember my favorite color is blue");
        core.facts
            .set_fact(
                "likes",
                json!(["jazz", "coffee"]),
                FactMetadata::default().with_source(FactSource::Inference).with_tag("learned"),
            )
            .expect("store likes");
    }

    let backend = SqliteFacts::open(&path, &PersistenceConfig::default()).expect("reopen db");
    assert_eq!(backend.count().expect("count"), 2);
    let store = FactStore::open(Arc::new(backend), FactConfig::default()).expect("load");

    let color = store.fact("favorite color").expect("color restored");
    assert_eq!(color.value, json!("blue"));
    assert!((color.confidence - 0.95).abs() < 1e-6);

    let likes = store.fact("likes").expect("likes restored");
    assert_eq!(likes.value, json!(["jazz", "coffee"]));
    assert_eq!(likes.source, FactSource::Inference);
    assert!(likes.tags.contains("learned"));
}

#[test]
fn reads_update_access_statistics_durably() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("facts.db");

    {
        let backend = SqliteFacts::open(&path, &PersistenceConfig::default()).expect("open db");
        let store = FactStore::open(Arc::new(backend), FactConfig::default()).expect("load");
        store
            .set_fact("name", json!("tony"), FactMetadata::default())
            .expect("write");
        for _ in 0..3 {
            assert_eq!(store.get_fact("name"), Some(json!("tony")));
        }
    }

    let backend = SqliteFacts::open(&path, &PersistenceConfig::default()).expect("reopen db");
    let store = FactStore::open(Arc::new(backend), FactConfig::default()).expect("load");
    assert_eq!(store.fact("name").expect("restored").access_count, 3);
}

#[test]
fn unavailable_backend_leaves_the_index_untouched() {
    let backend = Arc::new(MemoryFacts::new());
    let store = FactStore::open(backend.clone(), FactConfig::default()).expect("open");
    store
        .set_fact("name", json!("tony"), FactMetadata::default())
        .expect("write");

    backend.set_unavailable(true);
    let err = store
        .set_fact("name", json!("pepper"), FactMetadata::default())
        .expect_err("write must fail");
    assert!(err.is_persistence());
    assert_eq!(store.fact("name").expect("still there").value, json!("tony"));
    assert_eq!(store.counters().snapshot().persistence_errors, 1);

    // reads still work, the access bump just isn't persisted
    assert_eq!(store.get_fact("name"), Some(json!("tony")));
}
