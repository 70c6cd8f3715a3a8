//! JARVIS Benchmark Suite
//!
//! Latency targets for the synchronous core:
//!   intent_recognition_mixed ....... < 50μs per utterance
//!   fact_search_1000 ............... < 1ms
//!   response_generation_greeting ... < 20μs
//!   emotion_analysis_sentence ...... < 10μs

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;

use jarvis_core::config::{EmotionConfig, FactConfig, ResponseConfig};
use jarvis_core::normalize::normalize_input;
use jarvis_core::{
    EmotionModel, EmotionalState, FactMetadata, FactStore, GenerationRequest, IntentKind,
    IntentMatch, IntentRecognizer, MemoryFacts, ResponseContext, ResponseGenerator, SearchOptions,
};

const UTTERANCES: &[&str] = &[
    "Hello there Jarvis",
    "remember my favorite color is blue",
    "what is my favorite color?",
    "what is 12 times 7",
    "what's the weather in Paris tomorrow",
    "tell me a joke",
    "asdkjqwe",
    "is it going to be a long day?",
];

/// Benchmark: recognition across a mix of intents.
fn bench_intent_recognition(c: &mut Criterion) {
    let recognizer = IntentRecognizer::default();
    let inputs: Vec<String> = UTTERANCES.iter().map(|u| normalize_input(u)).collect();
    let recent = [IntentKind::Greeting, IntentKind::Question];

    c.bench_function("intent_recognition_mixed", |b| {
        b.iter(|| {
            for input in &inputs {
                black_box(recognizer.recognize(black_box(input), &recent));
            }
        });
    });
}

/// Benchmark: substring search over 1000 facts.
fn bench_fact_search(c: &mut Criterion) {
    let store = FactStore::open(Arc::new(MemoryFacts::new()), FactConfig::default())
        .expect("open store");
    for i in 0..1000 {
        let topic = if i % 10 == 0 { format!("favorite thing {i}") } else { format!("fact {i}") };
        store
            .set_fact(&topic, json!(i), FactMetadata::default().with_confidence(0.8))
            .expect("seed fact");
    }

    c.bench_function("fact_search_1000", |b| {
        b.iter(|| black_box(store.search(black_box("favorite"), SearchOptions::default())));
    });
}

/// Benchmark: greeting generation with anti-repetition bookkeeping.
fn bench_response_generation(c: &mut Criterion) {
    let mut responder = ResponseGenerator::with_seed(ResponseConfig::default(), 7);
    let emotion = EmotionalState::at_rest(&EmotionConfig::default());
    let intent = IntentMatch { intent: IntentKind::Greeting, ..IntentMatch::unknown(0.9) };
    let context = ResponseContext { name: Some("Tony".into()), turn_count: 3, ..ResponseContext::default() };
    let now = chrono_now();

    c.bench_function("response_generation_greeting", |b| {
        b.iter(|| {
            black_box(responder.generate(GenerationRequest {
                intent: &intent,
                context: &context,
                memories: &[],
                emotion: &emotion,
                knowledge: None,
                now,
            }))
        });
    });
}

/// Benchmark: keyword analysis of one sentence.
fn bench_emotion_analysis(c: &mut Criterion) {
    let mut model = EmotionModel::new(EmotionConfig::default());
    let text = normalize_input("I'm so happy today, this is absolutely wonderful news!");

    c.bench_function("emotion_analysis_sentence", |b| {
        b.iter(|| {
            let state = model.analyze(black_box(&text));
            model.decay();
            black_box(state)
        });
    });
}

fn chrono_now() -> chrono::NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(10, 30, 0))
        .expect("valid time")
}

criterion_group!(
    benches,
    bench_intent_recognition,
    bench_fact_search,
    bench_response_generation,
    bench_emotion_analysis,
);
criterion_main!(benches);
