//! The Fact Store: confidence-weighted, topic-keyed long-term memory.
//!
//! Facts live in a sharded in-memory index (`DashMap`) in front of a
//! [`FactPersistence`] backend. Every mutation is written to the backend
//! first and applied to the index only once that write succeeded, so a
//! failing disk never leaves the index ahead of (or behind) what is stored.
//!
//! Concurrency: every mutation of a topic (write, access bump, prune)
//! serialises on that topic's own write lock, and the backend call happens
//! under that lock only. The index shard is locked just long enough to clone
//! the current record and to swap in the new one, so disk latency on one
//! topic never stalls readers or writers of another. A concurrent reader sees
//! either the old record or the new one.
//!
//! # Confidence blending
//!
//! A repeated write keeps the existing identity and blends the trust score:
//!
//! ```text
//! blended = old * r + new * (1 - r)      r = blend_retention (0.7)
//! ```
//!
//! Writing the same confidence twice is a fixed point (1.0 stays 1.0).

mod maintenance;

pub use maintenance::MaintenanceReport;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::FactConfig;
use crate::error::{CoreError, PersistenceError, Result};
use crate::metrics::CoreCounters;
use crate::persistence::FactPersistence;
use crate::types::{Fact, FactSource, RankScore, normalize_topic};

/// Optional metadata accompanying a write.
#[derive(Debug, Clone, PartialEq)]
pub struct FactMetadata {
    /// Trust in the new observation; the configured default when `None`.
    pub confidence: Option<f32>,
    /// Origin of the write.
    pub source: FactSource,
    /// Labels merged into the fact's tag set.
    pub tags: BTreeSet<String>,
}

impl Default for FactMetadata {
    fn default() -> Self {
        Self {
            confidence: None,
            source: FactSource::User,
            tags: BTreeSet::new(),
        }
    }
}

impl FactMetadata {
    /// Metadata with the given confidence.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Metadata with the given source.
    #[must_use]
    pub fn with_source(mut self, source: FactSource) -> Self {
        self.source = source;
        self
    }

    /// Add a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }
}

/// Search parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Maximum number of hits.
    pub limit: usize,
    /// Hits below this confidence are dropped.
    pub min_confidence: f32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            min_confidence: 0.5,
        }
    }
}

impl SearchOptions {
    /// Defaults taken from the store configuration.
    #[must_use]
    pub fn from_config(config: &FactConfig) -> Self {
        Self {
            limit: config.search_limit,
            min_confidence: config.search_min_confidence,
        }
    }
}

/// One search result.
#[derive(Debug, Clone, PartialEq)]
pub struct FactHit {
    /// Normalized topic.
    pub key: String,
    /// Stored payload.
    pub value: serde_json::Value,
    /// Current confidence.
    pub confidence: f32,
    /// Recency timestamp used for ranking (last access).
    pub timestamp: DateTime<Utc>,
    /// Recency-weighted ranking score.
    pub score: RankScore,
}

impl FactHit {
    fn of(fact: &Fact, now: DateTime<Utc>) -> Self {
        Self {
            key: fact.topic.clone(),
            value: fact.value.clone(),
            confidence: fact.confidence,
            timestamp: fact.last_accessed,
            score: rank_score(fact.confidence, fact.last_accessed, now),
        }
    }
}

/// Blend an existing confidence with a new observation.
///
/// Written as `old + (new - old) * (1 - r)`, which equals
/// `old * r + new * (1 - r)` and is exact when `old == new`.
#[must_use]
pub fn blend_confidence(old: f32, new: f32, retention: f32) -> f32 {
    let retention = retention.clamp(0.0, 1.0);
    let new = new.clamp(0.0, 1.0);
    (old + (new - old) * (1.0 - retention)).clamp(0.0, 1.0)
}

/// Recency-weighted score: `confidence * (1 + timestamp / now)`.
#[must_use]
pub fn rank_score(confidence: f32, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> RankScore {
    let now_ms = now.timestamp_millis();
    #[allow(clippy::cast_precision_loss)]
    let recency = if now_ms > 0 {
        timestamp.timestamp_millis().max(0) as f64 / now_ms as f64
    } else {
        0.0
    };
    RankScore::new(f64::from(confidence) * (1.0 + recency))
}

/// Confidence-weighted fact store.
pub struct FactStore {
    index: DashMap<String, Fact>,
    /// Per-topic write locks. Entries are never removed, so two writers can
    /// never end up holding different locks for the same topic.
    writers: DashMap<String, Arc<Mutex<()>>>,
    backend: Arc<dyn FactPersistence>,
    config: FactConfig,
    counters: Arc<CoreCounters>,
}

impl std::fmt::Debug for FactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactStore")
            .field("facts", &self.index.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FactStore {
    /// Open a store over `backend`, loading every persisted fact into the index.
    ///
    /// # Errors
    /// Returns `CoreError::Persistence` if the backend cannot be read.
    pub fn open(backend: Arc<dyn FactPersistence>, config: FactConfig) -> Result<Self> {
        Self::open_with_counters(backend, config, Arc::new(CoreCounters::new()))
    }

    /// Like [`FactStore::open`], sharing an existing counter set.
    ///
    /// # Errors
    /// Returns `CoreError::Persistence` if the backend cannot be read.
    pub fn open_with_counters(
        backend: Arc<dyn FactPersistence>,
        config: FactConfig,
        counters: Arc<CoreCounters>,
    ) -> Result<Self> {
        let start = Instant::now();
        let index = DashMap::new();
        for mut fact in backend.load_all()? {
            fact.topic = normalize_topic(&fact.topic);
            index.insert(fact.topic.clone(), fact);
        }

        tracing::info!(
            facts = index.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Fact store opened"
        );

        Ok(Self {
            index,
            writers: DashMap::new(),
            backend,
            config,
            counters,
        })
    }

    /// Store policy in effect.
    #[must_use]
    pub fn config(&self) -> &FactConfig {
        &self.config
    }

    /// Shared runtime counters.
    #[must_use]
    pub fn counters(&self) -> &Arc<CoreCounters> {
        &self.counters
    }

    /// Number of live facts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the store holds no facts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All live topics, sorted.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.index.iter().map(|e| e.key().clone()).collect();
        topics.sort();
        topics
    }

    /// Write a fact, blending with any existing record for the same topic.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidTopic` for a blank topic and
    /// `CoreError::Persistence` if the backend rejected the write (the index
    /// is then unchanged).
    pub fn set_fact(
        &self,
        topic: &str,
        value: serde_json::Value,
        metadata: FactMetadata,
    ) -> Result<Fact> {
        self.set_fact_at(topic, value, metadata, Utc::now())
    }

    /// [`FactStore::set_fact`] with an explicit clock.
    ///
    /// # Errors
    /// See [`FactStore::set_fact`].
    pub fn set_fact_at(
        &self,
        topic: &str,
        value: serde_json::Value,
        metadata: FactMetadata,
        now: DateTime<Utc>,
    ) -> Result<Fact> {
        self.update_fact_at(topic, |_| value, metadata, now)
    }

    /// Write a value computed from the current one, atomically per topic.
    ///
    /// `update` receives the stored value (`None` for a new topic) while the
    /// topic's write lock is held, so concurrent read-modify-write cycles on
    /// the same topic never lose an update. Blending and metadata handling are
    /// the same as [`FactStore::set_fact`].
    ///
    /// # Errors
    /// See [`FactStore::set_fact`].
    pub fn update_fact<F>(&self, topic: &str, update: F, metadata: FactMetadata) -> Result<Fact>
    where
        F: FnOnce(Option<&serde_json::Value>) -> serde_json::Value,
    {
        self.update_fact_at(topic, update, metadata, Utc::now())
    }

    /// [`FactStore::update_fact`] with an explicit clock.
    ///
    /// # Errors
    /// See [`FactStore::set_fact`].
    pub fn update_fact_at<F>(
        &self,
        topic: &str,
        update: F,
        metadata: FactMetadata,
        now: DateTime<Utc>,
    ) -> Result<Fact>
    where
        F: FnOnce(Option<&serde_json::Value>) -> serde_json::Value,
    {
        let key = normalize_topic(topic);
        if key.is_empty() {
            return Err(CoreError::InvalidTopic(topic.to_string()));
        }
        let incoming = metadata
            .confidence
            .unwrap_or(self.config.default_confidence)
            .clamp(0.0, 1.0);

        let lock = self.writer(&key);
        let _guard = lock.lock();

        match self.fact(&key) {
            Some(current) => {
                let mut next = current.clone();
                next.confidence =
                    blend_confidence(current.confidence, incoming, self.config.blend_retention);
                next.value = update(Some(&current.value));
                next.source = metadata.source;
                next.tags.extend(metadata.tags);
                next.last_accessed = now;

                self.persist(&next)?;
                self.index.insert(key, next.clone());
                debug!(
                    topic = %next.topic,
                    previous = current.confidence,
                    confidence = next.confidence,
                    "Blended fact"
                );
                CoreCounters::bump(&self.counters.facts_blended);
                Ok(next)
            }
            None => {
                let fact = Fact::new(key.clone(), update(None), incoming, metadata.source, now)
                    .with_tags(metadata.tags);

                self.persist(&fact)?;
                self.index.insert(key, fact.clone());
                debug!(topic = %fact.topic, confidence = fact.confidence, "Stored new fact");
                CoreCounters::bump(&self.counters.facts_written);
                Ok(fact)
            }
        }
    }

    /// Read a fact's value, bumping its access count and recency.
    ///
    /// The bump is persisted best-effort: if the backend refuses it the value
    /// is still returned and the stored record is left as it was.
    #[must_use]
    pub fn get_fact(&self, topic: &str) -> Option<serde_json::Value> {
        self.get_fact_at(topic, Utc::now())
    }

    /// [`FactStore::get_fact`] with an explicit clock.
    #[must_use]
    pub fn get_fact_at(&self, topic: &str, now: DateTime<Utc>) -> Option<serde_json::Value> {
        let key = normalize_topic(topic);
        let lock = self.writer(&key);
        let _guard = lock.lock();

        let mut next = self.fact(&key)?;
        next.access_count = next.access_count.saturating_add(1);
        next.last_accessed = now;

        let value = next.value.clone();
        match self.persist(&next) {
            Ok(()) => {
                self.index.insert(key, next);
            }
            Err(e) => warn!(topic = %key, error = %e, "Access bump not persisted"),
        }
        CoreCounters::bump(&self.counters.fact_reads);
        Some(value)
    }

    /// Peek at a full record without touching its access statistics.
    #[must_use]
    pub fn fact(&self, topic: &str) -> Option<Fact> {
        self.index.get(&normalize_topic(topic)).map(|f| f.value().clone())
    }

    /// Substring search over topics, ranked by recency-weighted confidence.
    #[must_use]
    pub fn search(&self, query: &str, options: SearchOptions) -> Vec<FactHit> {
        self.search_at(query, options, Utc::now())
    }

    /// [`FactStore::search`] with an explicit clock.
    #[must_use]
    pub fn search_at(&self, query: &str, options: SearchOptions, now: DateTime<Utc>) -> Vec<FactHit> {
        let needle = normalize_topic(query);
        let mut hits: Vec<FactHit> = self
            .index
            .iter()
            .filter(|entry| {
                let fact = entry.value();
                fact.topic.contains(&needle) && fact.confidence >= options.min_confidence
            })
            .map(|entry| FactHit::of(entry.value(), now))
            .collect();

        hits.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.key.cmp(&b.key)));
        hits.truncate(options.limit);

        CoreCounters::bump(&self.counters.searches);
        debug!(query = %needle, hits = hits.len(), "Fact search");
        hits
    }

    /// Answer a recall of `topic`: read it exactly (bumping its access
    /// statistics), then search around it.
    ///
    /// The exact fact leads the result whenever it exists, even below
    /// `options.min_confidence`; related topics follow under the usual filter.
    #[must_use]
    pub fn recall(&self, topic: &str, options: SearchOptions) -> Vec<FactHit> {
        self.recall_at(topic, options, Utc::now())
    }

    /// [`FactStore::recall`] with an explicit clock.
    #[must_use]
    pub fn recall_at(&self, topic: &str, options: SearchOptions, now: DateTime<Utc>) -> Vec<FactHit> {
        let exact = self.get_fact_at(topic, now).and_then(|_| self.fact(topic));
        let mut hits = self.search_at(topic, options, now);

        if let Some(fact) = exact {
            hits.retain(|hit| hit.key != fact.topic);
            hits.insert(0, FactHit::of(&fact, now));
            hits.truncate(options.limit.max(1));
        }
        hits
    }

    /// Delete a fact. Returns whether it existed.
    ///
    /// # Errors
    /// Returns `CoreError::Persistence` if the backend refused the delete
    /// (the fact then stays in the index).
    pub fn remove(&self, topic: &str) -> Result<bool> {
        let key = normalize_topic(topic);
        let lock = self.writer(&key);
        let _guard = lock.lock();

        if !self.index.contains_key(&key) {
            return Ok(false);
        }
        self.delete_backend(&key)?;
        self.index.remove(&key);
        Ok(true)
    }

    /// Restore a record verbatim (identity, timestamps and counts included).
    ///
    /// # Errors
    /// Returns `CoreError::InvalidTopic` for a blank topic and
    /// `CoreError::Persistence` if the backend rejected the write.
    pub fn import(&self, mut fact: Fact) -> Result<()> {
        fact.topic = normalize_topic(&fact.topic);
        if fact.topic.is_empty() {
            return Err(CoreError::InvalidTopic(String::new()));
        }
        fact.confidence = fact.confidence.clamp(0.0, 1.0);

        let lock = self.writer(&fact.topic);
        let _guard = lock.lock();
        self.persist(&fact)?;
        self.index.insert(fact.topic.clone(), fact);
        CoreCounters::bump(&self.counters.facts_written);
        Ok(())
    }

    /// The write lock for a normalized topic.
    fn writer(&self, key: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.writers.get(key) {
            return lock.value().clone();
        }
        self.writers.entry(key.to_string()).or_default().value().clone()
    }

    fn persist(&self, fact: &Fact) -> std::result::Result<(), PersistenceError> {
        self.backend.upsert(fact).inspect_err(|e| {
            CoreCounters::bump(&self.counters.persistence_errors);
            warn!(topic = %fact.topic, error = %e, "Fact write failed");
        })
    }

    fn delete_backend(&self, topic: &str) -> std::result::Result<bool, PersistenceError> {
        self.backend.delete(topic).inspect_err(|e| {
            CoreCounters::bump(&self.counters.persistence_errors);
            warn!(topic = %topic, error = %e, "Fact delete failed");
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::persistence::{MemoryFacts, PersistResult};
    use chrono::{Duration, TimeZone};
    use parking_lot::Condvar;
    use serde_json::{Value, json};

    fn store() -> (FactStore, Arc<MemoryFacts>) {
        let backend = Arc::new(MemoryFacts::new());
        let store = FactStore::open(backend.clone(), FactConfig::default()).expect("open");
        (store, backend)
    }

    /// Backend that parks every write to one topic until released.
    struct GatedFacts {
        inner: MemoryFacts,
        gated: &'static str,
        parked: AtomicBool,
        open: Mutex<bool>,
        released: Condvar,
    }

    impl GatedFacts {
        fn new(gated: &'static str) -> Self {
            Self {
                inner: MemoryFacts::new(),
                gated,
                parked: AtomicBool::new(false),
                open: Mutex::new(false),
                released: Condvar::new(),
            }
        }

        fn release(&self) {
            *self.open.lock() = true;
            self.released.notify_all();
        }
    }

    impl FactPersistence for GatedFacts {
        fn load_all(&self) -> PersistResult<Vec<Fact>> {
            self.inner.load_all()
        }

        fn upsert(&self, fact: &Fact) -> PersistResult<()> {
            if fact.topic == self.gated {
                let mut open = self.open.lock();
                self.parked.store(true, Ordering::SeqCst);
                while !*open {
                    self.released.wait(&mut open);
                }
            }
            self.inner.upsert(fact)
        }

        fn delete(&self, topic: &str) -> PersistResult<bool> {
            self.inner.delete(topic)
        }
    }

    #[test]
    fn blend_is_exact_for_identical_values() {
        assert!((blend_confidence(1.0, 1.0, 0.7) - 1.0).abs() < f32::EPSILON);
        assert!((blend_confidence(0.4, 0.4, 0.7) - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn blend_weights_existing_value() {
        let blended = blend_confidence(1.0, 0.0, 0.7);
        assert!((blended - 0.7).abs() < 1e-6);
        let blended = blend_confidence(0.0, 1.0, 0.7);
        assert!((blended - 0.3).abs() < 1e-6);
    }

    #[test]
    fn set_fact_normalizes_and_defaults_confidence() {
        let (store, _) = store();
        let fact = store
            .set_fact("  Favorite COLOR", json!("blue"), FactMetadata::default())
            .expect("set");
        assert_eq!(fact.topic, "favorite color");
        assert!((fact.confidence - 1.0).abs() < f32::EPSILON);
        assert_eq!(store.get_fact("favorite color"), Some(json!("blue")));
    }

    #[test]
    fn repeated_write_blends_and_keeps_identity() {
        let (store, _) = store();
        let first = store
            .set_fact("pet", json!("cat"), FactMetadata::default().with_tag("animal"))
            .expect("first");
        let second = store
            .set_fact(
                "PET",
                json!("dog"),
                FactMetadata::default()
                    .with_confidence(0.0)
                    .with_source(FactSource::Inference)
                    .with_tag("home"),
            )
            .expect("second");

        assert_eq!(store.len(), 1);
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert!((second.confidence - 0.7).abs() < 1e-6);
        assert_eq!(second.value, json!("dog"));
        assert_eq!(second.source, FactSource::Inference);
        assert!(second.tags.contains("animal") && second.tags.contains("home"));
    }

    #[test]
    fn blank_topic_is_rejected() {
        let (store, _) = store();
        assert!(matches!(
            store.set_fact("   ", json!(1), FactMetadata::default()),
            Err(CoreError::InvalidTopic(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn failed_write_leaves_index_untouched() {
        let (store, backend) = store();
        store
            .set_fact("city", json!("Paris"), FactMetadata::default())
            .expect("set");

        backend.set_unavailable(true);
        let err = store
            .set_fact("city", json!("Rome"), FactMetadata::default().with_confidence(0.0))
            .expect_err("backend is down");
        assert!(err.is_persistence());
        let err = store
            .set_fact("country", json!("Italy"), FactMetadata::default())
            .expect_err("backend is down");
        assert!(err.is_persistence());

        let city = store.fact("city").expect("still there");
        assert_eq!(city.value, json!("Paris"));
        assert!((city.confidence - 1.0).abs() < f32::EPSILON);
        assert!(store.fact("country").is_none());
        assert_eq!(store.counters().snapshot().persistence_errors, 2);
    }

    #[test]
    fn get_fact_bumps_access() {
        let (store, _) = store();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid date");
        store
            .set_fact_at("pet", json!("cat"), FactMetadata::default(), t0)
            .expect("set");

        let later = t0 + Duration::hours(3);
        assert_eq!(store.get_fact_at("pet", later), Some(json!("cat")));
        assert_eq!(store.get_fact_at("pet", later), Some(json!("cat")));

        let fact = store.fact("pet").expect("exists");
        assert_eq!(fact.access_count, 2);
        assert_eq!(fact.last_accessed, later);
        assert_eq!(store.get_fact("nothing"), None);
    }

    #[test]
    fn get_fact_survives_backend_failure() {
        let (store, backend) = store();
        store.set_fact("pet", json!("cat"), FactMetadata::default()).expect("set");
        backend.set_unavailable(true);
        assert_eq!(store.get_fact("pet"), Some(json!("cat")));
        assert_eq!(store.fact("pet").expect("exists").access_count, 0);
    }

    #[test]
    fn search_filters_and_limits() {
        let (store, _) = store();
        let meta = |c: f32| FactMetadata::default().with_confidence(c);
        store.set_fact("favorite color", json!("blue"), meta(0.9)).expect("set");
        store.set_fact("favorite food", json!("pizza"), meta(0.8)).expect("set");
        store.set_fact("favorite song", json!("x"), meta(0.2)).expect("set");
        store.set_fact("home town", json!("Oslo"), meta(0.9)).expect("set");

        let hits = store.search("favorite", SearchOptions::default());
        let keys: Vec<_> = hits.iter().map(|h| h.key.as_str()).collect();
        assert_eq!(keys, vec!["favorite color", "favorite food"]);

        let hits = store.search("FAVORITE", SearchOptions { limit: 1, min_confidence: 0.0 });
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "favorite color");
    }

    #[test]
    fn search_ranks_by_recency_weighted_score() {
        let (store, _) = store();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().expect("valid date");
        let long_ago = Utc.with_ymd_and_hms(1971, 1, 1, 0, 0, 0).single().expect("valid date");

        store
            .set_fact_at("topic a", json!("a"), FactMetadata::default().with_confidence(0.9), long_ago)
            .expect("set a");
        store
            .set_fact_at("topic b", json!("b"), FactMetadata::default().with_confidence(0.5), now)
            .expect("set b");

        let hits = store.search_at("topic", SearchOptions::default(), now);
        assert_eq!(hits.len(), 2);
        // 0.5 * (1 + 1.0) beats 0.9 * (1 + ~0.02)
        assert_eq!(hits[0].key, "topic b");
        assert_eq!(hits[1].key, "topic a");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn remove_deletes_from_backend_and_index() {
        let (store, backend) = store();
        store.set_fact("x", json!(1), FactMetadata::default()).expect("set");
        assert!(store.remove("X").expect("remove"));
        assert!(!store.remove("x").expect("remove again"));
        assert_eq!(backend.count(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn open_loads_persisted_facts() {
        let backend = Arc::new(MemoryFacts::new());
        {
            let store = FactStore::open(backend.clone(), FactConfig::default()).expect("open");
            store.set_fact("name", json!("Tony"), FactMetadata::default()).expect("set");
        }
        let reopened = FactStore::open(backend, FactConfig::default()).expect("reopen");
        assert_eq!(reopened.get_fact("name"), Some(json!("Tony")));
    }

    #[test]
    fn import_restores_verbatim() {
        let (store, _) = store();
        let t = Utc.with_ymd_and_hms(2020, 5, 5, 5, 5, 5).single().expect("valid date");
        let mut fact = Fact::new("old thing", json!("dusty"), 0.2, FactSource::System, t);
        fact.access_count = 9;
        store.import(fact.clone()).expect("import");
        assert_eq!(store.fact("old thing"), Some(fact));
    }

    #[test]
    fn recall_leads_with_the_exact_fact_even_when_weak() {
        let (store, _) = store();
        let meta = |c: f32| FactMetadata::default().with_confidence(c);
        store.set_fact("likes", json!(["jazz"]), meta(0.375)).expect("set");
        store.set_fact("likes food", json!("pizza"), meta(0.9)).expect("set");
        store.set_fact("liked song", json!("x"), meta(0.2)).expect("set");

        let searched = store.search("likes", SearchOptions::default());
        assert!(searched.iter().all(|h| h.key != "likes"));

        let hits = store.recall("likes", SearchOptions::default());
        let keys: Vec<_> = hits.iter().map(|h| h.key.as_str()).collect();
        assert_eq!(keys, vec!["likes", "likes food"]);
        assert_eq!(hits[0].value, json!(["jazz"]));
        assert_eq!(store.fact("likes").expect("likes").access_count, 1);

        let hits = store.recall("likes", SearchOptions { limit: 1, min_confidence: 0.5 });
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "likes");
        assert!(store.recall("nothing", SearchOptions::default()).is_empty());
    }

    #[test]
    fn update_fact_sees_the_stored_value() {
        let (store, _) = store();
        let push = |item: &str| {
            let item = json!(item);
            move |old: Option<&Value>| {
                let mut items = old.and_then(Value::as_array).cloned().unwrap_or_default();
                items.push(item);
                Value::Array(items)
            }
        };
        let first = store.update_fact("tools", push("hammer"), FactMetadata::default()).expect("first");
        let second = store.update_fact("tools", push("saw"), FactMetadata::default()).expect("second");
        assert_eq!(first.value, json!(["hammer"]));
        assert_eq!(second.value, json!(["hammer", "saw"]));
        assert_eq!(second.id, first.id);
    }

    #[test]
    fn parallel_writers_on_different_topics() {
        let (store, backend) = store();
        std::thread::scope(|scope| {
            for t in 0..8 {
                let store = &store;
                scope.spawn(move || {
                    for i in 0..50 {
                        store
                            .set_fact(&format!("t{t} item {i}"), json!(i), FactMetadata::default())
                            .expect("write");
                    }
                });
            }
        });
        assert_eq!(store.len(), 400);
        assert_eq!(backend.count(), 400);
        assert_eq!(store.counters().snapshot().facts_written, 400);
    }

    #[test]
    fn concurrent_updates_to_one_topic_are_not_lost() {
        let (store, _) = store();
        std::thread::scope(|scope| {
            for t in 0..8 {
                let store = &store;
                scope.spawn(move || {
                    for i in 0..25 {
                        store
                            .update_fact(
                                "tally",
                                |old| {
                                    let mut items =
                                        old.and_then(Value::as_array).cloned().unwrap_or_default();
                                    items.push(json!(format!("{t}-{i}")));
                                    Value::Array(items)
                                },
                                FactMetadata::default(),
                            )
                            .expect("update");
                    }
                });
            }
        });
        let tally = store.fact("tally").expect("tally");
        assert_eq!(tally.value.as_array().map(Vec::len), Some(200));
        assert_eq!(store.counters().snapshot().facts_blended, 199);
    }

    #[test]
    fn readers_see_whole_records_during_writes() {
        let (store, _) = store();
        store.set_fact("gauge", json!(0), FactMetadata::default()).expect("seed");
        let done = AtomicBool::new(false);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for k in 1..=100 {
                    store
                        .set_fact("gauge", json!(k), FactMetadata::default().with_confidence(0.0))
                        .expect("write");
                }
                done.store(true, Ordering::SeqCst);
            });
            scope.spawn(|| {
                while !done.load(Ordering::SeqCst) {
                    let fact = store.fact("gauge").expect("never missing");
                    let k = fact.value.as_i64().expect("integer");
                    let expected = 0.7_f32.powi(i32::try_from(k).expect("small"));
                    assert!((fact.confidence - expected).abs() < 1e-4, "k={k} {}", fact.confidence);
                }
            });
        });
    }

    #[test]
    fn slow_write_does_not_block_other_topics() {
        let backend = Arc::new(GatedFacts::new("slow"));
        let store = FactStore::open(backend.clone(), FactConfig::default()).expect("open");

        std::thread::scope(|scope| {
            let slow = scope.spawn(|| store.set_fact("slow", json!(1), FactMetadata::default()));
            while !backend.parked.load(Ordering::SeqCst) {
                std::thread::yield_now();
            }

            // enough topics that some share the slow topic's index shard
            for i in 0..64 {
                let topic = format!("fast {i}");
                store.set_fact(&topic, json!(i), FactMetadata::default()).expect("fast write");
                assert_eq!(store.get_fact(&topic), Some(json!(i)));
            }
            assert!(store.fact("slow").is_none());

            backend.release();
            slow.join().expect("join").expect("slow write");
        });
        assert_eq!(store.len(), 65);
        assert_eq!(store.get_fact("slow"), Some(json!(1)));
    }
}
