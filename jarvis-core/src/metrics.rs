//! Runtime counters.
//!
//! Every subsystem also emits `tracing` events; these counters are the cheap
//! aggregate view, incremented on the hot path and read on export. They are
//! lock-free `AtomicU64`s shared through an `Arc` between the fact store and
//! the orchestrator.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for high-frequency events.
#[derive(Debug)]
pub struct CoreCounters {
    /// Facts created or overwritten.
    pub facts_written: AtomicU64,
    /// Writes that blended into an existing fact.
    pub facts_blended: AtomicU64,
    /// Facts removed by maintenance.
    pub facts_pruned: AtomicU64,
    /// Successful `get_fact` reads.
    pub fact_reads: AtomicU64,
    /// Searches served.
    pub searches: AtomicU64,
    /// Backend failures observed by the fact store.
    pub persistence_errors: AtomicU64,
    /// Utterances classified into a known intent.
    pub intents_recognized: AtomicU64,
    /// Utterances that fell back to `unknown`.
    pub intents_unknown: AtomicU64,
    /// Responses produced.
    pub responses_generated: AtomicU64,
    /// Knowledge acquisitions attempted.
    pub knowledge_requests: AtomicU64,
    /// Knowledge acquisitions that failed or timed out.
    pub knowledge_failures: AtomicU64,
    /// Requests that ended in the apology path.
    pub pipeline_errors: AtomicU64,
    /// Emotion decay ticks applied.
    pub decay_passes: AtomicU64,
    /// Fact maintenance passes completed.
    pub maintenance_passes: AtomicU64,
}

impl CoreCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            facts_written: AtomicU64::new(0),
            facts_blended: AtomicU64::new(0),
            facts_pruned: AtomicU64::new(0),
            fact_reads: AtomicU64::new(0),
            searches: AtomicU64::new(0),
            persistence_errors: AtomicU64::new(0),
            intents_recognized: AtomicU64::new(0),
            intents_unknown: AtomicU64::new(0),
            responses_generated: AtomicU64::new(0),
            knowledge_requests: AtomicU64::new(0),
            knowledge_failures: AtomicU64::new(0),
            pipeline_errors: AtomicU64::new(0),
            decay_passes: AtomicU64::new(0),
            maintenance_passes: AtomicU64::new(0),
        }
    }

    /// Increment a counter by one.
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CounterSnapshot {
            facts_written: load(&self.facts_written),
            facts_blended: load(&self.facts_blended),
            facts_pruned: load(&self.facts_pruned),
            fact_reads: load(&self.fact_reads),
            searches: load(&self.searches),
            persistence_errors: load(&self.persistence_errors),
            intents_recognized: load(&self.intents_recognized),
            intents_unknown: load(&self.intents_unknown),
            responses_generated: load(&self.responses_generated),
            knowledge_requests: load(&self.knowledge_requests),
            knowledge_failures: load(&self.knowledge_failures),
            pipeline_errors: load(&self.pipeline_errors),
            decay_passes: load(&self.decay_passes),
            maintenance_passes: load(&self.maintenance_passes),
        }
    }
}

impl Default for CoreCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Facts created or overwritten.
    pub facts_written: u64,
    /// Blended writes.
    pub facts_blended: u64,
    /// Facts pruned.
    pub facts_pruned: u64,
    /// Successful reads.
    pub fact_reads: u64,
    /// Searches served.
    pub searches: u64,
    /// Backend failures.
    pub persistence_errors: u64,
    /// Known intents.
    pub intents_recognized: u64,
    /// Unknown intents.
    pub intents_unknown: u64,
    /// Responses produced.
    pub responses_generated: u64,
    /// Knowledge acquisitions attempted.
    pub knowledge_requests: u64,
    /// Knowledge acquisitions failed.
    pub knowledge_failures: u64,
    /// Apology-path requests.
    pub pipeline_errors: u64,
    /// Decay ticks.
    pub decay_passes: u64,
    /// Maintenance passes.
    pub maintenance_passes: u64,
}

impl CounterSnapshot {
    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let rows: [(&str, &str, u64); 14] = [
            ("facts_written", "Facts created or overwritten", self.facts_written),
            ("facts_blended", "Writes blended into an existing fact", self.facts_blended),
            ("facts_pruned", "Facts removed by maintenance", self.facts_pruned),
            ("fact_reads", "Successful fact reads", self.fact_reads),
            ("searches", "Fact searches served", self.searches),
            ("persistence_errors", "Fact backend failures", self.persistence_errors),
            ("intents_recognized", "Utterances with a known intent", self.intents_recognized),
            ("intents_unknown", "Utterances resolved to unknown", self.intents_unknown),
            ("responses_generated", "Responses produced", self.responses_generated),
            ("knowledge_requests", "Knowledge acquisitions attempted", self.knowledge_requests),
            ("knowledge_failures", "Knowledge acquisitions failed", self.knowledge_failures),
            ("pipeline_errors", "Requests answered with an apology", self.pipeline_errors),
            ("decay_passes", "Emotion decay ticks", self.decay_passes),
            ("maintenance_passes", "Fact maintenance passes", self.maintenance_passes),
        ];

        let mut out = String::new();
        for (name, help, value) in rows {
            let _ = writeln!(out, "# HELP jarvis_{name}_total {help}");
            let _ = writeln!(out, "# TYPE jarvis_{name}_total counter");
            let _ = writeln!(out, "jarvis_{name}_total {value}");
        }
        out
    }
}
