//! Time-based pruning of weak, unused facts.
//!
//! A fact is prunable when all three hold:
//! - it has not been accessed for longer than `retention_days`,
//! - its confidence is below `prune_confidence`,
//! - it was read fewer than `prune_access_count` times.
//!
//! Candidates are collected without holding any lock, then each is removed
//! under its topic's write lock after re-checking eligibility, so a read that
//! lands between the scan and the removal rescues the fact.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use super::FactStore;
use crate::config::FactConfig;
use crate::metrics::CoreCounters;
use crate::types::Fact;

/// Outcome of one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Facts examined.
    pub scanned: usize,
    /// Facts deleted.
    pub pruned: usize,
    /// Eligible facts the backend refused to delete (kept for the next pass).
    pub failed: usize,
}

/// Whether `fact` should be pruned at `now`.
#[must_use]
pub fn is_prunable(fact: &Fact, config: &FactConfig, now: DateTime<Utc>) -> bool {
    let retention = Duration::days(i64::from(config.retention_days));
    now - fact.last_accessed > retention
        && fact.confidence < config.prune_confidence
        && fact.access_count < config.prune_access_count
}

impl FactStore {
    /// Prune stale weak facts. Idempotent; safe alongside reads and writes.
    pub fn perform_maintenance(&self) -> MaintenanceReport {
        self.perform_maintenance_at(Utc::now())
    }

    /// [`FactStore::perform_maintenance`] with an explicit clock.
    pub fn perform_maintenance_at(&self, now: DateTime<Utc>) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        let candidates: Vec<String> = self
            .index
            .iter()
            .inspect(|_| report.scanned += 1)
            .filter(|entry| is_prunable(entry.value(), &self.config, now))
            .map(|entry| entry.key().clone())
            .collect();

        for key in candidates {
            let lock = self.writer(&key);
            let _guard = lock.lock();
            match self.fact(&key) {
                Some(fact) if is_prunable(&fact, &self.config, now) => {}
                _ => continue,
            }
            match self.delete_backend(&key) {
                Ok(_) => {
                    debug!(topic = %key, "Pruned fact");
                    self.index.remove(&key);
                    report.pruned += 1;
                    CoreCounters::bump(&self.counters.facts_pruned);
                }
                Err(_) => report.failed += 1,
            }
        }

        CoreCounters::bump(&self.counters.maintenance_passes);
        if report.pruned > 0 || report.failed > 0 {
            info!(
                scanned = report.scanned,
                pruned = report.pruned,
                failed = report.failed,
                "Fact maintenance pass"
            );
        }
        report
    }
}
