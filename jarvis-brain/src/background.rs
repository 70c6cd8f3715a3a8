//! Fixed-interval upkeep that runs beside request processing: fact
//! maintenance and reminder delivery.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use jarvis_core::FactStore;

use crate::events::{BrainEvent, EventBus};

/// Run fact maintenance every `period` until `alive` can no longer be
/// upgraded.
///
/// Each pass runs on the blocking pool; the store's per-topic locking keeps
/// it from holding up requests for more than one fact at a time. The store
/// counts and reports its own passes.
pub(crate) fn spawn_maintenance(
    facts: Arc<FactStore>,
    alive: Weak<()>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if alive.upgrade().is_none() {
                break;
            }

            let store = facts.clone();
            match tokio::task::spawn_blocking(move || store.perform_maintenance()).await {
                Ok(report) => debug!(scanned = report.scanned, "Maintenance tick done"),
                Err(e) => warn!(error = %e, "Fact maintenance task failed"),
            }
        }
        debug!("Brain dropped, maintenance stopped");
    })
}

/// Check for due reminders every `period` and publish one
/// [`BrainEvent::ReminderDue`] per reminder, until `alive` can no longer be
/// upgraded. The first check runs immediately, so reminders that fell due
/// while the assistant was down are announced on start.
pub(crate) fn spawn_reminders(
    facts: Arc<FactStore>,
    events: Arc<EventBus>,
    alive: Weak<()>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if alive.upgrade().is_none() {
                break;
            }

            let store = facts.clone();
            let now = chrono::Utc::now();
            match tokio::task::spawn_blocking(move || store.take_due_reminders(now)).await {
                Ok(Ok(due)) => {
                    for reminder in due {
                        debug!(topic = %reminder.topic, "Reminder due");
                        events.publish(BrainEvent::ReminderDue { reminder });
                    }
                }
                Ok(Err(e)) => warn!(error = %e, "Reminder delivery not recorded"),
                Err(e) => warn!(error = %e, "Reminder task failed"),
            }
        }
        debug!("Brain dropped, reminders stopped");
    })
}
