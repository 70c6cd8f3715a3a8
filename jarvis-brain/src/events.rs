//! Typed request lifecycle events.
//!
//! For every request the bus carries `Status(Processing)`, then either
//! `Complete` and `Status(Idle)`, or `Error`, `Status(Error)` and
//! `Status(Idle)`. A request always ends with the session back at `Idle`.
//! Events for one session are published while its lock is held, so they
//! never interleave with another request on the same session.
//!
//! `ReminderDue` belongs to no request: it is published by the reminder
//! task when a scheduled reminder falls due.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use jarvis_core::{Reminder, Response, SessionId};

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// The session is ready for input.
    Idle,
    /// A request is in the pipeline.
    Processing,
    /// The request failed; `Idle` follows once the apology is out.
    Error,
}

/// An event published by the orchestrator.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BrainEvent {
    /// Lifecycle transition.
    Status {
        /// Session the request belongs to.
        session: SessionId,
        /// Request number, increasing across the brain.
        request: u64,
        /// New status.
        status: RequestStatus,
    },
    /// A request finished normally.
    Complete {
        /// Session the request belongs to.
        session: SessionId,
        /// Request number.
        request: u64,
        /// The response returned to the caller.
        response: Response,
    },
    /// A request failed and was answered with an apology.
    Error {
        /// Session the request belongs to.
        session: SessionId,
        /// Request number.
        request: u64,
        /// Human-readable failure.
        cause: String,
    },
    /// A reminder fell due.
    ReminderDue {
        /// The reminder, already marked delivered.
        reminder: Reminder,
    },
}

impl BrainEvent {
    /// Request number carried by the event, if it belongs to a request.
    #[must_use]
    pub fn request(&self) -> Option<u64> {
        match self {
            Self::Status { request, .. }
            | Self::Complete { request, .. }
            | Self::Error { request, .. } => Some(*request),
            Self::ReminderDue { .. } => None,
        }
    }

    /// Session carried by the event, if it belongs to a request.
    #[must_use]
    pub fn session(&self) -> Option<SessionId> {
        match self {
            Self::Status { session, .. }
            | Self::Complete { session, .. }
            | Self::Error { session, .. } => Some(*session),
            Self::ReminderDue { .. } => None,
        }
    }
}

/// Broadcast fan-out for [`BrainEvent`]s.
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<BrainEvent>,
}

impl EventBus {
    /// Create a bus buffering `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Returns the number of subscribers that received it.
    pub fn publish(&self, event: BrainEvent) -> usize {
        match self.sender.send(event) {
            Ok(count) => count,
            Err(_) => {
                trace!("Event dropped, no subscribers");
                0
            }
        }
    }

    /// Subscribe to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BrainEvent> {
        self.sender.subscribe()
    }
}
