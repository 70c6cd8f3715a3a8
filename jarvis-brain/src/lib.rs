//! # jarvis-brain: the JARVIS Orchestrator
//!
//! Wires the core together into a per-request pipeline:
//!
//! 1. **Normalize** the utterance and push it onto the session context
//! 2. **Recognize** the intent (with the session's recent intents)
//! 3. **Gather**: fact search and knowledge acquisition run concurrently
//! 4. **Feel**: update the emotional state from the utterance
//! 5. **Act**: store or correct facts, save notes and schedule reminders
//!    when the intent is confident enough
//! 6. **Respond** through the session's generator
//! 7. **Learn** simple statements, then feed the outcome back into emotion
//!
//! Sessions are caller-owned handles; there is no global state. Lifecycle
//! events go out on a broadcast channel ([`Brain::subscribe`]), as do due
//! reminders once [`Brain::spawn_reminders`] is running.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod background;
pub mod brain;
pub mod error;
pub mod events;
pub mod learning;
pub mod session;
pub mod telemetry;

pub use brain::Brain;
pub use error::BrainError;
pub use events::{BrainEvent, RequestStatus};
pub use session::{Preferences, Session, SessionSnapshot};
