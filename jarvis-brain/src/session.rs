//! Caller-owned conversation sessions.
//!
//! A [`Session`] is a cheap handle: clones share one state behind an async
//! mutex, which is what serialises requests on the same conversation.
//! Different sessions share nothing but the fact store.

use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use jarvis_core::config::JarvisConfig;
use jarvis_core::{
    ConversationContext, CoreCounters, EmotionModel, EmotionalState, ResponseGenerator, SessionId,
};

/// What the assistant has learned about how to address the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Preferences {
    /// Preferred form of address.
    pub name: Option<String>,
}

/// Mutable per-conversation state.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) context: ConversationContext,
    pub(crate) emotion: EmotionModel,
    pub(crate) responder: ResponseGenerator,
    pub(crate) preferences: Preferences,
    /// Topic of the most recent store, target of corrections.
    pub(crate) last_stored_topic: Option<String>,
}

/// Read-only copy of a session's state.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    /// Session identity.
    pub id: SessionId,
    /// Recent utterances and intents.
    pub context: ConversationContext,
    /// Current emotional state.
    pub emotion: EmotionalState,
    /// Learned preferences.
    pub preferences: Preferences,
    /// Topic a correction would rewrite.
    pub last_stored_topic: Option<String>,
}

#[derive(Debug)]
struct SessionInner {
    id: SessionId,
    state: Mutex<SessionState>,
    counters: Arc<CoreCounters>,
}

/// Handle to one conversation.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub(crate) fn new(
        config: &JarvisConfig,
        responder: ResponseGenerator,
        counters: Arc<CoreCounters>,
    ) -> Self {
        let state = SessionState {
            context: ConversationContext::new(config.session.context_window),
            emotion: EmotionModel::new(config.emotion.clone()),
            responder,
            preferences: Preferences::default(),
            last_stored_topic: None,
        };
        let id = SessionId::new();
        debug!(session = %id, "Session created");
        Self {
            inner: Arc::new(SessionInner {
                id,
                state: Mutex::new(state),
                counters,
            }),
        }
    }

    /// Session identity.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.state.lock().await
    }

    /// Copy out the current state. Waits for an in-flight request.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock().await;
        SessionSnapshot {
            id: self.inner.id,
            context: state.context.clone(),
            emotion: state.emotion.state(),
            preferences: state.preferences.clone(),
            last_stored_topic: state.last_stored_topic.clone(),
        }
    }

    /// Learned preferences.
    pub async fn preferences(&self) -> Preferences {
        self.lock().await.preferences.clone()
    }

    /// Decay the emotional state every `period` until every handle to this
    /// session is dropped.
    ///
    /// A tick that finds a request in flight is skipped rather than waiting.
    #[must_use = "dropping the handle detaches the task; keep it to abort decay early"]
    pub fn spawn_decay(&self, period: Duration) -> JoinHandle<()> {
        let weak: Weak<SessionInner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                match inner.state.try_lock() {
                    Ok(mut state) => {
                        state.emotion.decay();
                        CoreCounters::bump(&inner.counters.decay_passes);
                    }
                    Err(_) => trace!(session = %inner.id, "Decay tick skipped, request in flight"),
                }
            }
            debug!("Session dropped, decay stopped");
        })
    }
}
