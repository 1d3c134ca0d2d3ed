//! Gateway lifecycle state

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

/// Process lifecycle. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Serving requests normally.
    Running,
    /// Shutdown signalled; new work is refused while in-flight work finishes.
    Draining,
    /// Serving has ended.
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Running => write!(f, "running"),
            LifecycleState::Draining => write!(f, "draining"),
            LifecycleState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Shared handle on the lifecycle state.
///
/// Clones observe and mutate the same state. Readers either poll
/// [`state`](Self::state) or [`subscribe`](Self::subscribe) for changes.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    tx: Arc<watch::Sender<LifecycleState>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(LifecycleState::Running);
        Self { tx: Arc::new(tx) }
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        *self.tx.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// Moves `Running -> Draining`.
    ///
    /// Returns `true` only for the caller that performed the transition.
    pub fn begin_drain(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if *state == LifecycleState::Running {
                *state = LifecycleState::Draining;
                true
            } else {
                false
            }
        })
    }

    /// Moves to `Stopped` from any state.
    pub fn mark_stopped(&self) {
        self.tx.send_if_modified(|state| {
            let changed = *state != LifecycleState::Stopped;
            *state = LifecycleState::Stopped;
            changed
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.tx.subscribe()
    }

    /// Resolves once the state has left `Running`.
    pub async fn drained(&self) {
        until_not_running(self.subscribe()).await
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) async fn until_not_running(mut rx: watch::Receiver<LifecycleState>) {
    loop {
        let state = *rx.borrow_and_update();
        if state != LifecycleState::Running || rx.changed().await.is_err() {
            return;
        }
    }
}
