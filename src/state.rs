//! # Lifecycle state shared between an entity and its background runner.
//!
//! Every supervised entity ([`Subscription`](crate::Subscription),
//! [`WatchDog`](crate::WatchDog)) owns one [`StateCell`] that both the entity's
//! public methods and its spawned runner mutate. A state is always replaced
//! wholesale; readers never observe a half-written value.
//!
//! ## Conventional lifecycle
//! ```text
//! initial ──► running ──► halting ──► stopped
//!                │
//!                └──► dead ──► running   (restart)
//! ```
//!
//! No transition table is enforced — any state may be set from any other.
//! `stopped` and `dead` are terminal until a restart re-arms `running`.

use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time;

/// Lifecycle states of a supervised entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Constructed, never started.
    Initial,
    /// Runner active.
    Running,
    /// Stop requested; runner may still be winding down.
    Halting,
    /// Runner confirmed terminated after a cooperative stop.
    Stopped,
    /// Runner terminated due to an unrecovered failure.
    Dead,
}

impl fmt::Display for RunState {
    /// Prints the lowercase state name.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Initial => "initial",
            RunState::Running => "running",
            RunState::Halting => "halting",
            RunState::Stopped => "stopped",
            RunState::Dead => "dead",
        };
        f.write_str(name)
    }
}

/// Shared, mutex-guarded holder of a [`RunState`].
///
/// Cheap to clone; all clones observe the same state. The lock is held only
/// for the read or the write itself, never across an `.await`.
#[derive(Clone, Debug)]
pub struct StateCell {
    state: Arc<Mutex<RunState>>,
}

impl StateCell {
    /// Creates a cell in the [`RunState::Initial`] state.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RunState::Initial)),
        }
    }

    /// Returns true if the current state equals `state`.
    pub fn is(&self, state: RunState) -> bool {
        *self.lock() == state
    }

    /// Replaces the current state.
    pub fn set(&self, state: RunState) {
        *self.lock() = state;
    }

    /// Returns the current state.
    pub fn get(&self) -> RunState {
        *self.lock()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RunState> {
        // A poisoned lock can only mean a panic inside this module's two
        // single-assignment critical sections; the value is still consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StateCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.get().fmt(f)
    }
}

/// Blocking wait until an entity's runner reaches a terminal state.
///
/// `stop_listening`/`unwatch` are async-returning by design; this is the sole
/// synchronization primitive for callers that need to await the shutdown:
///
/// ```rust,ignore
/// watch_dog.unwatch()?;
/// watch_dog.wait_for_finish().await;
/// ```
#[async_trait]
pub trait WaitForFinish {
    /// The state cell governing the entity's runner.
    fn state_cell(&self) -> &StateCell;

    /// Liveness poll cadence.
    fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(100)
    }

    /// Polls until the state switches to `stopped` or `dead`.
    async fn wait_for_finish(&self) {
        loop {
            if matches!(self.state_cell().get(), RunState::Stopped | RunState::Dead) {
                break;
            }
            time::sleep(self.poll_interval()).await;
        }
    }
}
