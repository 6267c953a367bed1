//! # Background runner handles and the two-phase stop supervisor.
//!
//! Every supervised entity (a subscription's worker, the watchdog's scan loop)
//! runs as one spawned task tracked by a [`Runner`]: the join handle plus the
//! cancellation token handed to whatever the task is blocked on.
//!
//! Stopping is two-phase. The cooperative phase cancels the token and lets the
//! task notice on its own (a subscription worker only checks between messages,
//! so an idle stream may never reach that check). The forced phase aborts the
//! task outright once the grace window expires:
//!
//! ```text
//! stop_listening() / unwatch()
//!        │  state := halting, token.cancel()
//!        ▼
//! spawn_stop_supervisor ──► poll runner liveness every poll_interval
//!        │                        │
//!        │        elapsed > forced_shutdown_delay? ──► runner.abort()
//!        ▼
//! runner finished ──► state := stopped, slot cleared, Stopped published
//! ```
//!
//! The supervisor is detached; the stop request itself never blocks its
//! caller. [`WaitForFinish`](crate::WaitForFinish) is the synchronization
//! point for callers that need to await the outcome.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};
use crate::state::{RunState, StateCell};

/// Handle to one live background task.
pub(crate) struct Runner {
    join: JoinHandle<()>,
    cancel: CancellationToken,
}

impl Runner {
    pub(crate) fn new(join: JoinHandle<()>, cancel: CancellationToken) -> Self {
        Self { join, cancel }
    }

    /// True while the task has not finished (normally or by abort).
    pub(crate) fn is_alive(&self) -> bool {
        !self.join.is_finished()
    }

    /// Signals the task's cancellation token (cooperative phase).
    pub(crate) fn request_stop(&self) {
        self.cancel.cancel();
    }

    /// Forcibly terminates the task at its next await point (forced phase).
    pub(crate) fn abort(&self) {
        self.join.abort();
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Shared slot holding an entity's current runner, if any.
///
/// This mutex doubles as the entity's per-instance lock: every lifecycle
/// method (`listen`, `stop_listening`, `restart`, `delete`, `watch`,
/// `unwatch`) runs its whole body under it, so concurrent calls serialize.
pub(crate) type RunnerSlot = Arc<Mutex<Option<Runner>>>;

pub(crate) fn new_runner_slot() -> RunnerSlot {
    Arc::new(Mutex::new(None))
}

pub(crate) fn lock_slot(slot: &RunnerSlot) -> MutexGuard<'_, Option<Runner>> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

/// Parameters of one detached stop supervisor.
pub(crate) struct StopSupervisor {
    pub state: StateCell,
    pub slot: RunnerSlot,
    pub forced_shutdown_delay: Duration,
    pub poll_interval: Duration,
    pub bus: Bus,
    /// Stream name attached to published events; `None` for the watchdog.
    pub stream: Option<Arc<str>>,
    pub stopped_kind: EventKind,
    pub forced_kind: EventKind,
}

/// Spawns the supervisor task confirming (or forcing) a runner's death.
///
/// Once the runner is confirmed finished the supervisor sets the state to
/// `stopped`, clears the slot, and publishes `stopped_kind`. If the runner is
/// still alive after `forced_shutdown_delay`, it is aborted (publishing
/// `forced_kind`) and the loop keeps polling until the abort lands.
pub(crate) fn spawn_stop_supervisor(params: StopSupervisor) {
    tokio::spawn(async move {
        let stopping_at = Instant::now();
        let mut forced = false;
        loop {
            let mut published: Option<Event> = None;
            {
                let mut slot = lock_slot(&params.slot);
                let alive = slot.as_ref().map(Runner::is_alive).unwrap_or(false);
                if !alive {
                    params.state.set(RunState::Stopped);
                    *slot = None;
                    published = Some(Event::now(params.stopped_kind));
                } else if !forced && stopping_at.elapsed() >= params.forced_shutdown_delay {
                    if let Some(runner) = slot.as_ref() {
                        runner.abort();
                    }
                    forced = true;
                    published = Some(Event::now(params.forced_kind));
                }
            }
            if let Some(mut event) = published.take() {
                if let Some(stream) = params.stream.as_ref() {
                    event = event.with_stream(Arc::clone(stream));
                }
                let done = event.kind == params.stopped_kind;
                params.bus.publish(event);
                if done {
                    break;
                }
            }
            time::sleep(params.poll_interval).await;
        }
    });
}
