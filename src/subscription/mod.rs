//! # Subscription: one supervised listener on one stream.
//!
//! A [`Subscription`] owns a background worker (the blocking read loop), the
//! checkpoint tracking its progress, its statistic, and a five-state
//! lifecycle:
//!
//! ```text
//! initial ──listen()──► running ──stop_listening()──► halting ──► stopped
//!                          │                                         ▲
//!                          │ worker failure                          │
//!                          ▼                              (stop supervisor)
//!                        dead ──restart()──► running
//! ```
//!
//! ## Rules
//! - `listen` is idempotent while a worker handle is **present** (not merely
//!   alive), so a call arriving during `halting` cannot spawn a duplicate.
//! - `stop_listening` and `restart` are no-ops unless the worker is alive /
//!   not alive respectively; both return immediately.
//! - Every lifecycle method runs its whole body under the instance's own
//!   lock, so concurrent `listen`/`stop_listening`/`restart`/`delete` calls
//!   serialize.
//! - A worker failure is fatal to that worker only: the subscription turns
//!   `dead` and stays registered; recovery is `restart`'s (or the
//!   watchdog's) job.
//! - `delete` refuses while the worker is alive and permanently disposes the
//!   instance otherwise; any later call fails with
//!   [`SubscriptionError::Disposed`].
//!
//! ## Example
//! ```rust,ignore
//! let sub = registry.create("orders", SubscribeOptions::default(), handler)?;
//! sub.listen()?;
//! // ... later
//! sub.stop_listening()?;
//! sub.wait_for_finish().await;
//! ```

mod setup;
mod statistic;
mod worker;

pub use setup::{EventHandler, SubscriptionSetup};
pub use statistic::SubscriptionStatistic;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::checkpoint::Checkpoint;
use crate::client::EventStreamClient;
use crate::config::Config;
use crate::error::SubscriptionError;
use crate::events::{Bus, Event, EventKind};
use crate::runner::{self, lock_slot, new_runner_slot, Runner, RunnerSlot, StopSupervisor};
use crate::state::{RunState, StateCell, WaitForFinish};

/// One logical, possibly-restarted listener on one stream.
///
/// Cheap to clone; all clones are the same subscription (identity is the
/// shared inner allocation, which is also what registry membership and the
/// watchdog's restart-in-place preserve).
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<Inner>,
}

struct Inner {
    client: Arc<dyn EventStreamClient>,
    setup: SubscriptionSetup,
    checkpoint: Checkpoint,
    statistic: Arc<SubscriptionStatistic>,
    state: StateCell,
    runner: RunnerSlot,
    disposed: AtomicBool,
    cfg: Config,
    bus: Bus,
}

impl Subscription {
    /// Creates a subscription in the `initial` state; nothing is spawned
    /// until [`listen`](Self::listen).
    pub fn new(
        client: Arc<dyn EventStreamClient>,
        checkpoint: Checkpoint,
        setup: SubscriptionSetup,
        bus: Bus,
        cfg: Config,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                setup,
                checkpoint,
                statistic: Arc::new(SubscriptionStatistic::new()),
                state: StateCell::new(),
                runner: new_runner_slot(),
                disposed: AtomicBool::new(false),
                cfg,
                bus,
            }),
        }
    }

    /// Starts listening: sets the state to `running` and spawns the worker.
    ///
    /// No-op while a worker handle is assigned, alive or not — a `dead`
    /// subscription is revived via [`restart`](Self::restart), not `listen`.
    pub fn listen(&self) -> Result<&Self, SubscriptionError> {
        self.ensure_usable()?;
        let mut slot = lock_slot(&self.inner.runner);
        if slot.is_some() {
            return Ok(self);
        }
        self.start_locked(&mut slot);
        Ok(self)
    }

    /// Requests a stop: sets the state to `halting`, signals the worker, and
    /// spawns a detached supervisor that confirms (or forces) its death.
    ///
    /// Returns immediately; no-op if no worker is alive. Await
    /// [`wait_for_finish`](WaitForFinish::wait_for_finish) for the outcome.
    pub fn stop_listening(&self) -> Result<&Self, SubscriptionError> {
        self.ensure_usable()?;
        {
            let slot = lock_slot(&self.inner.runner);
            let Some(current) = slot.as_ref().filter(|runner| runner.is_alive()) else {
                return Ok(self);
            };
            self.inner.state.set(RunState::Halting);
            current.request_stop();
        }
        self.publish(Event::now(EventKind::Halting));
        runner::spawn_stop_supervisor(StopSupervisor {
            state: self.inner.state.clone(),
            slot: Arc::clone(&self.inner.runner),
            forced_shutdown_delay: self.inner.cfg.forced_shutdown_delay,
            poll_interval: self.inner.cfg.halt_poll_interval,
            bus: self.inner.bus.clone(),
            stream: Some(Arc::from(self.inner.setup.stream.as_str())),
            stopped_kind: EventKind::Stopped,
            forced_kind: EventKind::ForcedShutdown,
        });
        Ok(self)
    }

    /// Restarts a not-running subscription in place: clears the worker
    /// handle, stamps `last_restart_at`, and re-runs the listen sequence.
    ///
    /// Resume, not recreate — the checkpoint and statistic are reused, so the
    /// new worker picks up where the dead one left off. No-op while the
    /// worker is alive.
    pub fn restart(&self) -> Result<&Self, SubscriptionError> {
        self.ensure_usable()?;
        let mut slot = lock_slot(&self.inner.runner);
        if slot.as_ref().map(Runner::is_alive).unwrap_or(false) {
            return Ok(self);
        }
        *slot = None;
        self.inner.statistic.mark_restarted();
        self.publish(Event::now(EventKind::Restarted));
        self.start_locked(&mut slot);
        Ok(self)
    }

    /// Disposes the subscription. Fails with
    /// [`SubscriptionError::WorkerAlive`] (and mutates nothing) while the
    /// worker is alive; stop it first. Afterwards every lifecycle method
    /// fails with [`SubscriptionError::Disposed`].
    pub fn delete(&self) -> Result<(), SubscriptionError> {
        self.ensure_usable()?;
        let mut slot = lock_slot(&self.inner.runner);
        if slot.as_ref().map(Runner::is_alive).unwrap_or(false) {
            return Err(SubscriptionError::WorkerAlive);
        }
        *slot = None;
        self.inner.disposed.store(true, Ordering::SeqCst);
        self.publish(Event::now(EventKind::Deleted));
        Ok(())
    }

    /// True while a worker task is running.
    pub fn is_worker_alive(&self) -> bool {
        lock_slot(&self.inner.runner)
            .as_ref()
            .map(Runner::is_alive)
            .unwrap_or(false)
    }

    /// True if a worker handle is assigned (the `listen` idempotency guard).
    pub fn has_worker_handle(&self) -> bool {
        lock_slot(&self.inner.runner).is_some()
    }

    /// True once [`delete`](Self::delete) succeeded.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// The subscription's progress marker. Register update hooks here to
    /// persist progress; the runtime itself persists nothing.
    pub fn checkpoint(&self) -> &Checkpoint {
        &self.inner.checkpoint
    }

    /// The counters surviving this subscription's restarts.
    pub fn statistic(&self) -> Arc<SubscriptionStatistic> {
        Arc::clone(&self.inner.statistic)
    }

    /// The parameters the subscription was created with.
    pub fn setup(&self) -> &SubscriptionSetup {
        &self.inner.setup
    }

    /// The lifecycle state cell.
    pub fn state(&self) -> &StateCell {
        &self.inner.state
    }

    /// The external stream client this subscription reads through.
    pub fn client(&self) -> &Arc<dyn EventStreamClient> {
        &self.inner.client
    }

    /// True if `other` is the same subscription (shared identity, not
    /// structural equality).
    pub fn same_subscription(&self, other: &Subscription) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn bus(&self) -> &Bus {
        &self.inner.bus
    }

    /// Shared tail of `listen` and `restart`; `slot` is the held instance
    /// lock.
    fn start_locked(&self, slot: &mut Option<Runner>) {
        self.inner.state.set(RunState::Running);
        self.publish(Event::now(EventKind::Listening));
        *slot = Some(worker::spawn_worker(self));
    }

    fn ensure_usable(&self) -> Result<(), SubscriptionError> {
        if self.is_disposed() {
            return Err(SubscriptionError::Disposed);
        }
        Ok(())
    }

    fn publish(&self, event: Event) {
        self.inner
            .bus
            .publish(event.with_stream(self.inner.setup.stream.as_str()));
    }
}

impl PartialEq for Subscription {
    /// Identity comparison: two handles are equal iff they are the same
    /// subscription.
    fn eq(&self, other: &Self) -> bool {
        self.same_subscription(other)
    }
}

impl Eq for Subscription {}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("stream", &self.inner.setup.stream)
            .field("state", &self.inner.state.get())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[async_trait]
impl WaitForFinish for Subscription {
    fn state_cell(&self) -> &StateCell {
        &self.inner.state
    }

    fn poll_interval(&self) -> std::time::Duration {
        self.inner.cfg.halt_poll_interval
    }
}
