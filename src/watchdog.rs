//! # WatchDog: background supervisor restarting dead subscriptions.
//!
//! A subscription whose worker hits a transport or handler failure turns
//! `dead` and stays that way — it never retries itself. The [`WatchDog`]
//! closes the loop: it scans the registry at a fixed interval and restarts
//! any dead member **in place**, reusing the same subscription object and
//! therefore its checkpoint and statistic.
//!
//! ```text
//! loop {
//!   sleep(watchdog_interval)
//!   break unless running
//!   for sub in collection.list() {
//!     break unless running          (unwatch drains promptly)
//!     next unless sub is dead
//!     next if veto(sub)             (optional predicate)
//!     sub.restart()
//!   }
//! }
//! ```
//!
//! ## Rules
//! - One watchdog per registry; usage is optional.
//! - The scan snapshots the registry, never the live collection.
//! - A failure inside the scan loop (a restart on a disposed member, a panic
//!   in the veto) is fatal to the watchdog only: its state turns `dead`, no
//!   subscription is touched.
//! - `unwatch` follows the same cooperative-then-forced two-phase shutdown as
//!   `Subscription::stop_listening`.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::SubscriptionError;
use crate::events::{Bus, Event, EventKind};
use crate::registry::Subscriptions;
use crate::runner::{self, lock_slot, Runner, RunnerSlot, StopSupervisor};
use crate::state::{RunState, StateCell, WaitForFinish};
use crate::subscription::Subscription;

/// Predicate consulted before each restart; returning true skips that
/// subscription.
pub type RestartVeto = Arc<dyn Fn(&Subscription) -> bool + Send + Sync>;

/// Background supervisor for one [`Subscriptions`] collection.
pub struct WatchDog {
    collection: Arc<Subscriptions>,
    state: StateCell,
    runner: RunnerSlot,
    veto: Option<RestartVeto>,
    cfg: Config,
    bus: Bus,
}

impl WatchDog {
    /// Creates a watchdog over `collection`; nothing is spawned until
    /// [`watch`](Self::watch). Config and bus are the collection's.
    pub fn new(collection: Arc<Subscriptions>) -> Self {
        let cfg = collection.config().clone();
        let bus = collection.bus().clone();
        Self {
            collection,
            state: StateCell::new(),
            runner: runner::new_runner_slot(),
            veto: None,
            cfg,
            bus,
        }
    }

    /// Installs a restart veto predicate.
    pub fn with_veto<F>(mut self, veto: F) -> Self
    where
        F: Fn(&Subscription) -> bool + Send + Sync + 'static,
    {
        self.veto = Some(Arc::new(veto));
        self
    }

    /// Creates a watchdog and immediately starts watching.
    pub fn watch_collection(collection: Arc<Subscriptions>) -> Self {
        let watch_dog = Self::new(collection);
        watch_dog.watch();
        watch_dog
    }

    /// Starts the scan loop. Idempotent while a runner handle is present.
    pub fn watch(&self) -> &Self {
        let mut slot = lock_slot(&self.runner);
        if slot.is_some() {
            return self;
        }
        self.state.set(RunState::Running);
        self.bus.publish(Event::now(EventKind::WatchdogStarted));

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let state = self.state.clone();
        let collection = Arc::clone(&self.collection);
        let veto = self.veto.clone();
        let bus = self.bus.clone();
        let interval = self.cfg.watchdog_interval;

        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = time::sleep(interval) => {}
                    _ = token.cancelled() => {}
                }
                if !state.is(RunState::Running) {
                    break;
                }

                let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    scan(&collection, veto.as_ref(), &state)
                }));
                let failure = match outcome {
                    Ok(Ok(())) => None,
                    Ok(Err(error)) => Some(error.to_string()),
                    Err(_panic) => Some("panic inside the watchdog scan".to_string()),
                };
                if let Some(error) = failure {
                    state.set(RunState::Dead);
                    bus.publish(Event::now(EventKind::WatchdogFailed).with_error(error));
                    break;
                }
            }
        });
        *slot = Some(Runner::new(join, cancel));
        self
    }

    /// Requests a stop of the scan loop; returns immediately. No-op unless
    /// the loop is alive. Await
    /// [`wait_for_finish`](WaitForFinish::wait_for_finish) for the outcome.
    pub fn unwatch(&self) -> &Self {
        {
            let slot = lock_slot(&self.runner);
            let Some(current) = slot.as_ref().filter(|runner| runner.is_alive()) else {
                return self;
            };
            self.state.set(RunState::Halting);
            current.request_stop();
        }
        self.bus.publish(Event::now(EventKind::WatchdogHalting));
        runner::spawn_stop_supervisor(StopSupervisor {
            state: self.state.clone(),
            slot: Arc::clone(&self.runner),
            forced_shutdown_delay: self.cfg.forced_shutdown_delay,
            poll_interval: self.cfg.halt_poll_interval,
            bus: self.bus.clone(),
            stream: None,
            stopped_kind: EventKind::WatchdogStopped,
            forced_kind: EventKind::ForcedShutdown,
        });
        self
    }

    /// True while the scan loop is running.
    pub fn is_watching(&self) -> bool {
        lock_slot(&self.runner)
            .as_ref()
            .map(Runner::is_alive)
            .unwrap_or(false)
    }

    /// The watchdog's own lifecycle state cell.
    pub fn state(&self) -> &StateCell {
        &self.state
    }
}

/// One pass over the registry snapshot, restarting dead members in place.
fn scan(
    collection: &Subscriptions,
    veto: Option<&RestartVeto>,
    state: &StateCell,
) -> Result<(), SubscriptionError> {
    for member in collection.list() {
        if !state.is(RunState::Running) {
            break;
        }
        if !member.state().is(RunState::Dead) {
            continue;
        }
        if let Some(veto) = veto {
            if veto(&member) {
                continue;
            }
        }
        member.restart()?;
    }
    Ok(())
}

impl std::fmt::Debug for WatchDog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchDog")
            .field("state", &self.state.get())
            .field("watching", &self.is_watching())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WaitForFinish for WatchDog {
    fn state_cell(&self) -> &StateCell {
        &self.state
    }

    fn poll_interval(&self) -> std::time::Duration {
        self.cfg.halt_poll_interval
    }
}
