//! # Global runtime configuration.
//!
//! [`Config`] centralizes the timing knobs shared by subscriptions, their stop
//! supervisors, and the watchdog. A registry passes its config down to every
//! [`Subscription`](crate::Subscription) it creates.
//!
//! ## Field semantics
//! - `forced_shutdown_delay`: grace window a stop supervisor grants the worker
//!   before force-aborting it
//! - `halt_poll_interval`: liveness poll cadence of stop supervisors and
//!   `wait_for_finish`
//! - `watchdog_interval`: delay between watchdog scans of the registry
//! - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)

use std::time::Duration;

/// Timing and capacity knobs for the subscription runtime.
///
/// The worker's only cooperative cancellation point is its per-message state
/// check. An idle stream delivers no messages, so that check may never run —
/// `forced_shutdown_delay` bounds how long a stop request can stay pending
/// before the worker is aborted outright.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time a stop supervisor waits for the worker to exit on its own
    /// before aborting it.
    pub forced_shutdown_delay: Duration,

    /// Cadence at which stop supervisors and `wait_for_finish` re-check
    /// runner liveness.
    pub halt_poll_interval: Duration,

    /// Delay between two watchdog scans of the registry.
    pub watchdog_interval: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` events observe
    /// `Lagged` and skip older items.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `forced_shutdown_delay = 60s`
    /// - `halt_poll_interval = 100ms`
    /// - `watchdog_interval = 1s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            forced_shutdown_delay: Duration::from_secs(60),
            halt_poll_interval: Duration::from_millis(100),
            watchdog_interval: Duration::from_secs(1),
            bus_capacity: 1024,
        }
    }
}
