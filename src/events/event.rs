//! # Runtime events emitted by subscriptions, supervisors, and the watchdog.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Subscription lifecycle**: listen, halt, stop, restart, delete, death
//! - **Watchdog lifecycle**: start, halt, stop, failure
//! - **Subscriber plumbing**: overflow and panic reports from the fan-out set
//!
//! The [`Event`] struct carries the classification plus optional metadata:
//! the stream name and an error description.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscription lifecycle ===
    /// A subscription's worker was spawned.
    ///
    /// Sets: `stream`, `at`, `seq`.
    Listening,

    /// A stop was requested; the worker may still be winding down.
    ///
    /// Sets: `stream`, `at`, `seq`.
    Halting,

    /// The worker was confirmed terminated after a cooperative stop.
    ///
    /// Sets: `stream`, `at`, `seq`.
    Stopped,

    /// The grace window expired and the worker was force-aborted.
    ///
    /// Sets: `stream`, `at`, `seq`.
    ForcedShutdown,

    /// The worker died from an unrecovered failure; the subscription is
    /// `dead` until restarted.
    ///
    /// Sets: `stream`, `error`, `at`, `seq`.
    WorkerFailed,

    /// The subscription was restarted in place (manually or by the
    /// watchdog), resuming from its checkpoint.
    ///
    /// Sets: `stream`, `at`, `seq`.
    Restarted,

    /// The subscription was deleted and is permanently unusable.
    ///
    /// Sets: `stream`, `at`, `seq`.
    Deleted,

    // === Watchdog lifecycle ===
    /// The watchdog's scan loop was spawned.
    ///
    /// Sets: `at`, `seq`.
    WatchdogStarted,

    /// An unwatch was requested; the scan loop may still be winding down.
    ///
    /// Sets: `at`, `seq`.
    WatchdogHalting,

    /// The scan loop was confirmed terminated.
    ///
    /// Sets: `at`, `seq`.
    WatchdogStopped,

    /// A failure inside the scan loop killed the watchdog. Subscriptions are
    /// unaffected.
    ///
    /// Sets: `error`, `at`, `seq`.
    WatchdogFailed,

    // === Subscriber plumbing ===
    /// A fan-out subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `stream` (subscriber name), `error` (reason), `at`, `seq`.
    SubscriberOverflow,

    /// A fan-out subscriber panicked while handling an event.
    ///
    /// Sets: `stream` (subscriber name), `error` (panic info), `at`, `seq`.
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - `stream`/`error` are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Stream the subscription reads (or subscriber name for plumbing events).
    pub stream: Option<Arc<str>>,
    /// Human-readable error description, if applicable.
    pub error: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            stream: None,
            error: None,
        }
    }

    /// Attaches a stream (or subscriber) name.
    #[inline]
    pub fn with_stream(mut self, stream: impl Into<Arc<str>>) -> Self {
        self.stream = Some(stream.into());
        self
    }

    /// Attaches an error description.
    #[inline]
    pub fn with_error(mut self, error: impl Into<Arc<str>>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::now(EventKind::SubscriberOverflow)
            .with_stream(subscriber)
            .with_error(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_stream(subscriber)
            .with_error(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}
