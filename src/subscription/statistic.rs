//! Per-subscription counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use crate::error::SubscriptionError;

/// Plain counters describing one logical subscription's history.
///
/// Owned by the subscription's worker (error and progress counters) and the
/// watchdog (`last_restart_at`). The same instance survives every restart of
/// the subscription.
#[derive(Debug, Default)]
pub struct SubscriptionStatistic {
    errors_count: AtomicU64,
    events_processed: AtomicU64,
    last_error: Mutex<Option<Arc<SubscriptionError>>>,
    last_restart_at: Mutex<Option<SystemTime>>,
}

impl SubscriptionStatistic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of worker failures recorded so far.
    pub fn errors_count(&self) -> u64 {
        self.errors_count.load(Ordering::SeqCst)
    }

    /// Number of decoded events delivered to the caller's handler.
    pub fn events_processed(&self) -> u64 {
        self.events_processed.load(Ordering::SeqCst)
    }

    /// The most recent worker failure, if any.
    pub fn last_error(&self) -> Option<Arc<SubscriptionError>> {
        self.lock_last_error().clone()
    }

    /// When the subscription was last restarted, if ever.
    pub fn last_restart_at(&self) -> Option<SystemTime> {
        *lock(&self.last_restart_at)
    }

    /// Records a worker failure: stores it as `last_error` and increments the
    /// error counter. Returns the stored error for further reporting.
    pub(crate) fn record_error(&self, error: SubscriptionError) -> Arc<SubscriptionError> {
        let error = Arc::new(error);
        *self.lock_last_error() = Some(Arc::clone(&error));
        self.errors_count.fetch_add(1, Ordering::SeqCst);
        error
    }

    /// Increments the processed-events counter.
    pub(crate) fn add_processed(&self) {
        self.events_processed.fetch_add(1, Ordering::SeqCst);
    }

    /// Stamps `last_restart_at` with the current time.
    pub(crate) fn mark_restarted(&self) {
        *lock(&self.last_restart_at) = Some(SystemTime::now());
    }

    fn lock_last_error(&self) -> std::sync::MutexGuard<'_, Option<Arc<SubscriptionError>>> {
        lock(&self.last_error)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
