//! Error types used by the subscription runtime.
//!
//! [`SubscriptionError`] covers both failure classes the runtime distinguishes:
//!
//! - background-worker failures (transport, handler, update hook) — recorded
//!   into the subscription's statistic and surfaced as the `dead` state, never
//!   returned to the caller that started the worker;
//! - synchronous misuse guards (`WorkerAlive`, `Disposed`) — returned
//!   immediately to the offending caller.
//!
//! Errors crossing the user-callback seams (event handler, checkpoint update
//! hook) are open-ended, so those variants carry a [`BoxError`].

use thiserror::Error;

use crate::client::ClientError;

/// Open-ended error type produced by injected callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// # Errors produced by the subscription runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SubscriptionError {
    /// The external stream client failed (transport or decode). Fatal to the
    /// worker; recoverable via restart.
    #[error("stream client failure: {0}")]
    Client(#[from] ClientError),

    /// The caller's event handler failed. Treated exactly like a transport
    /// failure by the worker.
    #[error("event handler failure: {0}")]
    Handler(#[source] BoxError),

    /// A checkpoint update hook failed. The in-memory checkpoint value was
    /// already updated before the hook ran.
    #[error("checkpoint update hook failure: {0}")]
    UpdateHook(#[source] BoxError),

    /// `delete` was called while the worker is still alive.
    #[error("can not delete a subscription whose worker is still alive")]
    WorkerAlive,

    /// The entity was deleted; no further operations are possible.
    #[error("subscription has been deleted")]
    Disposed,
}

impl SubscriptionError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SubscriptionError::Client(_) => "client_failure",
            SubscriptionError::Handler(_) => "handler_failure",
            SubscriptionError::UpdateHook(_) => "update_hook_failure",
            SubscriptionError::WorkerAlive => "worker_alive",
            SubscriptionError::Disposed => "disposed",
        }
    }
}
