//! Revision tracking for subscriptions to a single named stream.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::client::{ReadFrom, StreamMessage};
use crate::error::BoxError;

/// Hook invoked after every applied revision update, in registration order.
pub type RevisionHook = Arc<dyn Fn(&StreamRevision) -> Result<(), BoxError> + Send + Sync>;

/// Progress marker for a subscription to one named stream.
///
/// Only event records carry a revision; checkpoint markers belong to the
/// `$all` stream and never reach a named-stream read.
#[derive(Default)]
pub struct StreamRevision {
    value: Mutex<Option<u64>>,
    hooks: Mutex<Vec<RevisionHook>>,
}

impl StreamRevision {
    /// Creates an empty revision with no hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the revision carried by an event record, then runs the hooks.
    ///
    /// Returns `Ok(false)` untouched for every other message kind. The value
    /// is written before any hook runs; the first hook error propagates.
    pub fn update(&self, message: &StreamMessage) -> Result<bool, BoxError> {
        let StreamMessage::Event(event) = message else {
            return Ok(false);
        };

        *lock(&self.value) = Some(event.stream_revision);

        let hooks: Vec<RevisionHook> = lock(&self.hooks).clone();
        for hook in hooks {
            hook(self)?;
        }
        Ok(true)
    }

    /// Appends a hook run after every applied update. There is no removal
    /// API; do not register in a loop.
    pub fn register_update_hook<F>(&self, hook: F)
    where
        F: Fn(&StreamRevision) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        lock(&self.hooks).push(Arc::new(hook));
    }

    /// The current revision, if any update has been applied.
    pub fn get(&self) -> Option<u64> {
        *lock(&self.value)
    }

    /// True if no revision has been recorded.
    pub fn is_empty(&self) -> bool {
        self.get().is_none()
    }

    /// True if a revision has been recorded.
    pub fn is_present(&self) -> bool {
        !self.is_empty()
    }

    /// Maps the recorded revision to the client's "start from" option shape.
    pub fn to_read_from(&self) -> Option<ReadFrom> {
        self.get().map(ReadFrom::Revision)
    }
}

impl std::fmt::Debug for StreamRevision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamRevision")
            .field("value", &self.get())
            .field("hooks", &lock(&self.hooks).len())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
