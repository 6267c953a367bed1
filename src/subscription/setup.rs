//! Parameters a subscription was created with.

use std::fmt;
use std::sync::Arc;

use crate::client::{RecordedEvent, SubscribeOptions};
use crate::error::BoxError;

/// Caller-supplied handler invoked once per decoded event.
///
/// A failure here is fatal to the worker (the subscription goes `dead`), the
/// same as a transport failure.
pub type EventHandler = Arc<dyn Fn(RecordedEvent) -> Result<(), BoxError> + Send + Sync>;

/// Immutable-by-convention record of the parameters used to open a
/// subscription. Kept for the worker's option adjustment and for restarts.
///
/// `Clone` yields a structurally independent copy of the stream name and
/// options; the handler reference is shared, callbacks are not value types.
#[derive(Clone)]
pub struct SubscriptionSetup {
    /// Stream the subscription reads.
    pub stream: String,
    /// Caller-supplied read options; adjusted (not mutated) by the worker.
    pub options: SubscribeOptions,
    /// Caller-supplied event handler.
    pub handler: EventHandler,
}

impl SubscriptionSetup {
    pub fn new(
        stream: impl Into<String>,
        options: SubscribeOptions,
        handler: EventHandler,
    ) -> Self {
        Self {
            stream: stream.into(),
            options,
            handler,
        }
    }
}

impl fmt::Debug for SubscriptionSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionSetup")
            .field("stream", &self.stream)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
