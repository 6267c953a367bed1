//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [listening] stream=orders
//! [worker-failed] stream=orders err="transport failure: connection refused"
//! [restarted] stream=orders
//! [halting] stream=orders
//! [stopped] stream=orders
//! [watchdog-started]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Not intended for production use -
/// implement a custom [`Subscribe`] for structured logging or metrics.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::Listening => {
                println!("[listening] stream={:?}", e.stream);
            }
            EventKind::Halting => {
                println!("[halting] stream={:?}", e.stream);
            }
            EventKind::Stopped => {
                println!("[stopped] stream={:?}", e.stream);
            }
            EventKind::ForcedShutdown => {
                println!("[forced-shutdown] stream={:?}", e.stream);
            }
            EventKind::WorkerFailed => {
                println!("[worker-failed] stream={:?} err={:?}", e.stream, e.error);
            }
            EventKind::Restarted => {
                println!("[restarted] stream={:?}", e.stream);
            }
            EventKind::Deleted => {
                println!("[deleted] stream={:?}", e.stream);
            }
            EventKind::WatchdogStarted => {
                println!("[watchdog-started]");
            }
            EventKind::WatchdogHalting => {
                println!("[watchdog-halting]");
            }
            EventKind::WatchdogStopped => {
                println!("[watchdog-stopped]");
            }
            EventKind::WatchdogFailed => {
                println!("[watchdog-failed] err={:?}", e.error);
            }
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] name={:?} reason={:?}", e.stream, e.error);
            }
            EventKind::SubscriberPanicked => {
                println!("[subscriber-panicked] name={:?} info={:?}", e.stream, e.error);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
