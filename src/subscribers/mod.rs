//! # Event subscribers for the subscription runtime.
//!
//! This module provides the [`Subscribe`] trait and the fan-out machinery for
//! handling runtime events broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Subscription / WatchDog ── publish(Event) ──► Bus
//!                                                  │
//!                           attach_subscribers listener
//!                                                  │
//!                                         SubscriberSet::emit
//!                                      ┌─────────┬─────────┐
//!                                      ▼         ▼         ▼
//!                                 [queue 1] [queue 2]  [queue N]
//!                                      ▼         ▼         ▼
//!                               sub1.on_event  sub2...  subN...
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use streamvisor::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct Metrics;
//!
//! #[async_trait]
//! impl Subscribe for Metrics {
//!     async fn on_event(&self, event: &Event) {
//!         if let EventKind::WorkerFailed = event.kind {
//!             // increment failure counter
//!         }
//!     }
//!     fn name(&self) -> &'static str { "metrics" }
//! }
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
