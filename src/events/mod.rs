//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by subscriptions, their stop
//! supervisors, the registry, and the watchdog.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Subscription` (listen/restart/delete), its workers and
//!   stop supervisors, `WatchDog`, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the listener spawned by
//!   `Subscriptions::attach_subscribers` (fans out to `SubscriberSet`) and any
//!   direct `bus.subscribe()` receiver.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
