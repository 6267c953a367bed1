//! # streamvisor
//!
//! **Streamvisor** manages long-lived, concurrent subscriptions to a
//! streaming event source: an append-only log partitioned into streams, with
//! a global `$all` stream.
//!
//! Each subscription runs a blocking read loop in the background, can be
//! started and stopped without blocking the caller, survives handler and
//! transport failures, and tracks its own checkpoint so a restart resumes
//! instead of replaying. The crate is designed as a building block for
//! projections, process managers, and read-model updaters.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ Subscription │   │ Subscription │   │ Subscription │
//!     │  ("$all")    │   │  ("orders")  │   │ ("payments") │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Subscriptions (registry)                                         │
//! │  - shared EventStreamClient                                       │
//! │  - Bus (broadcast lifecycle events)                               │
//! │  - atomic Add / Remove / ListenAll / StopAll / List (snapshot)    │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │    worker    │   │    worker    │   │    worker    │
//!     │ (read loop)  │   │ (read loop)  │   │ (read loop)  │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │ per raw message: │                  │
//!      │ - running check  │   ┌──────────────┴─────────────┐
//!      │ - decode+handler │   │  WatchDog (optional)       │
//!      │ - checkpoint     │   │  scans registry, restarts  │
//!      │   update + hooks │   │  dead subscriptions        │
//!      ▼                  ▼   └────────────────────────────┘
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! └───────────────────────────────┬───────────────────────────────────┘
//!                                 ▼
//!                      SubscriberSet (per-sub queues)
//!                       worker1   worker2   workerN
//!                          ▼         ▼         ▼
//!                      sub1.on_  sub2.on_  subN.on_
//!                       event()   event()   event()
//! ```
//!
//! ### Lifecycle
//! ```text
//! Subscriptions::create ──► Subscription (initial)
//!
//! listen():
//!   ├─► state := running
//!   └─► spawn worker ──► client.subscribe_to_stream(...)   (blocks for life)
//!           │ per raw message:
//!           ├─► state still running?  no ─► worker exits
//!           ├─► decode ─► usable event ─► caller handler, events_processed += 1
//!           ├─► checkpoint.update(msg) ─► update hooks (in order)
//!           └─► transport/handler/hook failure:
//!                 statistic.last_error, errors_count += 1, state := dead
//!
//! stop_listening():                 (async - returns immediately)
//!   ├─► state := halting, cancel token
//!   └─► spawn stop supervisor:
//!         poll liveness every halt_poll_interval
//!         forced_shutdown_delay expired ─► abort worker
//!         worker finished ─► state := stopped, handle cleared
//!
//! restart():  (dead or stopped ─► running; checkpoint/statistic reused)
//! delete():   (fails while alive; otherwise disposes the instance)
//!
//! WatchDog::watch():
//!   loop { sleep(watchdog_interval); for dead member: restart in place }
//! ```
//!
//! ## Features
//! | Area            | Description                                             | Key types / traits                     |
//! |-----------------|---------------------------------------------------------|----------------------------------------|
//! | **Lifecycle**   | Start/stop/restart/delete supervised subscriptions.     | [`Subscription`], [`RunState`]         |
//! | **Checkpoints** | Track progress; run update hooks for persistence.       | [`Checkpoint`], [`StreamPosition`], [`StreamRevision`] |
//! | **Registry**    | Thread-safe collection with atomic bulk operations.     | [`Subscriptions`]                      |
//! | **Supervision** | Restart dead subscriptions automatically.               | [`WatchDog`]                           |
//! | **Boundary**    | Bring your own transport and decoding.                  | [`EventStreamClient`]                  |
//! | **Observability** | Lifecycle events fanned out to subscribers.           | [`Event`], [`Bus`], [`Subscribe`]      |
//! | **Errors**      | Typed worker failures and misuse guards.                | [`SubscriptionError`]                  |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust,ignore
//! use std::sync::Arc;
//! use streamvisor::{Config, SubscribeOptions, Subscriptions, WaitForFinish, WatchDog};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(MyGrpcClient::connect("esdb://localhost:2113")?);
//!     let registry = Arc::new(Subscriptions::new(client));
//!
//!     // Subscribe to a named stream; the handler sees decoded events only.
//!     let sub = registry.create(
//!         "orders",
//!         SubscribeOptions::default(),
//!         Arc::new(|event| {
//!             println!("order event: {}", event.event_type);
//!             Ok(())
//!         }),
//!     );
//!
//!     // Persist progress from an update hook (the runtime persists nothing).
//!     if let Some(revision) = sub.checkpoint().as_revision() {
//!         revision.register_update_hook(|checkpoint| {
//!             // write checkpoint.get() somewhere durable
//!             Ok(())
//!         });
//!     }
//!
//!     registry.listen_all()?;
//!     let watch_dog = WatchDog::watch_collection(Arc::clone(&registry));
//!
//!     // ... run ...
//!
//!     watch_dog.unwatch();
//!     watch_dog.wait_for_finish().await;
//!     registry.stop_all()?;
//!     Ok(())
//! }
//! ```

mod checkpoint;
mod client;
mod config;
mod error;
mod events;
mod registry;
mod runner;
mod state;
mod subscribers;
mod subscription;
mod watchdog;

// ---- Public re-exports ----

pub use checkpoint::{Checkpoint, Position, StreamPosition, StreamRevision, ALL_STREAM};
pub use client::{
    Ack, ClientConfig, ClientError, EventStreamClient, FilterOptions, MessageSink, ReadFrom,
    RecordedEvent, StreamMessage, SubscribeOptions,
};
pub use config::Config;
pub use error::{BoxError, SubscriptionError};
pub use events::{Bus, Event, EventKind};
pub use registry::Subscriptions;
pub use state::{RunState, StateCell, WaitForFinish};
pub use subscribers::{Subscribe, SubscriberSet};
pub use subscription::{EventHandler, Subscription, SubscriptionSetup, SubscriptionStatistic};
pub use watchdog::{RestartVeto, WatchDog};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
