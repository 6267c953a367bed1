//! # Subscription registry - thread-safe collection of live subscriptions.
//!
//! [`Subscriptions`] owns the shared stream client, the runtime config, and
//! the event bus, and builds [`Subscription`]s with the right checkpoint kind
//! for their stream:
//!
//! ```text
//! create("$all", ...)   ──► Checkpoint::Position ──┐
//! create("orders", ...) ──► Checkpoint::Revision ──┼──► Subscription ──► collection
//!                                                  │       (returned)
//! create_for_all(...) ─── "$all" fixed ────────────┘
//! ```
//!
//! ## Rules
//! - One mutex guards the backing collection; `add`/`remove`/`listen_all`/
//!   `stop_all`/`list` are each a single atomic critical section.
//! - `listen_all`/`stop_all` call into members while holding the lock; both
//!   member calls are async-returning by design, so the lock is held only
//!   briefly.
//! - No external code ever sees the live collection: [`list`](Subscriptions::list)
//!   returns an independent snapshot.
//! - Membership is plain (no uniqueness key); removal matches by subscription
//!   identity.
//! - Registry operations serialize with each other, **not** with any
//!   member's internal transitions — observing a member via `list` and then
//!   calling it can race its own worker, which the member's internal locking
//!   tolerates.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::checkpoint::Checkpoint;
use crate::client::{EventStreamClient, SubscribeOptions};
use crate::config::Config;
use crate::error::SubscriptionError;
use crate::events::Bus;
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::subscription::{EventHandler, Subscription, SubscriptionSetup};

pub use crate::checkpoint::ALL_STREAM;

/// Thread-safe collection of live subscriptions sharing one client.
pub struct Subscriptions {
    client: Arc<dyn EventStreamClient>,
    cfg: Config,
    bus: Bus,
    collection: Mutex<Vec<Subscription>>,
}

impl Subscriptions {
    /// Creates an empty registry with default config.
    pub fn new(client: Arc<dyn EventStreamClient>) -> Self {
        Self::with_config(client, Config::default())
    }

    /// Creates an empty registry with the given config; the config is passed
    /// down to every subscription created here.
    pub fn with_config(client: Arc<dyn EventStreamClient>, cfg: Config) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self {
            client,
            cfg,
            bus,
            collection: Mutex::new(Vec::new()),
        }
    }

    /// Builds a subscription for `stream` — with a position checkpoint for
    /// [`ALL_STREAM`], a revision checkpoint otherwise — adds it to the
    /// collection, and returns it. Nothing is spawned until `listen`.
    pub fn create(
        &self,
        stream: impl Into<String>,
        options: SubscribeOptions,
        handler: EventHandler,
    ) -> Subscription {
        let stream = stream.into();
        let checkpoint = Checkpoint::for_stream(&stream);
        let setup = SubscriptionSetup::new(stream, options, handler);
        let subscription = Subscription::new(
            Arc::clone(&self.client),
            checkpoint,
            setup,
            self.bus.clone(),
            self.cfg.clone(),
        );
        self.add(subscription.clone());
        subscription
    }

    /// Shortcut: [`create`](Self::create) with [`ALL_STREAM`] fixed.
    pub fn create_for_all(&self, options: SubscribeOptions, handler: EventHandler) -> Subscription {
        self.create(ALL_STREAM, options, handler)
    }

    /// Adds a subscription to the collection.
    pub fn add(&self, subscription: Subscription) {
        self.lock().push(subscription);
    }

    /// Removes a subscription from the collection, matching by identity.
    ///
    /// Returns the removed member, or `None` if it was not in the collection
    /// (size unchanged).
    pub fn remove(&self, subscription: &Subscription) -> Option<Subscription> {
        let mut collection = self.lock();
        let index = collection
            .iter()
            .position(|member| member.same_subscription(subscription))?;
        Some(collection.remove(index))
    }

    /// Starts listening on every member. The first disposed member aborts
    /// with its error.
    pub fn listen_all(&self) -> Result<(), SubscriptionError> {
        let collection = self.lock();
        for member in collection.iter() {
            member.listen()?;
        }
        Ok(())
    }

    /// Requests a stop on every member. The first disposed member aborts
    /// with its error.
    pub fn stop_all(&self) -> Result<(), SubscriptionError> {
        let collection = self.lock();
        for member in collection.iter() {
            member.stop_listening()?;
        }
        Ok(())
    }

    /// An independent snapshot of the current members.
    pub fn list(&self) -> Vec<Subscription> {
        self.lock().clone()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The event bus all members (and any watchdog) publish to.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// The shared stream client.
    pub fn client(&self) -> &Arc<dyn EventStreamClient> {
        &self.client
    }

    /// The config passed to members created here.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Wires a fan-out [`SubscriberSet`] to the bus: spawns the listener task
    /// forwarding every published event to each subscriber's queue.
    pub fn attach_subscribers(&self, subscribers: Vec<Arc<dyn Subscribe>>) {
        let set = SubscriberSet::new(subscribers, self.bus.clone());
        let mut rx = self.bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => set.emit(&event),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Subscription>> {
        self.collection.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for Subscriptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriptions")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
