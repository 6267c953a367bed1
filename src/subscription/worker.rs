//! # Subscription worker: the background read loop.
//!
//! One worker per listening subscription. The worker opens the external
//! server-streaming read with the caller's original parameters, adjusted so
//! the runtime sits between the transport and the caller:
//!
//! ```text
//! client.subscribe_to_stream(stream, adjusted options, token, sink)
//!                                         │
//!                        per raw message  ▼
//!              ┌── state still running?  no ──► Ack::Stop (cooperative exit)
//!              ├── decode(skip flags) ──► usable event? ──► caller handler
//!              │                                            events_processed += 1
//!              └── checkpoint.update(message)   (always, events or not)
//! ```
//!
//! ## Rules
//! - The per-message state check is the **only** in-loop cancellation point;
//!   cancellation latency is bounded by inter-message spacing, hence the
//!   forced-shutdown escape hatch in [`runner`](crate::runner).
//! - Decode, handler, and update-hook failures are fatal to the worker:
//!   recorded into the statistic, state set to `dead`. Recovery belongs to
//!   `restart`/the watchdog, never to the worker itself.
//! - A worker failure never propagates to the caller that started it; it is
//!   observable only via the statistic, the state machine, and the bus.

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::client::{Ack, StreamMessage, SubscribeOptions};
use crate::error::SubscriptionError;
use crate::events::{Event, EventKind};
use crate::runner::Runner;
use crate::state::RunState;
use crate::subscription::Subscription;

/// Spawns the read-loop task for `subscription` and returns its runner.
pub(crate) fn spawn_worker(subscription: &Subscription) -> Runner {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let subscription = subscription.clone();
    let join = tokio::spawn(async move { run(subscription, token).await });
    Runner::new(join, cancel)
}

/// The worker body: one blocking read for the worker's entire life.
async fn run(subscription: Subscription, stop: CancellationToken) {
    let options = adjusted_options(&subscription);
    let (skip_deserialization, skip_decryption) = decode_flags(&subscription);

    let client = subscription.client().clone();
    let handler = subscription.setup().handler.clone();
    let state = subscription.state().clone();
    let stream = subscription.setup().stream.clone();

    // Decode/handler/hook failures surface here rather than through the
    // client's transport-shaped error type.
    let mut fatal: Option<SubscriptionError> = None;

    let outcome = {
        let statistic = subscription.statistic();
        let checkpoint = subscription.checkpoint();
        let fatal = &mut fatal;

        let mut sink = move |message: StreamMessage| -> Ack {
            if !state.is(RunState::Running) {
                return Ack::Stop;
            }
            match client.decode(&message, skip_deserialization, skip_decryption) {
                Ok(Some(event)) => {
                    if let Err(err) = (handler)(event) {
                        *fatal = Some(SubscriptionError::Handler(err));
                        return Ack::Stop;
                    }
                    statistic.add_processed();
                }
                Ok(None) => {}
                Err(err) => {
                    *fatal = Some(SubscriptionError::Client(err));
                    return Ack::Stop;
                }
            }
            match checkpoint.update(&message) {
                Ok(_) => Ack::Continue,
                Err(err) => {
                    *fatal = Some(SubscriptionError::UpdateHook(err));
                    Ack::Stop
                }
            }
        };

        let read = subscription.client().subscribe_to_stream(
            &subscription.setup().stream,
            &options,
            stop,
            &mut sink,
        );
        std::panic::AssertUnwindSafe(read).catch_unwind().await
    };

    let failure = match outcome {
        Ok(Ok(())) => fatal,
        Ok(Err(transport)) => Some(fatal.unwrap_or(SubscriptionError::Client(transport))),
        Err(panic) => Some(SubscriptionError::Handler(panic_message(panic).into())),
    };

    if let Some(error) = failure {
        let error = subscription.statistic().record_error(error);
        subscription.state().set(RunState::Dead);
        subscription.bus().publish(
            Event::now(EventKind::WorkerFailed)
                .with_stream(stream)
                .with_error(error.to_string()),
        );
    }
}

/// The caller's options, adjusted for the runtime's wrapper:
/// - resume from the checkpoint when it has a recorded value;
/// - transport-level deserialization forced off, so the sink can apply its
///   own skip policy via [`decode_flags`].
fn adjusted_options(subscription: &Subscription) -> SubscribeOptions {
    let mut options = subscription.setup().options.clone();
    if subscription.checkpoint().is_present() {
        options.start = subscription.checkpoint().to_read_from();
    }
    options.skip_deserialization = Some(true);
    options
}

/// Resolves the decode-skip flags: per-call overrides from the setup win,
/// otherwise the client's configured defaults apply.
fn decode_flags(subscription: &Subscription) -> (bool, bool) {
    let defaults = subscription.client().config();
    let options = &subscription.setup().options;
    (
        options
            .skip_deserialization
            .unwrap_or(defaults.skip_deserialization),
        options.skip_decryption.unwrap_or(defaults.skip_decryption),
    )
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
