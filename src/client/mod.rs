//! # External event-stream client boundary.
//!
//! The runtime does not own a wire protocol. Everything it needs from the
//! outside world is captured by [`EventStreamClient`]: a server-streaming read
//! that stays open for the worker's entire life and hands every raw message to
//! a sink, plus the decode step that turns a raw message into a usable event.
//!
//! ```text
//! Subscription worker ──► client.subscribe_to_stream(stream, options, stop, sink)
//!                                        │ (blocks until the stream ends,
//!                                        │  the sink answers Stop, `stop`
//!                                        │  fires, or the transport fails)
//!                                        ▼
//!                              sink(StreamMessage) -> Ack   (per message)
//! ```
//!
//! ## Rules
//! - The sink is always the runtime's internal wrapper, never the caller's
//!   raw handler.
//! - `options.start`, when present, carries a checkpoint mapped through
//!   [`Checkpoint::to_read_from`](crate::checkpoint::Checkpoint::to_read_from);
//!   this shape is the wire contract and must not drift.
//! - Implementations must return `Ok(())` on a clean end of stream, on
//!   `Ack::Stop`, and on `stop` cancellation; only genuine failures are `Err`.
//! - The call must be abort-safe: the runtime may `abort()` the task driving
//!   it once the forced-shutdown delay expires.

mod message;

pub use message::{Ack, RecordedEvent, StreamMessage};

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Per-message sink driven by [`EventStreamClient::subscribe_to_stream`].
pub type MessageSink<'a> = &'a mut (dyn FnMut(StreamMessage) -> Ack + Send);

/// The external client's configured decode defaults.
///
/// Per-call [`SubscribeOptions`] overrides take precedence; these values are
/// the fallback, injected from the one place that owns them.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClientConfig {
    /// Skip payload deserialization when decoding.
    pub skip_deserialization: bool,
    /// Skip payload decryption when decoding.
    pub skip_decryption: bool,
}

/// Position to resume reading a stream from.
///
/// The two shapes mirror the two checkpoint kinds: a commit/prepare pair for
/// the `$all` stream, a revision for a named stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadFrom {
    /// Resume the `$all` stream after this position.
    Position {
        commit_position: u64,
        prepare_position: u64,
    },
    /// Resume a named stream after this revision.
    Revision(u64),
}

/// Server-side filter options, passed through to the client unmodified.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Match streams whose name starts with any of these prefixes.
    pub stream_prefixes: Vec<String>,
    /// Match events whose type starts with any of these prefixes.
    pub event_type_prefixes: Vec<String>,
}

/// Options for opening a subscription read.
#[derive(Clone, Debug, Default)]
pub struct SubscribeOptions {
    /// Where to resume from. `None` reads from the start of the stream.
    pub start: Option<ReadFrom>,
    /// Optional server-side filter, forwarded unmodified.
    pub filter: Option<FilterOptions>,
    /// Per-call deserialization override; `None` falls back to
    /// [`ClientConfig::skip_deserialization`].
    pub skip_deserialization: Option<bool>,
    /// Per-call decryption override; `None` falls back to
    /// [`ClientConfig::skip_decryption`].
    pub skip_decryption: Option<bool>,
}

/// # Errors produced by the external stream client.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ClientError {
    /// The connection or the server-streaming call failed.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A raw message could not be decoded into an event.
    #[error("decode failure: {0}")]
    Decode(String),
}

/// Capability set the subscription worker consumes.
///
/// One long-lived client instance is shared by every subscription in a
/// registry.
#[async_trait]
pub trait EventStreamClient: Send + Sync + 'static {
    /// The client's configured decode defaults.
    fn config(&self) -> ClientConfig;

    /// Opens a server-streaming read and drives `sink` once per raw message.
    ///
    /// Blocks (awaits) until the stream ends, the sink returns [`Ack::Stop`],
    /// `stop` is cancelled, or the transport fails. Cancellation via `stop`
    /// and `Ack::Stop` are clean exits, not errors.
    async fn subscribe_to_stream(
        &self,
        stream: &str,
        options: &SubscribeOptions,
        stop: CancellationToken,
        sink: MessageSink<'_>,
    ) -> Result<(), ClientError>;

    /// Decodes a raw message into a usable event.
    ///
    /// Returns `Ok(None)` for messages that carry no event (checkpoint
    /// markers, confirmations) or that the skip flags leave opaque.
    fn decode(
        &self,
        message: &StreamMessage,
        skip_deserialization: bool,
        skip_decryption: bool,
    ) -> Result<Option<RecordedEvent>, ClientError>;
}
