//! Raw messages observed on a server-streaming read.

/// A stored event as it appears on the wire, positions included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedEvent {
    /// Unique event id.
    pub id: String,
    /// Stream the event was appended to.
    pub stream_name: String,
    /// Event type tag.
    pub event_type: String,
    /// Revision of the event within its stream.
    pub stream_revision: u64,
    /// Commit position in the global `$all` ordering.
    pub commit_position: u64,
    /// Prepare position in the global `$all` ordering.
    pub prepare_position: u64,
    /// Raw payload. Content decoding is the client's concern.
    pub data: Vec<u8>,
    /// Raw metadata payload.
    pub metadata: Vec<u8>,
}

/// One raw message from the stream.
///
/// Only `Checkpoint` and `Event` carry progress data; `Confirmation` and
/// `Other` leave checkpoints untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamMessage {
    /// An event record.
    Event(RecordedEvent),
    /// A `$all` filter checkpoint marker.
    Checkpoint {
        commit_position: u64,
        prepare_position: u64,
    },
    /// Subscription confirmation, carrying the server-side subscription id.
    Confirmation(String),
    /// Anything else the transport surfaces; ignored by the runtime.
    Other,
}

/// Sink verdict for one message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ack {
    /// Keep pumping.
    Continue,
    /// Stop the read and return cleanly.
    Stop,
}
