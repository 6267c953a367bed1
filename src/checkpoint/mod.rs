//! # Checkpoints: per-subscription progress markers.
//!
//! A subscription tracks how far it has read so a restart resumes instead of
//! replaying. The marker's shape depends on the stream:
//!
//! - [`StreamPosition`] — commit/prepare position pair, for the global
//!   [`ALL_STREAM`];
//! - [`StreamRevision`] — single revision, for any named stream.
//!
//! [`Checkpoint`] is the variant chosen once at creation time by stream name.
//! `update` is the only mutator and runs on the owning subscription's worker;
//! external readers (persistence hooks, callers snapshotting progress) only
//! ever observe fully-written values.
//!
//! ## Update hooks
//! Both kinds hold an ordered list of update hooks, run after every applied
//! update. The in-memory value is written **before** the hooks run, so a hook
//! failure never leaves the checkpoint stale. Persisting checkpoints is
//! entirely the hooks' business; the runtime keeps none of it.

mod position;
mod revision;

pub use position::{Position, StreamPosition};
pub use revision::StreamRevision;

use crate::client::{ReadFrom, StreamMessage};
use crate::error::BoxError;

/// Name of the global stream covering every event in the store.
pub const ALL_STREAM: &str = "$all";

/// Progress marker of one subscription, variant fixed at creation time.
#[derive(Debug)]
pub enum Checkpoint {
    /// Tracking the global `$all` stream.
    Position(StreamPosition),
    /// Tracking a named stream.
    Revision(StreamRevision),
}

impl Checkpoint {
    /// Selects the marker kind for `stream`: a position pair for
    /// [`ALL_STREAM`], a revision for anything else.
    pub fn for_stream(stream: &str) -> Self {
        if stream == ALL_STREAM {
            Checkpoint::Position(StreamPosition::new())
        } else {
            Checkpoint::Revision(StreamRevision::new())
        }
    }

    /// Applies progress data from a raw message, then runs update hooks.
    ///
    /// Returns whether an update occurred. The first hook error propagates
    /// after the in-memory value is already updated.
    pub fn update(&self, message: &StreamMessage) -> Result<bool, BoxError> {
        match self {
            Checkpoint::Position(position) => position.update(message),
            Checkpoint::Revision(revision) => revision.update(message),
        }
    }

    /// True if no progress has been recorded yet.
    pub fn is_empty(&self) -> bool {
        match self {
            Checkpoint::Position(position) => position.is_empty(),
            Checkpoint::Revision(revision) => revision.is_empty(),
        }
    }

    /// True if progress has been recorded.
    pub fn is_present(&self) -> bool {
        !self.is_empty()
    }

    /// Maps the recorded progress to the client's "start from" option shape.
    pub fn to_read_from(&self) -> Option<ReadFrom> {
        match self {
            Checkpoint::Position(position) => position.to_read_from(),
            Checkpoint::Revision(revision) => revision.to_read_from(),
        }
    }

    /// The `$all` variant, if that is what this checkpoint is.
    pub fn as_position(&self) -> Option<&StreamPosition> {
        match self {
            Checkpoint::Position(position) => Some(position),
            Checkpoint::Revision(_) => None,
        }
    }

    /// The named-stream variant, if that is what this checkpoint is.
    pub fn as_revision(&self) -> Option<&StreamRevision> {
        match self {
            Checkpoint::Position(_) => None,
            Checkpoint::Revision(revision) => Some(revision),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_selected_by_stream_name() {
        assert!(Checkpoint::for_stream(ALL_STREAM).as_position().is_some());
        assert!(Checkpoint::for_stream("some-stream").as_revision().is_some());
    }

    #[test]
    fn test_fresh_checkpoint_is_empty() {
        let checkpoint = Checkpoint::for_stream(ALL_STREAM);
        assert!(checkpoint.is_empty());
        assert!(!checkpoint.is_present());
        assert_eq!(checkpoint.to_read_from(), None);
    }
}
