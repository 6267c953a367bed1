//! Commit/prepare position tracking for the `$all` stream.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::client::{ReadFrom, StreamMessage};
use crate::error::BoxError;

/// Hook invoked after every applied position update, in registration order.
pub type PositionHook = Arc<dyn Fn(&StreamPosition) -> Result<(), BoxError> + Send + Sync>;

/// The recorded commit/prepare pair. Both fields are written together; a
/// half-updated position can never be observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub commit_position: u64,
    pub prepare_position: u64,
}

/// Progress marker for a subscription to the `$all` stream.
///
/// Updated only by the owning subscription's worker; read concurrently by
/// whoever persists or inspects it. Hook execution shares the worker thread
/// with the message pump, so per-subscription updates are strictly sequential.
#[derive(Default)]
pub struct StreamPosition {
    value: Mutex<Option<Position>>,
    hooks: Mutex<Vec<PositionHook>>,
}

impl StreamPosition {
    /// Creates an empty position with no hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies position data carried by `message`, then runs the hooks.
    ///
    /// Checkpoint markers and event records both carry positions on the
    /// `$all` stream; a marker present on the message wins. Confirmations and
    /// unknown messages change nothing and return `Ok(false)`.
    ///
    /// The value is written before any hook runs, so a failing hook leaves
    /// the position up to date; the first hook error propagates to the
    /// caller.
    pub fn update(&self, message: &StreamMessage) -> Result<bool, BoxError> {
        let source = match message {
            StreamMessage::Checkpoint {
                commit_position,
                prepare_position,
            } => Some((*commit_position, *prepare_position)),
            StreamMessage::Event(event) => Some((event.commit_position, event.prepare_position)),
            StreamMessage::Confirmation(_) | StreamMessage::Other => None,
        };
        let Some((commit_position, prepare_position)) = source else {
            return Ok(false);
        };

        *lock(&self.value) = Some(Position {
            commit_position,
            prepare_position,
        });

        let hooks: Vec<PositionHook> = lock(&self.hooks).clone();
        for hook in hooks {
            hook(self)?;
        }
        Ok(true)
    }

    /// Appends a hook run after every applied update. There is no removal
    /// API; do not register in a loop.
    pub fn register_update_hook<F>(&self, hook: F)
    where
        F: Fn(&StreamPosition) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        lock(&self.hooks).push(Arc::new(hook));
    }

    /// The current value, if any update has been applied.
    pub fn get(&self) -> Option<Position> {
        *lock(&self.value)
    }

    /// True if no position has been recorded.
    pub fn is_empty(&self) -> bool {
        self.get().is_none()
    }

    /// True if a position has been recorded.
    pub fn is_present(&self) -> bool {
        !self.is_empty()
    }

    /// Maps the recorded position to the client's "start from" option shape.
    pub fn to_read_from(&self) -> Option<ReadFrom> {
        self.get().map(|position| ReadFrom::Position {
            commit_position: position.commit_position,
            prepare_position: position.prepare_position,
        })
    }
}

impl std::fmt::Debug for StreamPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamPosition")
            .field("value", &self.get())
            .field("hooks", &lock(&self.hooks).len())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::client::RecordedEvent;

    fn event(commit: u64, prepare: u64) -> StreamMessage {
        StreamMessage::Event(RecordedEvent {
            id: "e-1".into(),
            stream_name: "$all".into(),
            event_type: "tested".into(),
            stream_revision: 7,
            commit_position: commit,
            prepare_position: prepare,
            data: vec![],
            metadata: vec![],
        })
    }

    #[test]
    fn test_update_from_checkpoint_marker() {
        let position = StreamPosition::new();
        let updated = position
            .update(&StreamMessage::Checkpoint {
                commit_position: 1023,
                prepare_position: 0,
            })
            .unwrap();
        assert!(updated);
        assert_eq!(
            position.get(),
            Some(Position {
                commit_position: 1023,
                prepare_position: 0
            })
        );
    }

    #[test]
    fn test_update_from_event_record() {
        let position = StreamPosition::new();
        assert!(position.update(&event(42, 40)).unwrap());
        assert!(position.is_present());
    }

    #[test]
    fn test_ignores_messages_without_positions() {
        let position = StreamPosition::new();
        assert!(!position
            .update(&StreamMessage::Confirmation("sub-1".into()))
            .unwrap());
        assert!(!position.update(&StreamMessage::Other).unwrap());
        assert!(position.is_empty());
    }

    #[test]
    fn test_hooks_run_in_registration_order() {
        let position = StreamPosition::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let order = Arc::clone(&order);
            position.register_update_hook(move |_| {
                order.lock().unwrap().push(tag);
                Ok(())
            });
        }
        position.update(&event(1, 0)).unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_hook_sees_updated_value_exactly_once() {
        let position = StreamPosition::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        position.register_update_hook(move |p| {
            seen.fetch_add(1, Ordering::SeqCst);
            assert_eq!(p.get().unwrap().commit_position, 1023);
            Ok(())
        });
        position
            .update(&StreamMessage::Checkpoint {
                commit_position: 1023,
                prepare_position: 0,
            })
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_hook_failure_propagates_after_value_is_written() {
        let position = StreamPosition::new();
        position.register_update_hook(|_| Err("sink offline".into()));
        let err = position.update(&event(5, 4)).unwrap_err();
        assert_eq!(err.to_string(), "sink offline");
        assert_eq!(position.get().unwrap().commit_position, 5);
    }

    #[test]
    fn test_to_read_from_shape() {
        let position = StreamPosition::new();
        assert_eq!(position.to_read_from(), None);
        position
            .update(&StreamMessage::Checkpoint {
                commit_position: 1,
                prepare_position: 0,
            })
            .unwrap();
        assert_eq!(
            position.to_read_from(),
            Some(ReadFrom::Position {
                commit_position: 1,
                prepare_position: 0
            })
        );
    }
}
