//! Change events emitted toward the display layer
//!
//! The reconciler reduces every mutation to a small plan of change events.
//! The display layer applies them to its visible slots; `Reset` means
//! "discard all incremental assumptions and redraw everything".

use std::sync::{Arc, Mutex};

/// One incremental change to the displayed sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Full reset: the entire list contents may have changed
    Reset,

    /// A new item was inserted at this position
    Inserted(usize),

    /// The item at this position was removed
    Removed(usize),

    /// `count` items starting at `start` should be re-rendered
    RangeChanged {
        /// First affected position
        start: usize,
        /// Number of affected positions
        count: usize,
    },

    /// The item at this position changed value (same position, new snapshot)
    ItemChanged(usize),
}

/// Display-layer collaborator receiving change events.
///
/// Implementations must be cheap and must not call back into the reconciler
/// from inside `on_change`; events are emitted outside the sequence lock but
/// re-entrant mutation would still reorder the event stream.
pub trait ChangeListener: Send + Sync {
    /// Handle one change event.
    fn on_change(&self, event: ChangeEvent);
}

/// Fan-out notifier from the reconciler to registered listeners.
///
/// Listeners receive events in registration order. Registration is expected
/// at setup time; the list is behind a mutex only so the notifier can be
/// shared across threads with the reconciler.
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: Mutex<Vec<Arc<dyn ChangeListener>>>,
}

impl ChangeNotifier {
    /// Create a notifier with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn register(&self, listener: Arc<dyn ChangeListener>) {
        self.listeners.lock().unwrap().push(listener);
    }

    /// Emit one event to every registered listener.
    pub fn emit(&self, event: ChangeEvent) {
        let listeners = self.listeners.lock().unwrap().clone();
        for listener in listeners {
            listener.on_change(event);
        }
    }

    /// Emit a whole plan in order.
    pub fn emit_all(&self, events: &[ChangeEvent]) {
        for event in events {
            self.emit(*event);
        }
    }
}

/// Listener that records every event it sees. Test support.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ChangeEvent>>,
}

impl RecordingListener {
    /// Create an empty recording listener.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events.
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Drop all recorded events.
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl ChangeListener for RecordingListener {
    fn on_change(&self, event: ChangeEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_out_preserves_order() {
        let notifier = ChangeNotifier::new();
        let recorder = Arc::new(RecordingListener::new());
        notifier.register(recorder.clone());

        notifier.emit_all(&[
            ChangeEvent::Inserted(0),
            ChangeEvent::RangeChanged { start: 0, count: 1 },
        ]);

        assert_eq!(
            recorder.events(),
            vec![
                ChangeEvent::Inserted(0),
                ChangeEvent::RangeChanged { start: 0, count: 1 },
            ]
        );
    }

    #[test]
    fn test_multiple_listeners_each_receive() {
        let notifier = ChangeNotifier::new();
        let first = Arc::new(RecordingListener::new());
        let second = Arc::new(RecordingListener::new());
        notifier.register(first.clone());
        notifier.register(second.clone());

        notifier.emit(ChangeEvent::Reset);

        assert_eq!(first.events(), vec![ChangeEvent::Reset]);
        assert_eq!(second.events(), vec![ChangeEvent::Reset]);
    }
}
