//! Cancellation tokens for fetch tasks
//!
//! Cancellation is cooperative: a cancelled token never interrupts
//! in-flight I/O, it only tells the task not to start and not to deliver.
//! Tasks check at startup and again immediately before delivery.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Clone-shared cancellation flag for one fetch task.
///
/// All clones observe the same state; cancelling is idempotent. The typical
/// flow is binding supersession: rebinding a display slot cancels the token
/// of the task it replaces, and the old task's late result is discarded.
#[derive(Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the non-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the task this token belongs to.
    ///
    /// Idempotent; every clone observes the cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether `cancel()` has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_uncancelled() {
        assert!(!CancellationToken::new().is_cancelled());
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }
}
