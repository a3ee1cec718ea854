//! Cooperative cancellation shared by every scope derived from a context.
//!
//! A [`Cancellation`] wraps a [`CancellationToken`]. Clones share state, so
//! cancelling any clone is observed by all of them, which is how
//! cancellation of a parent scope reaches every derived call scope and
//! every race branch. [`Cancellation::child`] gives a handle that follows
//! its parent but can be cancelled on its own.
//!
//! # Example
//!
//! ```rust
//! use kairos_core::Cancellation;
//!
//! let parent = Cancellation::new();
//! let branch = parent.clone();
//! let request = parent.child();
//!
//! request.cancel();
//! assert!(!branch.is_cancelled());
//!
//! parent.cancel();
//! assert!(branch.is_cancelled());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// A cloneable, single-fire cancellation flag.
#[derive(Debug, Clone)]
pub struct Cancellation {
    /// Propagates from parent to children
    token: CancellationToken,

    /// Set by the first `cancel` on this handle or its clones
    fired: Arc<AtomicBool>,
}

impl Cancellation {
    /// Creates a cancellation that has not fired.
    #[must_use]
    pub fn new() -> Self {
        Self::from_token(CancellationToken::new())
    }

    fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Derives a cancellation that fires with this one, or on its own.
    ///
    /// Cancelling the child leaves the parent and its other children running.
    #[must_use]
    pub fn child(&self) -> Self {
        Self::from_token(self.token.child_token())
    }

    /// Fires the cancellation.
    ///
    /// Only the first call has an effect; later calls are no-ops.
    /// Returns `true` if this call fired it.
    pub fn cancel(&self) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        let fired = self
            .fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        self.token.cancel();
        fired
    }

    /// Returns `true` once the cancellation has fired, here or in a parent.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when the cancellation fires.
    ///
    /// Completes immediately if it already fired.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_is_not_cancelled() {
        assert!(!Cancellation::new().is_cancelled());
    }

    #[test]
    fn test_cancel_fires_once() {
        let cancel = Cancellation::new();
        assert!(cancel.cancel());
        assert!(!cancel.cancel());
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_clones_share_state() {
        let a = Cancellation::new();
        let b = a.clone();
        b.cancel();
        assert!(a.is_cancelled());
    }

    #[test]
    fn test_parent_cancel_reaches_children() {
        let parent = Cancellation::new();
        let first = parent.child();
        let second = parent.child();

        assert!(first.cancel());
        assert!(first.is_cancelled());
        assert!(!parent.is_cancelled());
        assert!(!second.is_cancelled());

        assert!(parent.cancel());
        assert!(second.is_cancelled());
        assert!(!second.cancel());
    }

    #[test]
    fn test_child_wakes_on_parent_cancel() {
        let parent = Cancellation::new();
        let child = parent.child();
        let mut waiter = tokio_test::task::spawn(child.cancelled());

        tokio_test::assert_pending!(waiter.poll());
        parent.cancel();
        assert!(waiter.is_woken());
        tokio_test::assert_ready!(waiter.poll());
    }

    #[test]
    fn test_cancelled_pending_until_fired() {
        let cancel = Cancellation::new();
        let mut waiter = tokio_test::task::spawn(cancel.cancelled());

        tokio_test::assert_pending!(waiter.poll());
        cancel.cancel();
        assert!(waiter.is_woken());
        tokio_test::assert_ready!(waiter.poll());
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let cancel = Cancellation::new();
        let trigger = cancel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        tokio::time::timeout(Duration::from_secs(1), cancel.cancelled())
            .await
            .expect("cancelled() should complete");
    }

    #[tokio::test]
    async fn test_cancelled_completes_immediately_when_fired() {
        let cancel = Cancellation::new();
        cancel.cancel();

        tokio::time::timeout(Duration::from_millis(10), cancel.cancelled())
            .await
            .expect("cancelled() should complete immediately");
    }
}
