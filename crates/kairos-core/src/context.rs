//! Deadline and cancellation scopes.
//!
//! A [`CallContext`] carries an optional absolute deadline and a shared
//! [`Cancellation`]. Deriving a child with [`CallContext::child`] produces a
//! scope whose deadline is the earlier of the parent's deadline and
//! `now + timeout`. Children share the parent's cancellation, so cancelling
//! the parent reaches every derived scope.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use kairos_core::CallContext;
//!
//! let request = CallContext::new().child(Duration::from_secs(1));
//! let fetch = request.child(Duration::from_millis(200));
//! let persist = request.child(Duration::from_millis(10));
//!
//! assert!(fetch.deadline() <= request.deadline());
//! assert!(persist.deadline() < fetch.deadline());
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::cancel::Cancellation;
use crate::error::{CallError, CallResult};

/// A deadline and cancellation boundary for outbound work.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// When this scope was derived
    started_at: Instant,

    /// Absolute deadline, if any
    deadline: Option<Instant>,

    /// Shared with the parent and every derived scope
    cancellation: Cancellation,
}

impl CallContext {
    /// Creates a root context with no deadline and a fresh cancellation.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cancellation(Cancellation::new())
    }

    /// Creates a root context with no deadline bound to `cancellation`.
    #[must_use]
    pub fn with_cancellation(cancellation: Cancellation) -> Self {
        Self {
            started_at: Instant::now(),
            deadline: None,
            cancellation,
        }
    }

    /// Derives a child scope expiring at `min(parent deadline, now + timeout)`.
    ///
    /// A timeout too large to represent as an instant adds no bound of its
    /// own; the child keeps the parent's deadline, if any.
    #[must_use]
    pub fn child(&self, timeout: Duration) -> Self {
        let now = Instant::now();
        let deadline = match (self.deadline, now.checked_add(timeout)) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (parent, None) => parent,
            (None, own) => own,
        };

        Self {
            started_at: now,
            deadline,
            cancellation: self.cancellation.clone(),
        }
    }

    /// Returns the absolute deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the time left before the deadline, if any.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Returns `true` if the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Returns the cancellation shared by this scope.
    #[must_use]
    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    /// Runs `work` inside this scope.
    ///
    /// Returns [`CallError::Timeout`] when the deadline elapses first and
    /// [`CallError::Cancelled`] when the cancellation fires first. In both
    /// cases `work` is dropped before returning, releasing whatever it held.
    pub async fn run<F>(&self, work: F) -> CallResult<F::Output>
    where
        F: Future,
    {
        if self.cancellation.is_cancelled() {
            return Err(CallError::Cancelled);
        }
        if self.is_expired() {
            return Err(self.timeout_error());
        }

        let cancelled = self.cancellation.cancelled();
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    () = cancelled => Err(CallError::Cancelled),
                    output = work => Ok(output),
                    () = tokio::time::sleep_until(deadline) => Err(self.timeout_error()),
                }
            }
            None => {
                tokio::select! {
                    biased;
                    () = cancelled => Err(CallError::Cancelled),
                    output = work => Ok(output),
                }
            }
        }
    }

    fn timeout_error(&self) -> CallError {
        let budget = self
            .deadline
            .map(|deadline| deadline.saturating_duration_since(self.started_at))
            .unwrap_or_default();
        CallError::Timeout { budget }
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_has_no_deadline() {
        let ctx = CallContext::new();
        assert!(ctx.deadline().is_none());
        assert!(ctx.remaining().is_none());
        assert!(!ctx.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_takes_earlier_deadline() {
        let parent = CallContext::new().child(Duration::from_millis(100));

        let longer = parent.child(Duration::from_secs(5));
        assert_eq!(longer.deadline(), parent.deadline());

        let shorter = parent.child(Duration::from_millis(10));
        assert!(shorter.deadline() < parent.deadline());
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_with_unrepresentable_timeout() {
        let unbounded = CallContext::new().child(Duration::from_secs(u64::MAX));
        assert!(unbounded.deadline().is_none());
        assert!(!unbounded.is_expired());

        let parent = CallContext::new().child(Duration::from_millis(100));
        let bounded = parent.child(Duration::MAX);
        assert_eq!(bounded.deadline(), parent.deadline());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_completes_within_deadline() {
        let ctx = CallContext::new().child(Duration::from_millis(100));
        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                7
            })
            .await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_times_out_at_deadline() {
        let ctx = CallContext::new().child(Duration::from_millis(100));
        let start = Instant::now();

        let result = ctx
            .run(tokio::time::sleep(Duration::from_secs(10)))
            .await;

        assert_eq!(
            result,
            Err(CallError::Timeout {
                budget: Duration::from_millis(100)
            })
        );
        assert_eq!(start.elapsed(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shorter_budget_wins_over_longer_parent() {
        let parent = CallContext::new().child(Duration::from_millis(500));
        let child = parent.child(Duration::from_millis(50));
        let start = Instant::now();

        let result = child.run(tokio::time::sleep(Duration::from_secs(1))).await;

        assert!(result.unwrap_err().is_timeout());
        assert_eq!(start.elapsed(), Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_cancellation_reaches_child() {
        let parent = CallContext::new();
        let child = parent.child(Duration::from_secs(10));
        let trigger = parent.cancellation().clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = child.run(tokio::time::sleep(Duration::from_secs(5))).await;
        assert_eq!(result, Err(CallError::Cancelled));
    }

    #[tokio::test]
    async fn test_run_refuses_when_already_cancelled() {
        let ctx = CallContext::new();
        ctx.cancellation().cancel();
        let result = ctx.run(async { 1 }).await;
        assert_eq!(result, Err(CallError::Cancelled));
    }
}
