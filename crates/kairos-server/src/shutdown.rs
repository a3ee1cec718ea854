//! Termination signal and open-connection accounting for the drain phase.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use kairos_core::Cancellation;
use tokio::sync::Notify;

/// Process-wide, single-fire "begin graceful termination" event.
///
/// Clones share state; triggering any clone is observed by all of them.
///
/// ```rust
/// use kairos_server::ShutdownSignal;
///
/// let signal = ShutdownSignal::new();
/// let server_side = signal.clone();
///
/// signal.trigger();
/// assert!(server_side.is_shutdown());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Cancellation,
}

impl ShutdownSignal {
    /// Creates a signal that has not fired.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the signal. Idempotent.
    pub fn trigger(&self) {
        if self.inner.cancel() {
            tracing::debug!("shutdown signal triggered");
        }
    }

    /// Returns `true` once the signal has fired.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Completes when the signal fires, immediately if it already has.
    pub async fn recv(&self) {
        self.inner.cancelled().await;
    }

    /// Creates a signal that fires on SIGTERM or SIGINT (Ctrl+C elsewhere).
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();

        tokio::spawn(async move {
            if wait_for_os_signal().await {
                trigger.trigger();
            }
        });

        signal
    }
}

/// Waits for an OS shutdown signal.
///
/// Returns `false` if no handler could be registered; the signal then never fires.
async fn wait_for_os_signal() -> bool {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal as unix_signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (unix_signal(SignalKind::terminate()), unix_signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::error!(error = %e, "failed to register signal handlers");
                    return false;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!(signal = "SIGTERM", "termination requested");
            }
            _ = sigint.recv() => {
                tracing::info!(signal = "SIGINT", "termination requested");
            }
        }
        true
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to wait for Ctrl+C");
            return false;
        }
        tracing::info!(signal = "ctrl-c", "termination requested");
        true
    }
}

/// Counts open connections so the drain phase knows when it is done.
///
/// ```rust
/// use kairos_server::ConnectionTracker;
///
/// let open = ConnectionTracker::new();
/// let conn = open.acquire();
/// assert_eq!(open.active_connections(), 1);
///
/// drop(conn);
/// assert_eq!(open.active_connections(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl ConnectionTracker {
    /// Creates a tracker with no connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection; it stays counted until the token is dropped.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionToken {
            tracker: self.clone(),
        }
    }

    /// Number of open connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    fn is_idle(&self) -> bool {
        self.active_connections() == 0
    }

    /// Completes once no connection is open.
    pub async fn wait_for_idle(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a release in between is not missed
            notified.as_mut().enable();

            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

/// An open connection. Dropping it releases the slot in its tracker.
#[derive(Debug)]
pub struct ConnectionToken {
    tracker: ConnectionTracker,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        let previous = self.tracker.active.fetch_sub(1, Ordering::SeqCst);
        if previous == 1 {
            // Last one out wakes the drain
            self.tracker.notify.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_second_trigger_changes_nothing() {
        let signal = ShutdownSignal::new();
        let observer = signal.clone();
        assert!(!observer.is_shutdown());

        signal.trigger();
        signal.trigger();
        assert!(observer.is_shutdown());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recv_waits_for_trigger() {
        let signal = ShutdownSignal::new();
        let trigger = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(25)).await;
            trigger.trigger();
        });

        let start = tokio::time::Instant::now();
        signal.recv().await;
        assert_eq!(start.elapsed(), Duration::from_millis(25));
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_earlier_trigger() {
        let signal = ShutdownSignal::new();
        signal.trigger();

        let late = signal.clone();
        tokio::time::timeout(Duration::from_millis(10), late.recv())
            .await
            .expect("already fired");
    }

    #[tokio::test]
    async fn test_os_listener_stays_quiet_without_a_signal() {
        let signal = ShutdownSignal::with_os_signals();
        tokio::task::yield_now().await;
        assert!(!signal.is_shutdown());
    }

    #[test]
    fn test_tokens_release_on_drop() {
        let open = ConnectionTracker::new();
        let first = open.acquire();
        let second = open.acquire();
        assert_eq!(open.active_connections(), 2);

        drop(second);
        assert!(!open.is_idle());
        drop(first);
        assert!(open.is_idle());
    }

    #[tokio::test]
    async fn test_idle_tracker_drains_at_once() {
        let open = ConnectionTracker::new();
        tokio::time::timeout(Duration::from_millis(10), open.wait_for_idle())
            .await
            .expect("nothing to wait for");
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_completes_with_last_connection() {
        let open = ConnectionTracker::new();
        let short = open.acquire();
        let long = open.acquire();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            drop(short);
            tokio::time::sleep(Duration::from_millis(30)).await;
            drop(long);
        });

        let start = tokio::time::Instant::now();
        open.wait_for_idle().await;
        assert_eq!(start.elapsed(), Duration::from_millis(40));
    }
}
