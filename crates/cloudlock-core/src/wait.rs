//! Waiting for a held lock to be released
//!
//! A blocking acquire that finds the lock taken polls the backend until the
//! object disappears. The loop is bounded by a [`WaitPolicy`] and can be
//! interrupted through a [`CancelToken`]; both are checked only while
//! sleeping between polls, never in the middle of a backend call.

use std::{future, sync::Arc, time::Duration};

use tokio::{sync::watch, time::Instant};
use tracing::{debug, info, warn};

use crate::{backend::StorageBackend, config::WaitConfig, LockName};

// ═══════════════════════════════════════════════════════════════════════════
// WAIT POLICY
// ═══════════════════════════════════════════════════════════════════════════

/// How long and how often a blocking acquire polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Delay between two polls, never less than [`MIN_POLL_INTERVAL`] in effect
    pub poll_interval: Duration,
    /// Total time to wait before giving up; `None` waits forever, as does a
    /// duration too large to add to the current instant
    pub max_wait: Option<Duration>,
}

/// Shortest delay between two polls, whatever the policy asks for
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

impl WaitPolicy {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

    /// Set the delay between polls, raised to [`MIN_POLL_INTERVAL`] if shorter
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        self
    }

    #[must_use]
    pub const fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            max_wait: None,
        }
    }
}

impl From<&WaitConfig> for WaitPolicy {
    fn from(config: &WaitConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_wait: config.timeout_secs.map(Duration::from_secs),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// CANCELLATION
// ═══════════════════════════════════════════════════════════════════════════

/// Create a connected cancel handle and token
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (
        CancelHandle { tx: Arc::new(tx) },
        CancelToken { rx: Some(rx) },
    )
}

/// Sending side of a cancellation signal
///
/// Cancelling is sticky: once set, every token observes it. Dropping the
/// handle without cancelling leaves the tokens un-cancelled forever.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Receiving side of a cancellation signal
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelToken {
    /// A token that is never cancelled
    pub const fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolve once cancellation is requested
    pub async fn cancelled(&mut self) {
        let Some(rx) = self.rx.as_mut() else {
            return future::pending().await;
        };
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Handle dropped without cancelling
                return future::pending().await;
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// POLL LOOP
// ═══════════════════════════════════════════════════════════════════════════

/// How a wait for release ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitResult {
    /// A poll found the lock object gone
    Released,
    /// `max_wait` elapsed with the lock still present
    TimedOut { waited: Duration },
    /// The cancel token fired while sleeping
    Cancelled,
}

/// Poll `name` until it is absent, the policy deadline passes, or `cancel` fires.
///
/// The first poll happens one interval after the call. Read failures are
/// logged and the loop keeps polling. The last sleep is shortened so that a
/// final poll lands exactly on the deadline.
pub(crate) async fn wait_for_release(
    backend: &dyn StorageBackend,
    name: &LockName,
    policy: &WaitPolicy,
    cancel: &mut CancelToken,
) -> WaitResult {
    let started = Instant::now();
    // A deadline past the clock's range is no deadline at all
    let deadline = policy
        .max_wait
        .and_then(|max_wait| started.checked_add(max_wait));
    let poll_interval = policy.poll_interval.max(MIN_POLL_INTERVAL);
    let mut attempt: u64 = 0;

    info!(lock = %name, "Waiting for lock to be released");
    loop {
        let sleep_for = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return WaitResult::TimedOut {
                        waited: now - started,
                    };
                }
                poll_interval.min(deadline - now)
            }
            None => poll_interval,
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!(lock = %name, "Wait cancelled");
                return WaitResult::Cancelled;
            }
            () = tokio::time::sleep(sleep_for) => {}
        }

        attempt += 1;
        match backend.read(name).await {
            Ok(None) => {
                info!(lock = %name, attempt, "Lock released");
                return WaitResult::Released;
            }
            Ok(Some(held)) => {
                info!(
                    lock = %name,
                    holder = %String::from_utf8_lossy(&held.payload),
                    "Lock still held"
                );
            }
            Err(e) => {
                warn!(lock = %name, attempt, error = %e, "Failed to poll lock - will retry");
            }
        }
        debug!(lock = %name, attempt, "Poll complete");
    }
}
