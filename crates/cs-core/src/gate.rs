//! Initialization gate
//!
//! A settable-once promise that records whether the event source attached to
//! the OS notification mechanism.
//!
//! ## Behavior / 行为
//!
//! - `resolve()` succeeds exactly once; later calls are ignored and report
//!   `false`.
//! - `wait()` blocks the calling thread, `ready().await` suspends the calling
//!   task. Both return immediately once the gate is resolved, and every
//!   waiter observes the same outcome.

use std::sync::{Condvar, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;

use crate::ClipboardError;

#[derive(Debug, Default)]
pub struct ReadyGate {
    outcome: OnceLock<Result<(), ClipboardError>>,
    lock: Mutex<()>,
    cond: Condvar,
    notify: Notify,
}

impl ReadyGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the gate. Returns `false` if it was already resolved.
    pub fn resolve(&self, outcome: Result<(), ClipboardError>) -> bool {
        // Set under the lock so a blocking waiter cannot miss the wakeup
        // between its check and its wait.
        let guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let first = self.outcome.set(outcome).is_ok();
        drop(guard);

        if first {
            self.cond.notify_all();
            self.notify.notify_waiters();
        }
        first
    }

    /// The resolved outcome, if any.
    pub fn outcome(&self) -> Option<Result<(), ClipboardError>> {
        self.outcome.get().cloned()
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome.get().is_some()
    }

    /// Block until the gate resolves.
    pub fn wait(&self) -> Result<(), ClipboardError> {
        let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(outcome) = self.outcome.get() {
                return outcome.clone();
            }
            guard = self
                .cond
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until the gate resolves or `timeout` elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<(), ClipboardError>> {
        let guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (_guard, _) = self
            .cond
            .wait_timeout_while(guard, timeout, |_| self.outcome.get().is_none())
            .unwrap_or_else(PoisonError::into_inner);
        self.outcome()
    }

    /// Wait for the gate without blocking the async runtime.
    pub async fn ready(&self) -> Result<(), ClipboardError> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register interest before checking so a resolve in between is
            // not lost.
            notified.as_mut().enable();

            if let Some(outcome) = self.outcome.get() {
                return outcome.clone();
            }
            notified.await;
        }
    }
}
