//! Clipboard access API
//!
//! Text read/write against a session, each wrapped in the resource lock.
//! `ClipboardAccess` runs on the event source thread: the fan-out dispatcher
//! calls it directly, and callers on other threads reach it through the
//! [`AffinityExecutor`](super::AffinityExecutor).

use cs_core::{ClipboardError, ClipboardSession, ResourceLock};
use tracing::trace;

use super::AffinityExecutor;

#[derive(Debug, Clone)]
pub struct ClipboardAccess {
    lock: ResourceLock,
}

impl ClipboardAccess {
    pub fn new(lock: ResourceLock) -> Self {
        Self { lock }
    }

    pub fn lock(&self) -> &ResourceLock {
        &self.lock
    }

    pub fn read(&self, session: &mut dyn ClipboardSession) -> Result<String, ClipboardError> {
        let _guard = self.lock.acquire();
        let result = session.read_text();
        trace!(ok = result.is_ok(), "clipboard read");
        result
    }

    pub fn write(
        &self,
        session: &mut dyn ClipboardSession,
        text: &str,
    ) -> Result<(), ClipboardError> {
        let _guard = self.lock.acquire();
        let result = session.write_text(text);
        trace!(ok = result.is_ok(), chars = text.chars().count(), "clipboard write");
        result
    }

    /// Read from any thread by routing the call through `executor`.
    ///
    /// Blocks the caller; see [`AffinityExecutor::run_blocking`].
    pub fn read_via(&self, executor: &AffinityExecutor) -> Result<String, ClipboardError> {
        let access = self.clone();
        executor.run_blocking(move |session| access.read(session))?
    }

    /// Write from any thread by routing the call through `executor`.
    ///
    /// Blocks the caller; see [`AffinityExecutor::run_blocking`].
    pub fn write_via(&self, executor: &AffinityExecutor, text: String) -> Result<(), ClipboardError> {
        let access = self.clone();
        executor.run_blocking(move |session| access.write(session, &text))?
    }

    pub async fn read_async(&self, executor: &AffinityExecutor) -> Result<String, ClipboardError> {
        let access = self.clone();
        executor.run(move |session| access.read(session)).await?
    }

    pub async fn write_async(
        &self,
        executor: &AffinityExecutor,
        text: String,
    ) -> Result<(), ClipboardError> {
        let access = self.clone();
        executor
            .run(move |session| access.write(session, &text))
            .await?
    }
}
