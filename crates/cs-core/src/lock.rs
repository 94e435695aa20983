//! Clipboard resource lock.
//!
//! Every open/use/close sequence against the OS clipboard runs while holding
//! this lock, so at most one clipboard operation is in flight.
//!
//! ## Iron Rule / 铁律
//!
//! > **Hold the lock for one clipboard operation, never while waiting for the next OS message.**
//! > **锁只覆盖一次剪贴板操作，等待下一条系统消息时绝不持有。**

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

#[derive(Debug, Clone, Default)]
pub struct ResourceLock {
    inner: Arc<Mutex<()>>,
}

/// Held for the duration of one clipboard operation.
pub type ResourceGuard<'a> = MutexGuard<'a, ()>;

impl ResourceLock {
    /// A lock private to its clones. Useful for tests and fake clipboards.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide lock shared by every handle to the real clipboard.
    pub fn global() -> Self {
        static GLOBAL: OnceLock<ResourceLock> = OnceLock::new();
        GLOBAL.get_or_init(ResourceLock::new).clone()
    }

    pub fn acquire(&self) -> ResourceGuard<'_> {
        // The guarded value is `()`, so a panic while holding the lock
        // leaves nothing inconsistent behind.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` while holding the lock.
    pub fn with<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.acquire();
        f()
    }

    pub fn same_lock(&self, other: &ResourceLock) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
