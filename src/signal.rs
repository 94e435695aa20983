//! The clipboard signal service: one event source, one subscriber registry,
//! one resource lock.

use std::sync::Arc;
use std::time::Duration;

use cs_core::{
    ClipboardError, EventSourceState, ResourceLock, SessionFactory, SignalSink,
    SubscriberRegistry,
};
use cs_platform::{EventSource, LocalSessionFactory, PlatformOptions};
use tracing::info;

use crate::bootstrap::SignalConfig;

/// Clipboard change notifications plus serialized text access.
///
/// Starting a signal spawns its event source thread right away; use
/// [`await_ready`](Self::await_ready) or [`ready`](Self::ready) to learn
/// whether it attached to the OS. Dropping the signal shuts the thread down.
pub struct ClipboardSignal {
    registry: Arc<SubscriberRegistry>,
    source: EventSource,
}

impl ClipboardSignal {
    /// Start against the OS clipboard of this platform.
    pub fn start(config: &SignalConfig) -> Self {
        let options = config.platform_options();
        Self::with_factory(LocalSessionFactory::new(&options), &options)
    }

    /// Start against an injected session backend, sharing the process-wide
    /// resource lock.
    pub fn with_factory<F: SessionFactory>(factory: F, options: &PlatformOptions) -> Self {
        Self::with_lock(factory, options, ResourceLock::global())
    }

    pub fn with_lock<F: SessionFactory>(
        factory: F,
        options: &PlatformOptions,
        lock: ResourceLock,
    ) -> Self {
        let registry = Arc::new(SubscriberRegistry::new());
        info!(
            backend = factory.name(),
            thread = %options.thread_name,
            "starting clipboard signal"
        );
        let source = EventSource::spawn(factory, registry.clone(), lock, &options.thread_name);
        Self { registry, source }
    }

    /// Register `sink` for change notifications. Registering the same
    /// channel again has no effect.
    ///
    /// Delivery never waits: a bounded sink that is full when a change is
    /// dispatched misses that notification.
    pub fn subscribe(&self, sink: impl Into<SignalSink>) {
        self.registry.subscribe(sink);
    }

    /// Stop delivering to `sink`. Unknown sinks are ignored.
    pub fn unsubscribe(&self, sink: impl Into<SignalSink>) {
        self.registry.unsubscribe(sink);
    }

    pub fn is_subscribed(&self, sink: impl Into<SignalSink>) -> bool {
        self.registry.contains(sink)
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    /// Block until the event source is ready or has failed to start.
    ///
    /// Every call, before or after startup resolves, returns the same outcome.
    pub fn await_ready(&self) -> Result<(), ClipboardError> {
        self.source.await_ready()
    }

    pub fn await_ready_timeout(&self, timeout: Duration) -> Option<Result<(), ClipboardError>> {
        self.source.await_ready_timeout(timeout)
    }

    pub async fn ready(&self) -> Result<(), ClipboardError> {
        self.source.ready().await
    }

    /// Read the clipboard text.
    ///
    /// Blocks the calling thread. Async callers can use
    /// [`read_async`](Self::read_async) to keep their worker free.
    pub fn read(&self) -> Result<String, ClipboardError> {
        self.source.read()
    }

    /// Replace the clipboard text.
    ///
    /// Blocks the calling thread. Async callers can use
    /// [`write_async`](Self::write_async) to keep their worker free.
    pub fn write(&self, text: impl Into<String>) -> Result<(), ClipboardError> {
        self.source.write(text)
    }

    pub async fn read_async(&self) -> Result<String, ClipboardError> {
        self.source.read_async().await
    }

    pub async fn write_async(&self, text: impl Into<String>) -> Result<(), ClipboardError> {
        self.source.write_async(text).await
    }

    pub fn state(&self) -> EventSourceState {
        self.source.state()
    }

    /// Name of the session backend, e.g. `"windows"` or `"polling"`.
    pub fn backend(&self) -> &'static str {
        self.source.backend()
    }

    /// Tear the event source down and wait for its thread. Idempotent.
    pub fn shutdown(&self) {
        self.source.shutdown();
    }
}

impl std::fmt::Debug for ClipboardSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipboardSignal")
            .field("backend", &self.backend())
            .field("state", &self.state())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
