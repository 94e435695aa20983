//! Event source
//!
//! The long-lived, thread-pinned half of the system.
//!
//! ## Lifecycle / 生命周期
//!
//! 1. A dedicated thread is spawned and moves the state to `Initializing`.
//! 2. The session factory attaches on that thread (registration).
//!    - failure: state `Failed`, gate resolved with the error, thread exits.
//!    - success: state `Ready`, gate resolved with `Ok(())`.
//! 3. The retrieval loop runs queued jobs, then blocks on the next OS
//!    message. Clipboard updates are dispatched synchronously; wakeups just
//!    loop; a quit message ends the loop.
//! 4. A retrieval error is logged and also ends the loop. There is no
//!    restart: the state becomes `Terminated` and stays there.
//!
//! The thread owns the session for its whole life, so thread-affine OS
//! handles are only ever touched from one thread.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cs_core::{
    ClipboardError, ClipboardSession, EventSourceState, ReadyGate, ResourceLock, SessionFactory,
    SourceMessage, StateCell, SubscriberRegistry,
};
use tracing::{debug, error, info, warn};

use super::{AffinityExecutor, ClipboardAccess, FanOutDispatcher, JobQueue};

pub struct EventSource {
    backend: &'static str,
    state: Arc<StateCell>,
    gate: Arc<ReadyGate>,
    executor: AffinityExecutor,
    access: ClipboardAccess,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl EventSource {
    /// Spawn the event source thread and start attaching in the background.
    ///
    /// Never fails directly: if even the thread cannot be spawned, the state
    /// becomes `Failed` and the gate reports the error.
    pub fn spawn<F>(
        factory: F,
        registry: Arc<SubscriberRegistry>,
        lock: ResourceLock,
        thread_name: &str,
    ) -> Self
    where
        F: SessionFactory,
    {
        let backend = factory.name();
        let state = Arc::new(StateCell::new());
        let gate = Arc::new(ReadyGate::new());
        let (executor, queue) = AffinityExecutor::channel();
        let access = ClipboardAccess::new(lock);

        let worker = Worker {
            backend,
            factory,
            state: state.clone(),
            gate: gate.clone(),
            queue,
            dispatcher: FanOutDispatcher::new(registry, access.clone()),
            access: access.clone(),
        };

        let thread = match thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || worker.run())
        {
            Ok(handle) => Some(handle),
            Err(err) => {
                let _ = state.advance(EventSourceState::Failed);
                let err = ClipboardError::Registration(format!("spawn event source thread: {err}"));
                error!(backend, error = %err, "clipboard event source failed to start");
                gate.resolve(Err(err));
                None
            }
        };

        Self {
            backend,
            state,
            gate,
            executor,
            access,
            thread: Mutex::new(thread),
        }
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }

    pub fn state(&self) -> EventSourceState {
        self.state.get()
    }

    pub fn gate(&self) -> &ReadyGate {
        &self.gate
    }

    pub fn executor(&self) -> &AffinityExecutor {
        &self.executor
    }

    /// Block until startup resolves.
    pub fn await_ready(&self) -> Result<(), ClipboardError> {
        self.gate.wait()
    }

    /// Block until startup resolves or `timeout` elapses.
    pub fn await_ready_timeout(&self, timeout: Duration) -> Option<Result<(), ClipboardError>> {
        self.gate.wait_timeout(timeout)
    }

    pub async fn ready(&self) -> Result<(), ClipboardError> {
        self.gate.ready().await
    }

    /// Read the clipboard text on the event source thread.
    pub fn read(&self) -> Result<String, ClipboardError> {
        self.access.read_via(&self.executor)
    }

    /// Replace the clipboard text on the event source thread.
    pub fn write(&self, text: impl Into<String>) -> Result<(), ClipboardError> {
        self.access.write_via(&self.executor, text.into())
    }

    pub async fn read_async(&self) -> Result<String, ClipboardError> {
        self.access.read_async(&self.executor).await
    }

    pub async fn write_async(&self, text: impl Into<String>) -> Result<(), ClipboardError> {
        self.access.write_async(&self.executor, text.into()).await
    }

    /// Request a clean teardown and wait for the thread to exit.
    ///
    /// Idempotent. Called from the event source thread itself it only posts
    /// the request.
    pub fn shutdown(&self) {
        self.executor.request_shutdown();

        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                warn!(backend = self.backend, "clipboard event source thread panicked");
            }
        }
    }
}

impl Drop for EventSource {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Worker<F> {
    backend: &'static str,
    factory: F,
    state: Arc<StateCell>,
    gate: Arc<ReadyGate>,
    queue: JobQueue,
    dispatcher: FanOutDispatcher,
    access: ClipboardAccess,
}

impl<F> Worker<F>
where
    F: SessionFactory,
{
    fn run(mut self) {
        let backend = self.backend;
        let _ = self.state.advance(EventSourceState::Initializing);

        let mut session = match self.factory.attach(self.access.lock()) {
            Ok(session) => session,
            Err(err) => {
                // Waiters see every attach failure as a registration failure.
                let err = if err.is_startup() {
                    err
                } else {
                    ClipboardError::Registration(err.to_string())
                };
                let _ = self.state.advance(EventSourceState::Failed);
                error!(backend, error = %err, "clipboard event source failed to start");
                self.gate.resolve(Err(err));
                return;
            }
        };

        let shutdown_early = self.queue.install_waker(session.waker());
        if shutdown_early {
            debug!(backend, "shutdown requested during startup");
        }
        let _ = self.state.advance(EventSourceState::Ready);
        self.gate.resolve(Ok(()));
        info!(backend, "clipboard event source ready");

        let exit = if shutdown_early {
            Ok(())
        } else {
            self.pump(session.as_mut())
        };

        match exit {
            Ok(()) => {
                // Finish what callers queued before the teardown request.
                self.queue.drain(session.as_mut());
                info!(backend, "clipboard event source received quit");
            }
            Err(err) => {
                error!(backend, error = %err, "clipboard message retrieval failed, event source stopped");
            }
        }

        // Release the OS registration and reject further jobs before the
        // terminal state becomes observable.
        self.queue.clear_waker();
        drop(session);
        let dispatched = self.dispatcher.sequence();
        drop(self.queue);
        let _ = self.state.advance(EventSourceState::Terminated);
        debug!(backend, dispatched, "clipboard event source thread exiting");
    }

    fn pump(&mut self, session: &mut dyn ClipboardSession) -> Result<(), ClipboardError> {
        loop {
            self.queue.drain(session);
            if self.queue.shutdown_requested() {
                return Ok(());
            }

            match session.next_message()? {
                SourceMessage::ClipboardUpdate => {
                    self.dispatcher.dispatch(session);
                }
                SourceMessage::Wake => {}
                SourceMessage::Quit => return Ok(()),
            }
        }
    }
}
