//! Affinity executor
//!
//! A single-worker job queue whose only worker is the event source thread.
//!
//! Some clipboard handles are bound to the thread that created them, so
//! callers never touch the session directly. They submit a closure; the event
//! source runs it on its own thread between two OS messages and sends the
//! result back through a one-shot channel.
//!
//! ## Behavior / 行为
//!
//! - Jobs submitted before the session is attached wait in the queue and run
//!   once the event source is ready.
//! - After the event source thread exits, pending and new jobs resolve to
//!   [`ClipboardError::EventSourceStopped`].

use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cs_core::{ClipboardError, ClipboardSession, SessionWaker};
use tokio::sync::{mpsc, oneshot};

type Job = Box<dyn FnOnce(&mut dyn ClipboardSession) + Send>;

#[derive(Default)]
struct WakerSlot {
    waker: Option<Box<dyn SessionWaker>>,
    shutdown_requested: bool,
}

#[derive(Default)]
struct Shared {
    slot: Mutex<WakerSlot>,
}

impl Shared {
    fn slot(&self) -> MutexGuard<'_, WakerSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Submitting side. Cheap to clone; every clone feeds the same worker.
#[derive(Clone)]
pub struct AffinityExecutor {
    jobs: mpsc::UnboundedSender<Job>,
    shared: Arc<Shared>,
}

/// Worker side, owned by the event source thread.
pub struct JobQueue {
    jobs: mpsc::UnboundedReceiver<Job>,
    shared: Arc<Shared>,
}

impl AffinityExecutor {
    pub fn channel() -> (AffinityExecutor, JobQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::default());
        (
            AffinityExecutor {
                jobs: tx,
                shared: shared.clone(),
            },
            JobQueue { jobs: rx, shared },
        )
    }

    /// Queue `job` for the worker thread and return the reply channel.
    pub fn submit<R, F>(&self, job: F) -> Result<oneshot::Receiver<R>, ClipboardError>
    where
        F: FnOnce(&mut dyn ClipboardSession) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.enqueue(Box::new(move |session| {
            // The caller may have stopped waiting.
            let _ = reply_tx.send(job(session));
        }))?;
        Ok(reply_rx)
    }

    /// Run `job` on the worker thread and block until it finishes.
    ///
    /// Works from any thread, including async runtime workers. Must not be
    /// called from a job already running on the worker thread.
    pub fn run_blocking<R, F>(&self, job: F) -> Result<R, ClipboardError>
    where
        F: FnOnce(&mut dyn ClipboardSession) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = std_mpsc::sync_channel(1);
        self.enqueue(Box::new(move |session| {
            let _ = reply_tx.send(job(session));
        }))?;
        reply_rx
            .recv()
            .map_err(|_| ClipboardError::EventSourceStopped)
    }

    /// Run `job` on the worker thread without blocking the async runtime.
    pub async fn run<R, F>(&self, job: F) -> Result<R, ClipboardError>
    where
        F: FnOnce(&mut dyn ClipboardSession) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit(job)?
            .await
            .map_err(|_| ClipboardError::EventSourceStopped)
    }

    /// Ask the worker to leave its loop.
    ///
    /// Safe to call before the session exists: the request is remembered and
    /// honoured as soon as the worker installs its waker.
    pub fn request_shutdown(&self) {
        let mut slot = self.shared.slot();
        slot.shutdown_requested = true;
        if let Some(waker) = &slot.waker {
            waker.shutdown();
        }
    }

    fn enqueue(&self, job: Job) -> Result<(), ClipboardError> {
        self.jobs
            .send(job)
            .map_err(|_| ClipboardError::EventSourceStopped)?;

        if let Some(waker) = &self.shared.slot().waker {
            waker.wake();
        }
        Ok(())
    }

    /// The worker has dropped its queue.
    pub fn is_closed(&self) -> bool {
        self.jobs.is_closed()
    }
}

impl JobQueue {
    /// Publish the session waker so submitters can interrupt blocking waits.
    ///
    /// Returns `true` when a shutdown was requested before the waker existed.
    pub fn install_waker(&self, waker: Box<dyn SessionWaker>) -> bool {
        let mut slot = self.shared.slot();
        slot.waker = Some(waker);
        slot.shutdown_requested
    }

    /// Forget the waker once the session is about to go away.
    pub fn clear_waker(&self) {
        self.shared.slot().waker = None;
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shared.slot().shutdown_requested
    }

    /// Run every queued job against `session`. Returns how many ran.
    pub fn drain(&mut self, session: &mut dyn ClipboardSession) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.jobs.try_recv() {
            job(session);
            ran += 1;
        }
        ran
    }
}
