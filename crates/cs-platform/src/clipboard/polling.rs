//! Polling clipboard backend (macOS, Linux)
//!
//! `clipboard-rs` gives portable text access but no blocking change
//! notification we can interleave with our own job queue, so this backend
//! samples the clipboard text on an interval and reports a change when its
//! content hash differs from the last observation.
//!
//! The sampling wait doubles as the wakeup channel: a wake or shutdown
//! request ends the wait immediately instead of after the next tick.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use clipboard_rs::{Clipboard, ClipboardContext, ContentFormat};
use cs_core::{
    ClipboardError, ClipboardSession, ResourceLock, SessionFactory, SessionWaker, SourceMessage,
};
use twox_hash::xxh3::hash64;

use crate::PlatformOptions;

enum Control {
    Wake,
    Quit,
}

pub struct PollingSessionFactory {
    poll_interval: Duration,
}

impl PollingSessionFactory {
    pub fn new(options: &PlatformOptions) -> Self {
        Self {
            poll_interval: options.poll_interval,
        }
    }
}

impl SessionFactory for PollingSessionFactory {
    fn name(&self) -> &'static str {
        "polling"
    }

    fn attach(&self, lock: &ResourceLock) -> Result<Box<dyn ClipboardSession>, ClipboardError> {
        let ctx = ClipboardContext::new()
            .map_err(|e| ClipboardError::Registration(format!("clipboard context: {e}")))?;
        let (tx, rx) = mpsc::channel();

        // Baseline so the content present at startup is not reported.
        let baseline = sample(&ctx, lock);
        let session = PollingSession {
            ctx,
            lock: lock.clone(),
            tx,
            rx,
            detector: ChangeDetector::new(baseline, Instant::now(), self.poll_interval),
        };

        tracing::debug!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "polling clipboard session attached"
        );
        Ok(Box::new(session))
    }
}

/// Decides when to sample next and whether a sample is a change.
#[derive(Debug)]
struct ChangeDetector {
    interval: Duration,
    last_hash: Option<u64>,
    next_sample: Instant,
}

impl ChangeDetector {
    fn new(baseline: Option<u64>, now: Instant, interval: Duration) -> Self {
        Self {
            interval,
            last_hash: baseline,
            next_sample: now + interval,
        }
    }

    /// Time left before the next sample is due. Zero once it is overdue.
    fn wait(&self, now: Instant) -> Duration {
        self.next_sample.saturating_duration_since(now)
    }

    /// Record a sample taken at `now`. Returns `true` when the content changed.
    fn observe(&mut self, now: Instant, hash: Option<u64>) -> bool {
        self.next_sample = now + self.interval;
        if hash == self.last_hash {
            return false;
        }
        self.last_hash = hash;
        true
    }
}

fn content_hash(text: &str) -> u64 {
    hash64(text.as_bytes())
}

/// Hash of the current text, `None` when there is no readable text.
fn sample(ctx: &ClipboardContext, lock: &ResourceLock) -> Option<u64> {
    let text = lock.with(|| ctx.get_text().ok())?;
    Some(content_hash(&text))
}

struct PollingSession {
    ctx: ClipboardContext,
    lock: ResourceLock,
    tx: Sender<Control>,
    rx: Receiver<Control>,
    detector: ChangeDetector,
}

impl ClipboardSession for PollingSession {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        if !self.ctx.has(ContentFormat::Text) {
            return Err(ClipboardError::NoText);
        }
        self.ctx
            .get_text()
            .map_err(|e| ClipboardError::Read(e.to_string()))
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.ctx
            .clear()
            .map_err(|e| ClipboardError::Write(format!("clear: {e}")))?;
        self.ctx
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }

    fn next_message(&mut self) -> Result<SourceMessage, ClipboardError> {
        loop {
            // Wakeups must not push the next sample further out.
            let wait = self.detector.wait(Instant::now());
            match self.rx.recv_timeout(wait) {
                Ok(Control::Wake) => return Ok(SourceMessage::Wake),
                Ok(Control::Quit) => return Ok(SourceMessage::Quit),
                Err(RecvTimeoutError::Timeout) => {
                    let now = Instant::now();
                    let hash = sample(&self.ctx, &self.lock);
                    if self.detector.observe(now, hash) {
                        return Ok(SourceMessage::ClipboardUpdate);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(ClipboardError::MessageRetrieval(
                        "control channel disconnected".to_string(),
                    ));
                }
            }
        }
    }

    fn waker(&self) -> Box<dyn SessionWaker> {
        Box::new(PollingWaker {
            tx: Mutex::new(self.tx.clone()),
        })
    }
}

struct PollingWaker {
    tx: Mutex<Sender<Control>>,
}

impl SessionWaker for PollingWaker {
    fn wake(&self) {
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = tx.send(Control::Wake);
    }

    fn shutdown(&self) {
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = tx.send(Control::Quit);
    }
}
