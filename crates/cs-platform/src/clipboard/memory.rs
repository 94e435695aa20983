//! In-memory clipboard backend
//!
//! A fake clipboard that behaves like an OS clipboard from the event source's
//! point of view: writes raise a change notification, other "applications"
//! can copy text into it, and every failure mode can be scripted.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cs_core::{
    ClipboardError, ClipboardSession, ResourceLock, SessionFactory, SessionWaker, SourceMessage,
};

enum MemoryMessage {
    Update,
    Wake,
    Quit,
    Fail(ClipboardError),
}

#[derive(Default)]
struct MemoryState {
    text: Option<String>,
    attach_error: Option<ClipboardError>,
    read_errors: VecDeque<ClipboardError>,
    write_errors: VecDeque<ClipboardError>,
    listener: Option<Sender<MemoryMessage>>,
    reads: usize,
    writes: usize,
}

/// Shared fake clipboard. Clones observe the same content.
#[derive(Clone, Default)]
pub struct MemoryClipboard {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        let clipboard = Self::new();
        clipboard.state().text = Some(text.into());
        clipboard
    }

    pub fn factory(&self) -> MemorySessionFactory {
        MemorySessionFactory {
            clipboard: self.clone(),
        }
    }

    /// Current content without going through a session.
    pub fn text(&self) -> Option<String> {
        self.state().text.clone()
    }

    /// Simulate another application copying `text`.
    pub fn copy_from_other_app(&self, text: impl Into<String>) {
        let mut state = self.state();
        state.text = Some(text.into());
        Self::post(&state, MemoryMessage::Update);
    }

    /// Raise a change notification without altering the content.
    pub fn touch(&self) {
        Self::post(&self.state(), MemoryMessage::Update);
    }

    /// Drop the text so the next read reports [`ClipboardError::NoText`].
    pub fn clear(&self) {
        self.state().text = None;
    }

    /// Make the next `attach` fail with `err`.
    pub fn fail_attach(&self, err: ClipboardError) {
        self.state().attach_error = Some(err);
    }

    pub fn fail_next_read(&self, err: ClipboardError) {
        self.state().read_errors.push_back(err);
    }

    pub fn fail_next_write(&self, err: ClipboardError) {
        self.state().write_errors.push_back(err);
    }

    /// Make the attached session's blocking wait fail with `err`.
    pub fn fail_retrieval(&self, err: ClipboardError) {
        Self::post(&self.state(), MemoryMessage::Fail(err));
    }

    /// Post a clean teardown message to the attached session.
    pub fn post_quit(&self) {
        Self::post(&self.state(), MemoryMessage::Quit);
    }

    pub fn is_attached(&self) -> bool {
        self.state().listener.is_some()
    }

    /// Number of reads served through a session.
    pub fn reads(&self) -> usize {
        self.state().reads
    }

    /// Number of successful writes through a session.
    pub fn writes(&self) -> usize {
        self.state().writes
    }

    fn post(state: &MemoryState, message: MemoryMessage) {
        if let Some(listener) = &state.listener {
            let _ = listener.send(message);
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct MemorySessionFactory {
    clipboard: MemoryClipboard,
}

impl SessionFactory for MemorySessionFactory {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn attach(&self, _lock: &ResourceLock) -> Result<Box<dyn ClipboardSession>, ClipboardError> {
        let mut state = self.clipboard.state();
        if let Some(err) = state.attach_error.take() {
            return Err(err);
        }

        let (tx, rx) = mpsc::channel();
        state.listener = Some(tx.clone());
        drop(state);

        Ok(Box::new(MemorySession {
            clipboard: self.clipboard.clone(),
            tx,
            rx,
        }))
    }
}

struct MemorySession {
    clipboard: MemoryClipboard,
    tx: Sender<MemoryMessage>,
    rx: Receiver<MemoryMessage>,
}

impl ClipboardSession for MemorySession {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        let mut state = self.clipboard.state();
        state.reads += 1;
        if let Some(err) = state.read_errors.pop_front() {
            return Err(err);
        }
        state.text.clone().ok_or(ClipboardError::NoText)
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut state = self.clipboard.state();
        if let Some(err) = state.write_errors.pop_front() {
            return Err(err);
        }
        state.text = Some(text.to_string());
        state.writes += 1;
        let _ = self.tx.send(MemoryMessage::Update);
        Ok(())
    }

    fn next_message(&mut self) -> Result<SourceMessage, ClipboardError> {
        // The session keeps its own sender alive, so the channel never
        // disconnects while the session exists.
        match self.rx.recv() {
            Ok(MemoryMessage::Update) => Ok(SourceMessage::ClipboardUpdate),
            Ok(MemoryMessage::Wake) => Ok(SourceMessage::Wake),
            Ok(MemoryMessage::Quit) => Ok(SourceMessage::Quit),
            Ok(MemoryMessage::Fail(err)) => Err(err),
            Err(err) => Err(ClipboardError::MessageRetrieval(err.to_string())),
        }
    }

    fn waker(&self) -> Box<dyn SessionWaker> {
        Box::new(MemoryWaker {
            tx: Mutex::new(self.tx.clone()),
        })
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.clipboard.state().listener = None;
    }
}

struct MemoryWaker {
    tx: Mutex<Sender<MemoryMessage>>,
}

impl MemoryWaker {
    fn send(&self, message: MemoryMessage) {
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = tx.send(message);
    }
}

impl SessionWaker for MemoryWaker {
    fn wake(&self) {
        self.send(MemoryMessage::Wake);
    }

    fn shutdown(&self) {
        self.send(MemoryMessage::Quit);
    }
}
