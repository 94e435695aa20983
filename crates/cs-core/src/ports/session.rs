use crate::{ClipboardError, ResourceLock};

/// What one blocking retrieval from the OS produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMessage {
    /// The clipboard content changed.
    ClipboardUpdate,
    /// A [`SessionWaker::wake`] interrupted the wait; queued work is pending.
    Wake,
    /// Clean teardown was requested (e.g. `WM_QUIT`).
    Quit,
}

/// Creates a session on the thread that will own it.
///
/// `attach` is the registration step: on success the session is listening for
/// clipboard changes. It is always invoked on the event source thread, so
/// the session itself does not need to be `Send`.
pub trait SessionFactory: Send + 'static {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    fn attach(&self, lock: &ResourceLock) -> Result<Box<dyn ClipboardSession>, ClipboardError>;
}

/// A live, thread-affine connection to the clipboard.
///
/// Dropping the session deregisters it from change notifications.
pub trait ClipboardSession {
    /// Open the clipboard, extract its text and close it again.
    fn read_text(&mut self) -> Result<String, ClipboardError>;

    /// Open the clipboard, clear it, store `text` and close it again.
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;

    /// Block until the next message for this session.
    ///
    /// Messages that are neither clipboard updates, wakeups nor teardown are
    /// handled internally and do not return.
    fn next_message(&mut self) -> Result<SourceMessage, ClipboardError>;

    /// A handle that can interrupt [`next_message`](Self::next_message) from
    /// any thread.
    fn waker(&self) -> Box<dyn SessionWaker>;
}

/// Cross-thread handle to a blocked session.
pub trait SessionWaker: Send + Sync {
    /// Make a pending or future `next_message` return [`SourceMessage::Wake`].
    fn wake(&self);

    /// Make a pending or future `next_message` return [`SourceMessage::Quit`].
    fn shutdown(&self);
}
