use thiserror::Error;

/// Errors produced by clipboard access and by the event source.
///
/// The type is `Clone` because a failed read during fan-out is delivered to
/// every subscriber as part of the same [`Notification`](crate::Notification).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    /// The clipboard could not be opened (usually held by another process).
    #[error("failed to open clipboard: {0}")]
    Open(String),

    #[error("clipboard holds no text data")]
    NoText,

    #[error("failed to read clipboard content: {0}")]
    Read(String),

    #[error("failed to write clipboard content: {0}")]
    Write(String),

    /// Registration for change notifications could not be created.
    #[error("failed to register for clipboard notifications: {0}")]
    Registration(String),

    /// The blocking message wait itself failed (not a clean teardown).
    #[error("clipboard message retrieval failed: {0}")]
    MessageRetrieval(String),

    /// The event source thread is gone, so routed work cannot run.
    #[error("clipboard event source is not running")]
    EventSourceStopped,
}

impl ClipboardError {
    /// Whether this error came from starting the event source.
    pub fn is_startup(&self) -> bool {
        matches!(self, ClipboardError::Registration(_))
    }
}
