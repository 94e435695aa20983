//! Clipboard change notification.

use crate::ClipboardError;

/// One delivered clipboard change.
///
/// A failed read is still a notification: `text` is empty and `error` holds
/// the failure, so subscribers learn that the clipboard changed even when its
/// content could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub error: Option<ClipboardError>,
    /// Position of the change in the source order, starting at 1.
    pub sequence: u64,
    /// Wall clock time of the observation in milliseconds since the epoch.
    pub ts_ms: i64,
}

impl Notification {
    /// Build a notification from the outcome of a clipboard read.
    pub fn from_read(sequence: u64, result: Result<String, ClipboardError>) -> Self {
        let ts_ms = chrono::Utc::now().timestamp_millis();
        match result {
            Ok(text) => Self {
                text,
                error: None,
                sequence,
                ts_ms,
            },
            Err(error) => Self {
                text: String::new(),
                error: Some(error),
                sequence,
                ts_ms,
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
