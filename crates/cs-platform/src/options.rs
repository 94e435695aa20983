use std::time::Duration;

/// Tunables for the OS backends and the event source thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformOptions {
    /// Name of the dedicated event source thread.
    pub thread_name: String,
    /// How often the polling backend samples the clipboard.
    pub poll_interval: Duration,
    /// Window class of the hidden message-only window (Windows).
    pub window_class: String,
    /// How many times to try opening a busy clipboard (Windows).
    pub open_attempts: u32,
    /// Pause between open attempts (Windows).
    pub open_retry_delay: Duration,
}

impl Default for PlatformOptions {
    fn default() -> Self {
        Self {
            thread_name: "clipsignal-event-source".to_string(),
            poll_interval: Duration::from_millis(500),
            window_class: "Button".to_string(),
            open_attempts: 5,
            open_retry_delay: Duration::from_millis(10),
        }
    }
}
