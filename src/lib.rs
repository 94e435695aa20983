//! # clipsignal
//!
//! Watches the system clipboard and fans change notifications out to any
//! number of subscriber channels, while offering text read/write that is
//! safe to call from any thread.
//!
//! ```text
//! ┌──────────────┐  change   ┌──────────────────┐  try_send  ┌────────────┐
//! │ OS clipboard │ ────────▶ │ event source     │ ─────────▶ │ subscriber │
//! └──────────────┘           │ (pinned thread)  │            │ channels   │
//!        ▲                   └──────────────────┘            └────────────┘
//!        │  read / write jobs        ▲
//!        └───────────────────────────┘◀── read() / write() from any thread
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! # async fn demo() -> Result<(), clipsignal::ClipboardError> {
//! let (tx, mut rx) = tokio::sync::mpsc::channel::<clipsignal::Notification>(8);
//! clipsignal::global().ready().await?;
//! clipsignal::subscribe(&tx);
//! clipsignal::global().write_async("hello").await?;
//! if let Some(n) = rx.recv().await {
//!     println!("clipboard now holds {:?}", n.text);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The free functions operate on a lazily started process-wide instance.
//! Build a [`ClipboardSignal`] directly for an injected backend or a custom
//! configuration.

use std::sync::OnceLock;

pub mod bootstrap;
pub mod signal;

pub use bootstrap::{load_config, LoggingConfig, SignalConfig};
pub use cs_core::{ClipboardError, EventSourceState, Notification, SignalSink};
pub use cs_platform::{MemoryClipboard, PlatformOptions};
pub use signal::ClipboardSignal;

static GLOBAL: OnceLock<ClipboardSignal> = OnceLock::new();

/// The process-wide signal, started with default configuration on first use.
pub fn global() -> &'static ClipboardSignal {
    init_global(&SignalConfig::default())
}

/// Start the process-wide signal with `config`.
///
/// Only the first call (or the first [`global`]) starts anything; later
/// calls return the running instance and ignore `config`.
pub fn init_global(config: &SignalConfig) -> &'static ClipboardSignal {
    GLOBAL.get_or_init(|| ClipboardSignal::start(config))
}

/// Register `sink` with the process-wide signal.
pub fn subscribe(sink: impl Into<SignalSink>) {
    global().subscribe(sink);
}

/// Deregister `sink` from the process-wide signal.
pub fn unsubscribe(sink: impl Into<SignalSink>) {
    global().unsubscribe(sink);
}

/// Block until the process-wide event source has started or failed.
pub fn await_ready() -> Result<(), ClipboardError> {
    global().await_ready()
}

/// Read the clipboard text through the process-wide signal.
pub fn read() -> Result<String, ClipboardError> {
    global().read()
}

/// Replace the clipboard text through the process-wide signal.
pub fn write(text: impl Into<String>) -> Result<(), ClipboardError> {
    global().write(text)
}
