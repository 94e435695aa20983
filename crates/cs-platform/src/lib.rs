//! # cs-platform
//!
//! Platform-specific implementations for clipsignal.
//!
//! This crate owns everything that talks to the operating system: the
//! clipboard session backends, the thread-pinned event source, the fan-out
//! dispatcher and the clipboard access operations routed through the event
//! source thread.

pub mod clipboard;
pub mod options;
pub mod runtime;

pub use clipboard::{LocalSessionFactory, MemoryClipboard, MemorySessionFactory};
pub use options::PlatformOptions;
pub use runtime::{AffinityExecutor, ClipboardAccess, EventSource, FanOutDispatcher};
