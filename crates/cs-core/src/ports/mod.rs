//! Port interfaces implemented by the platform layer
//!
//! The event source only knows these traits. Each OS backend (and the
//! in-memory fake used by tests) provides a [`SessionFactory`] that attaches
//! to the clipboard on the event source thread.

mod session;

pub use session::{ClipboardSession, SessionFactory, SessionWaker, SourceMessage};
