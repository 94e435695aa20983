//! Event source runtime
//!
//! ```text
//! OS clipboard change
//!      ↓
//! EventSource        (pinned thread, blocking retrieval loop)
//!      ↓
//! FanOutDispatcher   (one read via ClipboardAccess, registry snapshot)
//!      ↓
//! try_send to every subscriber sink
//! ```
//!
//! Clipboard reads and writes requested by callers travel the other way:
//! they are queued on the [`AffinityExecutor`] and run on the same pinned
//! thread between OS messages.

pub mod access;
pub mod dispatcher;
pub mod event_source;
pub mod executor;

pub use access::ClipboardAccess;
pub use dispatcher::{DispatchReport, FanOutDispatcher};
pub use event_source::EventSource;
pub use executor::{AffinityExecutor, JobQueue};
