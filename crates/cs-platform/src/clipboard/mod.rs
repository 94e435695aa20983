//! Clipboard session backends.
//!
//! `LocalSessionFactory` resolves to the backend for the compiled target.
//! `MemorySessionFactory` is available everywhere for tests and headless
//! hosts.

pub mod memory;
#[cfg(not(windows))]
pub mod polling;
#[cfg(windows)]
pub mod windows;

pub use memory::{MemoryClipboard, MemorySessionFactory};

// Windows exports
#[cfg(windows)]
pub use windows::WindowsSessionFactory as LocalSessionFactory;

// macOS / Linux exports
#[cfg(not(windows))]
pub use polling::PollingSessionFactory as LocalSessionFactory;
