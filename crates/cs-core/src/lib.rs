//! # cs-core
//!
//! Core domain models for clipsignal.
//!
//! This crate contains the pieces that do not touch the operating system:
//! the notification value, the error taxonomy, the subscriber registry, the
//! readiness gate, the event source state machine and the port traits the
//! platform layer implements.

pub mod error;
pub mod gate;
pub mod lock;
pub mod notification;
pub mod ports;
pub mod registry;
pub mod state;

pub use error::ClipboardError;
pub use gate::ReadyGate;
pub use lock::ResourceLock;
pub use notification::Notification;
pub use ports::{ClipboardSession, SessionFactory, SessionWaker, SourceMessage};
pub use registry::{Delivery, SignalSink, SubscriberRegistry};
pub use state::{EventSourceState, StateCell};
