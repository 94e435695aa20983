//! Subscriber registry
//!
//! A set of subscriber sinks guarded by one short-lived lock.
//!
//! ## Behavior / 行为
//!
//! - `subscribe` and `unsubscribe` are idempotent and never fail.
//! - Handle identity is channel identity: clones of one sender are the same
//!   subscriber.
//! - `snapshot` copies the members and releases the lock before anyone sends,
//!   so a slow subscriber can never hold up registration calls.
//! - The registry only owns the registration entry. The caller owns the
//!   channel and its receiver.

use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::Notification;

/// A caller-owned channel that can receive [`Notification`]s.
#[derive(Debug, Clone)]
pub enum SignalSink {
    Bounded(mpsc::Sender<Notification>),
    Unbounded(mpsc::UnboundedSender<Notification>),
}

/// Result of a non-blocking delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The sink was full; this subscriber misses the notification.
    Full,
    /// The receiver was dropped without unsubscribing.
    Closed,
}

impl SignalSink {
    /// Whether both handles refer to the same channel.
    pub fn same_sink(&self, other: &SignalSink) -> bool {
        match (self, other) {
            (SignalSink::Bounded(a), SignalSink::Bounded(b)) => a.same_channel(b),
            (SignalSink::Unbounded(a), SignalSink::Unbounded(b)) => a.same_channel(b),
            _ => false,
        }
    }

    /// Hand the notification over without waiting for capacity.
    pub fn try_deliver(&self, notification: &Notification) -> Delivery {
        match self {
            SignalSink::Bounded(tx) => match tx.try_send(notification.clone()) {
                Ok(()) => Delivery::Delivered,
                Err(TrySendError::Full(_)) => Delivery::Full,
                Err(TrySendError::Closed(_)) => Delivery::Closed,
            },
            SignalSink::Unbounded(tx) => match tx.send(notification.clone()) {
                Ok(()) => Delivery::Delivered,
                Err(_) => Delivery::Closed,
            },
        }
    }
}

impl From<mpsc::Sender<Notification>> for SignalSink {
    fn from(tx: mpsc::Sender<Notification>) -> Self {
        SignalSink::Bounded(tx)
    }
}

impl From<&mpsc::Sender<Notification>> for SignalSink {
    fn from(tx: &mpsc::Sender<Notification>) -> Self {
        SignalSink::Bounded(tx.clone())
    }
}

impl From<mpsc::UnboundedSender<Notification>> for SignalSink {
    fn from(tx: mpsc::UnboundedSender<Notification>) -> Self {
        SignalSink::Unbounded(tx)
    }
}

impl From<&mpsc::UnboundedSender<Notification>> for SignalSink {
    fn from(tx: &mpsc::UnboundedSender<Notification>) -> Self {
        SignalSink::Unbounded(tx.clone())
    }
}

#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    members: Mutex<Vec<SignalSink>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `sink` unless the same channel is already registered.
    pub fn subscribe(&self, sink: impl Into<SignalSink>) {
        let sink = sink.into();
        let mut members = self.lock();
        if !members.iter().any(|member| member.same_sink(&sink)) {
            members.push(sink);
        }
    }

    /// Remove `sink` if present. Unknown sinks are ignored.
    pub fn unsubscribe(&self, sink: impl Into<SignalSink>) {
        let sink = sink.into();
        self.lock().retain(|member| !member.same_sink(&sink));
    }

    pub fn contains(&self, sink: impl Into<SignalSink>) -> bool {
        let sink = sink.into();
        self.lock().iter().any(|member| member.same_sink(&sink))
    }

    /// Copy of the current members, taken under the lock and released
    /// before returning.
    pub fn snapshot(&self) -> Vec<SignalSink> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SignalSink>> {
        // Every mutation is a single push/retain, so a poisoned set is still
        // well formed.
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
