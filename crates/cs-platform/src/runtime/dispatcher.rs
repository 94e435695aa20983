//! Fan-out dispatcher
//!
//! Invoked by the event source once per clipboard change, on the event source
//! thread. It reads the clipboard once, snapshots the registry and offers the
//! resulting notification to every subscriber with a non-blocking send.
//!
//! Delivery is best effort and at most once: a full sink misses this
//! notification, a dropped receiver is skipped. Nothing here ever waits for a
//! subscriber, because the event source thread also serves every queued
//! clipboard read and write.

use std::sync::Arc;

use cs_core::{ClipboardSession, Delivery, Notification, SubscriberRegistry};
use tracing::{debug, trace};

use super::ClipboardAccess;

/// Outcome of one dispatch, mostly for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchReport {
    pub sequence: u64,
    pub delivered: usize,
    pub full: usize,
    pub closed: usize,
}

pub struct FanOutDispatcher {
    registry: Arc<SubscriberRegistry>,
    access: ClipboardAccess,
    sequence: u64,
}

impl FanOutDispatcher {
    pub fn new(registry: Arc<SubscriberRegistry>, access: ClipboardAccess) -> Self {
        Self {
            registry,
            access,
            sequence: 0,
        }
    }

    /// Number of changes dispatched so far.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn dispatch(&mut self, session: &mut dyn ClipboardSession) -> DispatchReport {
        self.sequence += 1;
        let notification = Notification::from_read(self.sequence, self.access.read(session));
        self.deliver(&notification)
    }

    /// Offer an already built notification to the current subscribers.
    pub fn deliver(&self, notification: &Notification) -> DispatchReport {
        let mut report = DispatchReport {
            sequence: notification.sequence,
            ..DispatchReport::default()
        };

        for sink in self.registry.snapshot() {
            match sink.try_deliver(notification) {
                Delivery::Delivered => report.delivered += 1,
                Delivery::Full => {
                    trace!(sequence = notification.sequence, "subscriber full, notification dropped");
                    report.full += 1;
                }
                Delivery::Closed => report.closed += 1,
            }
        }

        debug!(
            sequence = report.sequence,
            ok = notification.is_ok(),
            delivered = report.delivered,
            full = report.full,
            closed = report.closed,
            "clipboard change dispatched"
        );
        report
    }
}
