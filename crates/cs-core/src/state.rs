//! Event source lifecycle state.
//!
//! ```text
//! Uninitialized ──► Initializing ──► Ready ──► Terminated
//!       │                 │
//!       └────────────────►└──────► Failed
//! ```
//!
//! Transitions only move forward. `Failed` and `Terminated` are final.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventSourceState {
    Uninitialized = 0,
    Initializing = 1,
    Ready = 2,
    Failed = 3,
    Terminated = 4,
}

impl EventSourceState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => EventSourceState::Uninitialized,
            1 => EventSourceState::Initializing,
            2 => EventSourceState::Ready,
            3 => EventSourceState::Failed,
            _ => EventSourceState::Terminated,
        }
    }

    /// Whether `self -> next` is a legal forward step.
    pub fn can_transition_to(self, next: EventSourceState) -> bool {
        use EventSourceState::*;
        matches!(
            (self, next),
            (Uninitialized, Initializing)
                | (Uninitialized, Failed)
                | (Initializing, Ready)
                | (Initializing, Failed)
                | (Ready, Terminated)
        )
    }

    /// Startup has resolved one way or the other.
    pub fn is_resolved(self) -> bool {
        !matches!(
            self,
            EventSourceState::Uninitialized | EventSourceState::Initializing
        )
    }

    pub fn is_final(self) -> bool {
        matches!(self, EventSourceState::Failed | EventSourceState::Terminated)
    }
}

impl fmt::Display for EventSourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventSourceState::Uninitialized => "uninitialized",
            EventSourceState::Initializing => "initializing",
            EventSourceState::Ready => "ready",
            EventSourceState::Failed => "failed",
            EventSourceState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Lock-free holder for the current [`EventSourceState`].
#[derive(Debug)]
pub struct StateCell {
    raw: AtomicU8,
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

impl StateCell {
    pub fn new() -> Self {
        Self {
            raw: AtomicU8::new(EventSourceState::Uninitialized as u8),
        }
    }

    pub fn get(&self) -> EventSourceState {
        EventSourceState::from_u8(self.raw.load(Ordering::Acquire))
    }

    /// Move to `next` if the current state allows it.
    ///
    /// Returns the state that was replaced, or `Err` with the current state
    /// when the step would go backwards or skip the lifecycle.
    pub fn advance(&self, next: EventSourceState) -> Result<EventSourceState, EventSourceState> {
        let mut current = self.raw.load(Ordering::Acquire);
        loop {
            let state = EventSourceState::from_u8(current);
            if !state.can_transition_to(next) {
                return Err(state);
            }
            match self.raw.compare_exchange_weak(
                current,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(from = %state, to = %next, "event source state changed");
                    return Ok(state);
                }
                Err(actual) => current = actual,
            }
        }
    }
}
