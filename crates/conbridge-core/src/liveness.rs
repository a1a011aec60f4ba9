//! Server reachability tracking.
//!
//! The tracker exists to stop callers from hammering a dead server with
//! multi-second probe timeouts: once `Inactive`, sends short-circuit
//! cheaply until an explicit re-check flips the state back.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tri-state server reachability.
///
/// `Unknown` exists because some transports (pane injection after an
/// unconfirmed command) cannot distinguish "server is slow" from
/// "server is dead"; callers may still act on commands in that state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LivenessState {
    /// A recent send was delivered and confirmed.
    Active,
    /// Delivery failed or a liveness probe went unanswered.
    Inactive,
    /// Delivery appeared to succeed but the response never showed up in
    /// the log. Not a hard failure.
    Unknown,
}

impl fmt::Display for LivenessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Tracks reachability across send attempts.
///
/// Mutated only by the bridge, after a probe attempt or a response
/// resolution. Reads are idempotent: two consecutive `current()` calls
/// with no intervening send return the same state.
#[derive(Debug, Clone)]
pub struct LivenessTracker {
    state: LivenessState,
}

impl LivenessTracker {
    /// Start with no knowledge of the server.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: LivenessState::Unknown,
        }
    }

    /// Current reachability.
    #[must_use]
    pub const fn current(&self) -> LivenessState {
        self.state
    }

    /// Whether sends should short-circuit without touching a transport.
    #[must_use]
    pub const fn is_inactive(&self) -> bool {
        matches!(self.state, LivenessState::Inactive)
    }

    /// A send was delivered and its response confirmed.
    pub fn mark_active(&mut self) {
        self.state = LivenessState::Active;
    }

    /// Delivery failed, or a liveness probe found no echo in the log.
    pub fn mark_inactive(&mut self) {
        self.state = LivenessState::Inactive;
    }

    /// Delivery looked fine but the log scan timed out on a transport
    /// that cannot verify delivery. Deliberately not `Inactive`: the
    /// log may simply not have flushed yet.
    pub fn mark_unknown(&mut self) {
        self.state = LivenessState::Unknown;
    }
}

impl Default for LivenessTracker {
    fn default() -> Self {
        Self::new()
    }
}
