//! Transport port for command delivery.
//!
//! A transport is one of three interchangeable mechanisms for getting a
//! command string into the game server's console. The port abstracts
//! delivery only; response resolution is the bridge's job (either the
//! transport's native response or a log scan).

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which transport delivers commands to the server.
///
/// Exactly one transport is active per bridge instance, selected by
/// configuration through a factory, never by inheritance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Type the command into a tmux pane.
    Pane,
    /// Write the command to a managed child process' stdin.
    Pipe,
    /// Round-trip the command over the remote command protocol.
    Remote,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pane => write!(f, "pane"),
            Self::Pipe => write!(f, "pipe"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Result of one delivery attempt.
///
/// Adapter-level faults (connection refused, broken pipe, missing tmux
/// session) never escape a transport; they are reported as
/// `delivered = false`.
#[derive(Debug, Clone, Default)]
pub struct SendOutcome {
    /// Whether the transport accepted the command. For the pane
    /// transport this reflects only the shell invocation, never whether
    /// the target program consumed the text.
    pub delivered: bool,
    /// Response payload for transports that answer in-band (remote).
    /// `None` means the caller must resolve via the log.
    pub native_response: Option<String>,
}

impl SendOutcome {
    /// A delivery that produced no in-band response.
    #[must_use]
    pub const fn delivered() -> Self {
        Self {
            delivered: true,
            native_response: None,
        }
    }

    /// A delivery with an in-band response payload.
    #[must_use]
    pub const fn answered(response: String) -> Self {
        Self {
            delivered: true,
            native_response: Some(response),
        }
    }

    /// A failed delivery attempt.
    #[must_use]
    pub const fn failed() -> Self {
        Self {
            delivered: false,
            native_response: None,
        }
    }
}

/// Port for delivering a command to the server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one command. Never errors; faults surface as
    /// `delivered = false`.
    async fn send(&mut self, command: &str) -> SendOutcome;

    /// The tagged kind of this transport.
    fn kind(&self) -> TransportKind;

    /// Whether delivery is unverifiable and a token probe must run
    /// before real commands.
    ///
    /// True for pane injection: the shell invocation succeeding says
    /// nothing about the target program having consumed the text.
    fn needs_probe(&self) -> bool;

    /// Tear down any held resources (child stdin handle, connection).
    ///
    /// Must be called before a different transport is activated so the
    /// old one cannot leak its singleton handle.
    async fn shutdown(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serde_names() {
        assert_eq!(
            serde_json::to_string(&TransportKind::Remote).unwrap(),
            "\"remote\""
        );
        let kind: TransportKind = serde_json::from_str("\"pipe\"").unwrap();
        assert_eq!(kind, TransportKind::Pipe);
    }

    #[test]
    fn test_outcome_constructors() {
        assert!(SendOutcome::delivered().delivered);
        assert!(!SendOutcome::failed().delivered);
        let answered = SendOutcome::answered("pong".to_string());
        assert!(answered.delivered);
        assert_eq!(answered.native_response.as_deref(), Some("pong"));
    }
}
