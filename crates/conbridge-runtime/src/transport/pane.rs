//! tmux pane injection.
//!
//! Types the command into a named session/window/pane via
//! `tmux send-keys` and submits it with an Enter key. The only thing
//! this transport can report is whether the tmux invocation itself
//! succeeded; whether the server consumed the text is unknowable here,
//! which is why the bridge runs a token probe before real commands.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use conbridge_core::{SendOutcome, Transport, TransportKind};

pub struct PaneTransport {
    /// tmux target in `session:window.pane` form.
    target: String,
}

impl PaneTransport {
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// The configured tmux target.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }
}

#[async_trait]
impl Transport for PaneTransport {
    async fn send(&mut self, command: &str) -> SendOutcome {
        // Passing the text as a single argv element sidesteps shell
        // quoting entirely; tmux types it literally.
        let result = Command::new("tmux")
            .args(["send-keys", "-t", &self.target, command, "Enter"])
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => {
                debug!(target = %self.target, "injected command into pane");
                SendOutcome::delivered()
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!(
                    target = %self.target,
                    status = ?output.status.code(),
                    stderr = %stderr.trim(),
                    "tmux send-keys failed"
                );
                SendOutcome::failed()
            }
            Err(e) => {
                warn!(target = %self.target, error = %e, "failed to invoke tmux");
                SendOutcome::failed()
            }
        }
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Pane
    }

    fn needs_probe(&self) -> bool {
        true
    }

    async fn shutdown(&mut self) {
        // The tmux session belongs to the operator; nothing to release.
        debug!(target = %self.target, "pane transport shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_session_reports_undelivered() {
        // No tmux server is running for this target; either tmux exits
        // nonzero or the binary is absent. Both must degrade to a
        // failed outcome, never an error.
        let mut transport = PaneTransport::new("conbridge-test-no-such-session:0.0");
        let outcome = transport.send("say hi").await;
        assert!(!outcome.delivered);
        assert!(outcome.native_response.is_none());
    }

    #[test]
    fn test_kind_and_probe() {
        let transport = PaneTransport::new("srv:0.0");
        assert_eq!(transport.kind(), TransportKind::Pane);
        assert!(transport.needs_probe());
        assert_eq!(transport.target(), "srv:0.0");
    }
}
