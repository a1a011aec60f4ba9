//! Child-process stdin pipe.
//!
//! Writes commands to the stdin of a server process somebody else
//! spawned. The transport owns at most one writer handle at a time; a
//! send with no handle attached reports `delivered = false`, which the
//! bridge reads as "the managed server isn't running under this
//! transport".

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::process::Child;
use tracing::{debug, warn};

use conbridge_core::{SendOutcome, Transport, TransportKind};

type ConsoleWriter = Box<dyn AsyncWrite + Send + Sync + Unpin>;

#[derive(Default)]
pub struct PipeTransport {
    writer: Option<ConsoleWriter>,
}

impl PipeTransport {
    #[must_use]
    pub fn new() -> Self {
        Self { writer: None }
    }

    /// Take ownership of a spawned server's stdin.
    ///
    /// Returns false if the child was spawned without a piped stdin.
    /// Any previously attached handle is dropped; the transport is a
    /// singleton over one console.
    pub fn attach_child(&mut self, child: &mut Child) -> bool {
        match child.stdin.take() {
            Some(stdin) => {
                self.writer = Some(Box::new(stdin));
                true
            }
            None => false,
        }
    }

    /// Attach an arbitrary writer standing in for a console.
    pub fn attach_writer(&mut self, writer: impl AsyncWrite + Send + Sync + Unpin + 'static) {
        self.writer = Some(Box::new(writer));
    }

    /// Whether a console handle is currently held.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.writer.is_some()
    }
}

#[async_trait]
impl Transport for PipeTransport {
    async fn send(&mut self, command: &str) -> SendOutcome {
        let Some(writer) = self.writer.as_mut() else {
            debug!("no console handle attached, command not sent");
            return SendOutcome::failed();
        };

        // One buffer, one write, immediate flush: the command text is
        // never left half-written if the caller is cancelled between
        // calls.
        let mut line = Vec::with_capacity(command.len() + 1);
        line.extend_from_slice(command.as_bytes());
        line.push(b'\n');

        let result = async {
            writer.write_all(&line).await?;
            writer.flush().await
        }
        .await;

        match result {
            Ok(()) => SendOutcome::delivered(),
            Err(e) => {
                warn!(error = %e, "console pipe write failed, dropping handle");
                // A broken pipe stays broken.
                self.writer = None;
                SendOutcome::failed()
            }
        }
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Pipe
    }

    fn needs_probe(&self) -> bool {
        // Delivery is verifiable: the write either succeeds or fails.
        false
    }

    async fn shutdown(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.shutdown().await {
                debug!(error = %e, "console pipe close reported an error");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_unattached_send_fails() {
        let mut transport = PipeTransport::new();
        assert!(!transport.is_attached());
        let outcome = transport.send("say hi").await;
        assert!(!outcome.delivered);
        assert!(outcome.native_response.is_none());
    }

    #[tokio::test]
    async fn test_send_writes_line_and_flushes() {
        let (client, mut server) = tokio::io::duplex(256);
        let mut transport = PipeTransport::new();
        transport.attach_writer(client);
        assert!(transport.is_attached());

        let outcome = transport.send("list").await;
        assert!(outcome.delivered);
        assert!(outcome.native_response.is_none());

        transport.shutdown().await;
        assert!(!transport.is_attached());

        let mut received = String::new();
        server.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "list\n");
    }

    #[tokio::test]
    async fn test_broken_pipe_drops_handle() {
        let (client, server) = tokio::io::duplex(256);
        drop(server);

        let mut transport = PipeTransport::new();
        transport.attach_writer(client);

        let outcome = transport.send("say hi").await;
        assert!(!outcome.delivered);
        assert!(!transport.is_attached());

        // And subsequent sends keep reporting undelivered.
        let outcome = transport.send("say hi").await;
        assert!(!outcome.delivered);
    }
}
