//! Remote command protocol (RCON-style).
//!
//! Length-prefixed little-endian framing over TCP: `i32` length, `i32`
//! request id, `i32` packet type, ASCII body, two NUL terminators.
//! Type 3 authenticates, type 2 executes; an auth response carrying
//! request id -1 means the secret was rejected.
//!
//! The connection is opened and closed per call. Command frequency is
//! human-driven chat traffic, so the handshake cost is acceptable and
//! nothing can leak across calls; dropping the in-flight future closes
//! the socket the same way.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use conbridge_core::{SendOutcome, Transport, TransportKind};

const TYPE_AUTH: i32 = 3;
const TYPE_EXEC: i32 = 2;
const TYPE_AUTH_RESPONSE: i32 = 2;

const AUTH_REQUEST_ID: i32 = 7;
const EXEC_REQUEST_ID: i32 = 8;

/// Bodies larger than this are not a real server talking our protocol.
const MAX_BODY: usize = 4096;
/// id + type + two NUL terminators.
const PACKET_OVERHEAD: usize = 10;

const IO_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
enum RemoteError {
    #[error("connection failed: {0}")]
    Connect(std::io::Error),

    #[error("i/o failure mid-exchange: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out waiting for the remote endpoint")]
    Timeout,

    #[error("authentication rejected")]
    AuthRejected,

    #[error("malformed packet (length {0})")]
    Malformed(i32),
}

pub struct RemoteTransport {
    host: String,
    port: u16,
    secret: String,
}

impl RemoteTransport {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, secret: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            secret: secret.into(),
        }
    }

    /// Full connect/auth/exec/teardown cycle for one command.
    async fn round_trip(&self, command: &str) -> Result<String, RemoteError> {
        let mut stream = timeout(IO_TIMEOUT, TcpStream::connect((self.host.as_str(), self.port)))
            .await
            .map_err(|_| RemoteError::Timeout)?
            .map_err(RemoteError::Connect)?;

        write_packet(&mut stream, AUTH_REQUEST_ID, TYPE_AUTH, &self.secret).await?;

        // Some servers send an empty response-value packet ahead of
        // the auth response; skip until the auth response arrives.
        loop {
            let (id, ptype, _body) = read_packet(&mut stream).await?;
            if ptype != TYPE_AUTH_RESPONSE {
                continue;
            }
            if id == -1 {
                return Err(RemoteError::AuthRejected);
            }
            if id == AUTH_REQUEST_ID {
                break;
            }
            return Err(RemoteError::Malformed(id));
        }

        write_packet(&mut stream, EXEC_REQUEST_ID, TYPE_EXEC, command).await?;
        let (id, _ptype, body) = read_packet(&mut stream).await?;
        if id != EXEC_REQUEST_ID {
            return Err(RemoteError::Malformed(id));
        }

        let _ = stream.shutdown().await;
        Ok(body)
    }
}

#[async_trait]
impl Transport for RemoteTransport {
    async fn send(&mut self, command: &str) -> SendOutcome {
        match self.round_trip(command).await {
            Ok(response) => {
                debug!(host = %self.host, port = self.port, "remote command answered");
                SendOutcome::answered(response)
            }
            Err(e) => {
                warn!(host = %self.host, port = self.port, error = %e, "remote command failed");
                SendOutcome::failed()
            }
        }
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Remote
    }

    fn needs_probe(&self) -> bool {
        // Auth plus round-trip is its own liveness proof.
        false
    }

    async fn shutdown(&mut self) {
        // Connections are per-call; nothing persists between sends.
    }
}

async fn write_packet(
    stream: &mut TcpStream,
    id: i32,
    ptype: i32,
    body: &str,
) -> Result<(), RemoteError> {
    let len = PACKET_OVERHEAD + body.len();
    let mut packet = Vec::with_capacity(4 + len);
    packet.extend_from_slice(&i32::try_from(len).unwrap_or(i32::MAX).to_le_bytes());
    packet.extend_from_slice(&id.to_le_bytes());
    packet.extend_from_slice(&ptype.to_le_bytes());
    packet.extend_from_slice(body.as_bytes());
    packet.extend_from_slice(&[0, 0]);

    timeout(IO_TIMEOUT, stream.write_all(&packet))
        .await
        .map_err(|_| RemoteError::Timeout)??;
    Ok(())
}

async fn read_packet(stream: &mut TcpStream) -> Result<(i32, i32, String), RemoteError> {
    let mut header = [0u8; 4];
    timeout(IO_TIMEOUT, stream.read_exact(&mut header))
        .await
        .map_err(|_| RemoteError::Timeout)??;
    let len = i32::from_le_bytes(header);

    let payload_len = usize::try_from(len).map_err(|_| RemoteError::Malformed(len))?;
    if !(PACKET_OVERHEAD..=MAX_BODY + PACKET_OVERHEAD).contains(&payload_len) {
        return Err(RemoteError::Malformed(len));
    }

    let mut payload = vec![0u8; payload_len];
    timeout(IO_TIMEOUT, stream.read_exact(&mut payload))
        .await
        .map_err(|_| RemoteError::Timeout)??;

    let id = i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
    let ptype = i32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]);
    let body = String::from_utf8_lossy(&payload[8..payload_len - 2]).into_owned();
    Ok((id, ptype, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connection_refused_is_undelivered() {
        // Port 1 on localhost refuses connections.
        let mut transport = RemoteTransport::new("127.0.0.1", 1, "secret");
        let outcome = transport.send("ping").await;
        assert!(!outcome.delivered);
        assert!(outcome.native_response.is_none());
    }

    #[test]
    fn test_kind_and_probe() {
        let transport = RemoteTransport::new("127.0.0.1", 25575, "secret");
        assert_eq!(transport.kind(), TransportKind::Remote);
        assert!(!transport.needs_probe());
    }
}
