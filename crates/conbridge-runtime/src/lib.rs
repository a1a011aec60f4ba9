//! Console bridge runtime.
//!
//! Everything that touches the outside world lives here: the backward
//! log tailer, the three transport adapters (tmux pane injection,
//! child-process stdin pipe, remote command protocol), and the
//! [`ConsoleBridge`] orchestrator that ties them to the liveness
//! tracker from `conbridge-core`.
#![deny(unsafe_code)]

pub mod ansi;
pub mod bridge;
pub mod tailer;
pub mod transport;

pub use ansi::strip_ansi;
pub use bridge::{BridgeError, CommandOutcome, ConsoleBridge, Disposition, SendOptions};
pub use tailer::{scan, BanlistScan};
pub use transport::{build_transport, PaneTransport, PipeTransport, RemoteTransport};
