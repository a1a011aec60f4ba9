//! Domain types and ports for the conbridge console bridge.
//!
//! This crate is pure domain: settings and their validation, the
//! liveness tri-state, scan request/outcome types, the transport port,
//! and the correlation-token command type. No I/O happens here; the
//! adapters and the bridge itself live in `conbridge-runtime`.
#![deny(unsafe_code)]

pub mod command;
pub mod liveness;
pub mod ports;
pub mod scan;
pub mod settings;

// Re-export commonly used types for convenience
pub use command::Command;
pub use liveness::{LivenessState, LivenessTracker};
pub use ports::{SendOutcome, Transport, TransportKind};
pub use scan::{ScanError, ScanMode, ScanOutcome, ScanRequest};
pub use settings::{
    BridgeSettings, SettingsError, DEFAULT_BUFFER_WAIT_MS, DEFAULT_REMOTE_PORT,
    DEFAULT_SCAN_CEILING, validate_settings,
};
