//! Bridge settings and validation.
//!
//! These are pure domain types with no infrastructure dependencies.
//! The settings object is supplied read-only at bridge construction
//! (or reselection) time; persistence belongs to the caller.

use serde::{Deserialize, Serialize};

use crate::ports::TransportKind;

/// Default hard ceiling on lines examined per log scan.
pub const DEFAULT_SCAN_CEILING: usize = 500;

/// Default buffer wait between sending a command and scanning the log,
/// in milliseconds.
pub const DEFAULT_BUFFER_WAIT_MS: u64 = 1000;

/// Default port for the remote command protocol.
pub const DEFAULT_REMOTE_PORT: u16 = 25575;

/// Placeholder substituted with the correlation token in the probe
/// command template.
pub const TOKEN_PLACEHOLDER: &str = "{token}";

/// Read-only configuration for one bridge instance.
///
/// Most fields are optional to support partial config files and
/// graceful defaults; [`validate_settings`] enforces that the fields
/// the selected transport actually needs are present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BridgeSettings {
    /// Which transport delivers commands to the server.
    pub transport: TransportKind,

    /// tmux target for the pane transport (e.g. `minecraft:0.0`).
    pub pane_target: Option<String>,

    /// Remote host for the remote command transport.
    pub remote_host: Option<String>,

    /// Remote port for the remote command transport.
    pub remote_port: Option<u16>,

    /// Shared secret for remote command authentication.
    pub remote_secret: Option<String>,

    /// Path to the server's append-only log file.
    pub log_path: Option<String>,

    /// Hard ceiling on lines examined per scan.
    pub scan_ceiling: Option<usize>,

    /// Wait between send and log scan, in milliseconds.
    pub buffer_wait_ms: Option<u64>,

    /// Low-impact command used for liveness probes. Must contain the
    /// `{token}` placeholder so the probe's effect can be located in
    /// the log.
    pub probe_command: Option<String>,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            transport: TransportKind::Pane,
            pane_target: None,
            remote_host: None,
            remote_port: None,
            remote_secret: None,
            log_path: None,
            scan_ceiling: None,
            buffer_wait_ms: None,
            probe_command: None,
        }
    }
}

impl BridgeSettings {
    /// Get the effective scan ceiling (with default fallback).
    #[must_use]
    pub fn effective_scan_ceiling(&self) -> usize {
        self.scan_ceiling.unwrap_or(DEFAULT_SCAN_CEILING)
    }

    /// Get the effective buffer wait (with default fallback).
    #[must_use]
    pub fn effective_buffer_wait_ms(&self) -> u64 {
        self.buffer_wait_ms.unwrap_or(DEFAULT_BUFFER_WAIT_MS)
    }

    /// Get the effective remote port (with default fallback).
    #[must_use]
    pub fn effective_remote_port(&self) -> u16 {
        self.remote_port.unwrap_or(DEFAULT_REMOTE_PORT)
    }

    /// Render the probe command for a correlation token.
    #[must_use]
    pub fn probe_command_for(&self, token: &str) -> String {
        self.probe_command
            .as_deref()
            .unwrap_or("say {token}")
            .replace(TOKEN_PLACEHOLDER, token)
    }
}

/// Settings validation error.
///
/// Every variant is fatal at construction time: the bridge refuses to
/// activate a misconfigured transport rather than fail on first use.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Pane transport requires a tmux target (pane_target)")]
    MissingPaneTarget,

    #[error("Remote transport requires a host (remote_host)")]
    MissingRemoteHost,

    #[error("Remote transport requires a secret (remote_secret)")]
    MissingRemoteSecret,

    #[error("Transport {0} resolves responses via the log file; log_path is required")]
    MissingLogPath(TransportKind),

    #[error("Scan ceiling must be at least 1")]
    InvalidScanCeiling,

    #[error("Buffer wait must be at least 1ms")]
    InvalidBufferWait,

    #[error("Probe command must contain the {{token}} placeholder, got {0:?}")]
    InvalidProbeCommand(String),
}

/// Validate settings for the selected transport.
pub fn validate_settings(settings: &BridgeSettings) -> Result<(), SettingsError> {
    match settings.transport {
        TransportKind::Pane => {
            if settings
                .pane_target
                .as_ref()
                .is_none_or(|t| t.trim().is_empty())
            {
                return Err(SettingsError::MissingPaneTarget);
            }
        }
        TransportKind::Remote => {
            if settings
                .remote_host
                .as_ref()
                .is_none_or(|h| h.trim().is_empty())
            {
                return Err(SettingsError::MissingRemoteHost);
            }
            if settings
                .remote_secret
                .as_ref()
                .is_none_or(|s| s.is_empty())
            {
                return Err(SettingsError::MissingRemoteSecret);
            }
        }
        TransportKind::Pipe => {}
    }

    // The remote transport answers in-band; everything else reads the log.
    if settings.transport != TransportKind::Remote
        && settings
            .log_path
            .as_ref()
            .is_none_or(|p| p.trim().is_empty())
    {
        return Err(SettingsError::MissingLogPath(settings.transport));
    }

    if settings.scan_ceiling == Some(0) {
        return Err(SettingsError::InvalidScanCeiling);
    }

    if settings.buffer_wait_ms == Some(0) {
        return Err(SettingsError::InvalidBufferWait);
    }

    if let Some(probe) = settings.probe_command.as_deref() {
        if !probe.contains(TOKEN_PLACEHOLDER) {
            return Err(SettingsError::InvalidProbeCommand(probe.to_string()));
        }
    }

    Ok(())
}
