//! Transport adapters and their factory.
//!
//! Exactly one transport is live per bridge instance. The factory
//! validates settings up front so a misconfigured transport is refused
//! at construction instead of failing on first use.

mod pane;
mod pipe;
mod remote;

use conbridge_core::{
    validate_settings, BridgeSettings, SettingsError, Transport, TransportKind,
};

pub use pane::PaneTransport;
pub use pipe::PipeTransport;
pub use remote::RemoteTransport;

/// Build the transport the settings select.
///
/// Validation runs first; every missing-parameter case is fatal here.
pub fn build_transport(
    settings: &BridgeSettings,
) -> Result<Box<dyn Transport>, SettingsError> {
    validate_settings(settings)?;

    match settings.transport {
        TransportKind::Pane => {
            let target = settings
                .pane_target
                .clone()
                .ok_or(SettingsError::MissingPaneTarget)?;
            Ok(Box::new(PaneTransport::new(target)))
        }
        TransportKind::Pipe => Ok(Box::new(PipeTransport::new())),
        TransportKind::Remote => {
            let host = settings
                .remote_host
                .clone()
                .ok_or(SettingsError::MissingRemoteHost)?;
            let secret = settings
                .remote_secret
                .clone()
                .ok_or(SettingsError::MissingRemoteSecret)?;
            Ok(Box::new(RemoteTransport::new(
                host,
                settings.effective_remote_port(),
                secret,
            )))
        }
    }
}
