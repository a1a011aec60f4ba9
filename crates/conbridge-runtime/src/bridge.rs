//! The console bridge.
//!
//! Orchestrates one transport, the log tailer, and the liveness
//! tracker: gate on known-dead servers, optionally probe with a
//! correlation token, send, then resolve the response in-band or via a
//! bounded backward log scan.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use conbridge_core::{
    command::generate_token, BridgeSettings, Command, LivenessState, LivenessTracker, ScanError,
    ScanOutcome, ScanRequest, SendOutcome, SettingsError, Transport,
};

use crate::tailer::{self, BanlistScan};
use crate::transport::build_transport;

/// Bridge construction / reselection failure.
///
/// Everything here is fatal before any command is attempted; per-send
/// failures are never errors, they degrade to a [`Disposition`].
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("No log file configured for this transport")]
    NoLogPath,
}

/// Per-send options.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Attempt the send even when the server is tracked `Inactive`.
    pub force_check: bool,
    /// Skip the liveness probe on transports that would run one.
    pub skip_check: bool,
    /// Scan the log for this substring instead of the command text.
    pub match_override: Option<String>,
}

/// What happened to one command, as a caller-facing tri-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Delivered, and a response was resolved.
    Confirmed,
    /// Delivered as far as the transport can tell, but no response
    /// surfaced within the buffer window.
    SentUnconfirmed,
    /// Never sent: the server is tracked inactive, the probe failed,
    /// or delivery itself failed.
    NotSentInactive,
}

/// Result of [`ConsoleBridge::send_command`].
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub disposition: Disposition,
    /// The resolved response line, in-band or from the log.
    pub matched_line: Option<String>,
    /// The probe's correlation token, surfaced so multi-step callers
    /// can anchor a follow-up scan to the same probe.
    pub correlation_token: Option<String>,
}

impl CommandOutcome {
    fn not_sent(correlation_token: Option<String>) -> Self {
        Self {
            disposition: Disposition::NotSentInactive,
            matched_line: None,
            correlation_token,
        }
    }

    fn unconfirmed(correlation_token: Option<String>) -> Self {
        Self {
            disposition: Disposition::SentUnconfirmed,
            matched_line: None,
            correlation_token,
        }
    }

    fn confirmed(line: String, correlation_token: Option<String>) -> Self {
        Self {
            disposition: Disposition::Confirmed,
            matched_line: Some(line),
            correlation_token,
        }
    }
}

struct BridgeInner {
    settings: BridgeSettings,
    transport: Box<dyn Transport>,
    liveness: LivenessTracker,
}

/// One bridge instance: one transport, one liveness state, one log.
///
/// `send_command` holds an internal single-slot lock across the full
/// send-and-resolve cycle, so concurrent callers queue instead of
/// interleaving their probe tokens and buffer waits.
pub struct ConsoleBridge {
    inner: Mutex<BridgeInner>,
}

impl ConsoleBridge {
    /// Build a bridge from validated settings.
    pub fn new(settings: BridgeSettings) -> Result<Self, BridgeError> {
        let transport = build_transport(&settings)?;
        Ok(Self::with_transport(settings, transport))
    }

    /// Build a bridge around an externally constructed transport.
    ///
    /// The embedding layer uses this to hand over a pipe transport that
    /// already holds a spawned server's stdin.
    #[must_use]
    pub fn with_transport(settings: BridgeSettings, transport: Box<dyn Transport>) -> Self {
        Self {
            inner: Mutex::new(BridgeInner {
                settings,
                transport,
                liveness: LivenessTracker::new(),
            }),
        }
    }

    /// Current reachability. Reads are idempotent; only send attempts
    /// move the state.
    pub async fn check_status(&self) -> LivenessState {
        self.inner.lock().await.liveness.current()
    }

    /// The effective per-scan line ceiling from the active settings.
    pub async fn scan_ceiling(&self) -> usize {
        self.inner.lock().await.settings.effective_scan_ceiling()
    }

    /// Send one command and resolve its response.
    pub async fn send_command(&self, text: &str, options: SendOptions) -> CommandOutcome {
        let mut inner = self.inner.lock().await;

        // 1. Liveness gate: don't hammer a server we know is dead.
        if inner.liveness.is_inactive() && !options.force_check {
            debug!(command = %text, "server tracked inactive, short-circuiting");
            return CommandOutcome::not_sent(None);
        }

        // 2. Probe transports that can't verify delivery.
        let command = if inner.transport.needs_probe() && !options.skip_check {
            match probe(&mut inner).await {
                Some(token) => Command::correlated(text, token),
                None => {
                    inner.liveness.mark_inactive();
                    info!(command = %text, "liveness probe failed, command not sent");
                    return CommandOutcome::not_sent(None);
                }
            }
        } else {
            Command::new(text)
        };
        let token = command.token().map(str::to_string);

        // 3. Send the real command.
        let outcome = inner.transport.send(command.text()).await;
        if !outcome.delivered {
            inner.liveness.mark_inactive();
            return CommandOutcome::not_sent(token);
        }

        // 4. Resolve the response.
        if let Some(response) = outcome.native_response {
            inner.liveness.mark_active();
            return CommandOutcome::confirmed(response, token);
        }

        sleep(buffer_wait(&inner.settings)).await;

        let target = options
            .match_override
            .clone()
            .unwrap_or_else(|| text.to_string());
        let request = ScanRequest::first(target, inner.settings.effective_scan_ceiling());

        match scan_log(&inner.settings, &request).await {
            Ok(ScanOutcome::Match(line)) => {
                inner.liveness.mark_active();
                CommandOutcome::confirmed(line, token)
            }
            Ok(_) => {
                // Delivered but unconfirmed. The log may simply not
                // have flushed; Unknown, not Inactive.
                inner.liveness.mark_unknown();
                CommandOutcome::unconfirmed(token)
            }
            Err(e) => {
                warn!(error = %e, "response scan failed");
                inner.liveness.mark_unknown();
                CommandOutcome::unconfirmed(token)
            }
        }
    }

    /// Run a caller-specified scan against the configured log file.
    pub async fn read_log(&self, request: &ScanRequest) -> Result<ScanOutcome, BridgeError> {
        let inner = self.inner.lock().await;
        scan_log(&inner.settings, request).await
    }

    /// Run the banlist block strategy against the configured log file.
    pub async fn read_banlist(&self) -> Result<ScanOutcome, BridgeError> {
        let inner = self.inner.lock().await;
        let path = log_path(&inner.settings)?;
        let strategy = BanlistScan::new(inner.settings.effective_scan_ceiling());
        Ok(strategy.scan(path).await?)
    }

    /// Swap to a different server profile.
    ///
    /// The new transport is built (and the settings validated) before
    /// the old one is torn down, so a bad profile leaves the bridge on
    /// its current transport. Liveness resets to `Unknown`: knowledge
    /// about the old server says nothing about the new one.
    pub async fn select_transport(&self, settings: BridgeSettings) -> Result<(), BridgeError> {
        let transport = build_transport(&settings)?;
        let mut inner = self.inner.lock().await;
        inner.transport.shutdown().await;
        inner.transport = transport;
        inner.settings = settings;
        inner.liveness = LivenessTracker::new();
        info!(transport = %inner.transport.kind(), "transport reselected");
        Ok(())
    }

    /// Tear down the active transport's resources.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        inner.transport.shutdown().await;
    }
}

/// Inject a correlation token, wait out the buffer, and look for its
/// echo. Returns the token on success.
async fn probe(inner: &mut BridgeInner) -> Option<String> {
    let token = generate_token();
    let probe_command = inner.settings.probe_command_for(&token);

    let outcome: SendOutcome = inner.transport.send(&probe_command).await;
    if !outcome.delivered {
        return None;
    }

    sleep(buffer_wait(&inner.settings)).await;

    let request = ScanRequest::first(token.clone(), inner.settings.effective_scan_ceiling());
    match scan_log(&inner.settings, &request).await {
        Ok(outcome) if outcome.is_found() => {
            debug!(%token, "probe token located in log");
            Some(token)
        }
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "probe scan failed");
            None
        }
    }
}

async fn scan_log(
    settings: &BridgeSettings,
    request: &ScanRequest,
) -> Result<ScanOutcome, BridgeError> {
    let path = log_path(settings)?;
    Ok(tailer::scan(path, request).await?)
}

fn log_path(settings: &BridgeSettings) -> Result<&str, BridgeError> {
    settings.log_path.as_deref().ok_or(BridgeError::NoLogPath)
}

fn buffer_wait(settings: &BridgeSettings) -> Duration {
    Duration::from_millis(settings.effective_buffer_wait_ms())
}
