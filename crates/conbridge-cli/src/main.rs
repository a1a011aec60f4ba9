//! CLI entry point - the composition root.
//!
//! This is the only place where infrastructure is wired together:
//! settings come from a JSON file, the tracing subscriber is installed
//! once, and every subcommand delegates to the bridge API. Chat-layer
//! concerns (embeds, buttons, backups) live with their own frontends,
//! not here.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use conbridge_core::{validate_settings, BridgeSettings, ScanOutcome, ScanRequest};
use conbridge_runtime::{ConsoleBridge, Disposition, SendOptions};

#[derive(Parser)]
#[command(name = "conbridge", about = "Console bridge for game servers", version)]
struct Cli {
    /// Path to the settings file (JSON).
    #[arg(long, short, env = "CONBRIDGE_CONFIG", default_value = "conbridge.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a command to the server console and print the response.
    Send(SendArgs),
    /// Print the tracked server liveness.
    Status,
    /// Read the server log backward.
    Log(LogArgs),
}

#[derive(Args)]
struct SendArgs {
    /// The command text, as the server console expects it.
    text: String,

    /// Attempt the send even if the server is tracked inactive.
    #[arg(long)]
    force_check: bool,

    /// Skip the liveness probe.
    #[arg(long)]
    skip_check: bool,

    /// Scan the log for this substring instead of the command text.
    #[arg(long = "match", value_name = "SUBSTRING")]
    match_override: Option<String>,
}

#[derive(Args)]
struct LogArgs {
    /// Substring(s) to filter for; omit for a plain tail.
    #[arg(long = "match", value_name = "SUBSTRING")]
    targets: Vec<String>,

    /// How many lines to return.
    #[arg(long, short = 'n', default_value_t = 10)]
    lines: usize,

    /// Print oldest-first instead of newest-first.
    #[arg(long)]
    reversed: bool,

    /// Use the banlist block strategy instead of substring matching.
    #[arg(long, conflicts_with_all = ["targets", "lines"])]
    banlist: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli.config)?;
    tracing::debug!(transport = %settings.transport, "settings loaded");
    let bridge = ConsoleBridge::new(settings).context("failed to construct bridge")?;

    match cli.command {
        Commands::Send(args) => {
            let options = SendOptions {
                force_check: args.force_check,
                skip_check: args.skip_check,
                match_override: args.match_override,
            };
            let outcome = bridge.send_command(&args.text, options).await;
            match outcome.disposition {
                Disposition::Confirmed => {
                    if let Some(line) = outcome.matched_line {
                        println!("{line}");
                    }
                }
                Disposition::SentUnconfirmed => {
                    println!("Command sent; no response surfaced in the log.");
                }
                Disposition::NotSentInactive => {
                    println!("Command not sent: server is unreachable.");
                }
            }
        }
        Commands::Status => {
            println!("{}", bridge.check_status().await);
        }
        Commands::Log(args) => {
            let outcome = if args.banlist {
                bridge.read_banlist().await?
            } else {
                let request = build_log_request(&args, &bridge).await;
                bridge.read_log(&request).await?
            };
            print_outcome(outcome);
        }
    }

    bridge.shutdown().await;
    Ok(())
}

async fn build_log_request(args: &LogArgs, bridge: &ConsoleBridge) -> ScanRequest {
    // The ceiling comes from settings; the CLI only picks what to
    // collect.
    let ceiling = bridge.scan_ceiling().await;
    let mut request = if args.targets.is_empty() {
        ScanRequest::tail(args.lines, ceiling)
    } else {
        ScanRequest::filter(args.targets.clone(), args.lines, ceiling)
    };
    if args.reversed {
        request = request.reversed();
    }
    request
}

fn print_outcome(outcome: ScanOutcome) {
    match outcome {
        ScanOutcome::Match(line) => println!("{line}"),
        ScanOutcome::Matches(lines) => {
            for line in lines {
                println!("{line}");
            }
        }
        ScanOutcome::NotFound => println!("No matching log lines."),
    }
}

fn load_settings(path: &PathBuf) -> anyhow::Result<BridgeSettings> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    let settings: BridgeSettings = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse settings file {}", path.display()))?;
    validate_settings(&settings)?;
    Ok(settings)
}
