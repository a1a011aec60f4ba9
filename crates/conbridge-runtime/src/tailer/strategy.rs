//! Domain-specific scan strategies.
//!
//! The generic scanner matches substrings; some console commands print
//! a block of output whose shape is known in advance and is cheaper to
//! walk with a dedicated strategy than to approximate with filters.
//! Strategies are selected explicitly by the caller, never inferred
//! from match-string content.

use std::io;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncSeek};
use tracing::debug;

use conbridge_core::{ScanError, ScanOutcome};

use super::rev_reader::RevLineReader;
use crate::ansi::strip_ansi;

/// Scan for the output block of a `banlist` command.
///
/// The block has two line classes: a `There are N ban(s)` summary and
/// one `was banned by` line per entry. Walking newest-first, the
/// strategy collects entry lines and stops exactly at the summary line
/// (which is included), so a block from an earlier `banlist` run can
/// never bleed into the result. Output is chronological: the
/// concatenation reads as the console printed it.
#[derive(Debug, Clone)]
pub struct BanlistScan {
    /// Hard ceiling on examined lines, same contract as the generic
    /// scanner.
    pub max_lines: usize,
}

impl BanlistScan {
    /// Substring marking one ban entry.
    pub const ENTRY_MARKER: &'static str = "was banned by";
    /// Substring marking the block summary line.
    pub const SUMMARY_MARKER: &'static str = "There are";

    #[must_use]
    pub const fn new(max_lines: usize) -> Self {
        Self { max_lines }
    }

    /// Run the strategy against the log file at `path`.
    pub async fn scan(&self, path: impl AsRef<Path>) -> Result<ScanOutcome, ScanError> {
        let path = path.as_ref();
        let file = File::open(path).await.map_err(|source| ScanError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = RevLineReader::new(file);
        self.scan_reader(&mut reader)
            .await
            .map_err(|source| ScanError::Read {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Strategy core over any seekable stream.
    pub async fn scan_reader<R: AsyncRead + AsyncSeek + Unpin>(
        &self,
        reader: &mut RevLineReader<R>,
    ) -> io::Result<ScanOutcome> {
        let mut examined = 0usize;
        let mut collected: Vec<String> = Vec::new();

        while examined < self.max_lines {
            let Some(raw) = reader.next_line().await? else {
                break;
            };
            examined += 1;

            let line = strip_ansi(&raw).into_owned();
            if line.trim().is_empty() {
                continue;
            }

            if line.contains(Self::SUMMARY_MARKER) {
                collected.push(line);
                break;
            }
            if line.contains(Self::ENTRY_MARKER) {
                collected.push(line);
            }
            // Anything else is unrelated console traffic between the
            // block and the end of the file; keep walking.
        }

        debug!(examined, collected = collected.len(), "banlist scan finished");
        Ok(super::finish(collected, true))
    }
}
