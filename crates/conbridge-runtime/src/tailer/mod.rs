//! Bounded backward log scanning.
//!
//! The server's log file is append-only, unbounded, and owned by
//! another process; every scan walks it newest-first under a hard
//! ceiling on examined lines and never loads the whole file.

mod rev_reader;
mod strategy;

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncSeek};
use tracing::debug;

use conbridge_core::{ScanError, ScanMode, ScanOutcome, ScanRequest};

use crate::ansi::strip_ansi;

pub use rev_reader::RevLineReader;
pub use strategy::BanlistScan;

/// Run a backward scan over the log file at `path`.
///
/// Finding nothing yields [`ScanOutcome::NotFound`]; only I/O faults
/// are errors.
pub async fn scan(path: impl AsRef<Path>, request: &ScanRequest) -> Result<ScanOutcome, ScanError> {
    let path = path.as_ref();
    let file = File::open(path).await.map_err(|source| ScanError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = RevLineReader::new(file);
    scan_reader(&mut reader, request)
        .await
        .map_err(|source| ScanError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Scan any seekable stream. Split out from [`scan`] so strategies and
/// tests can run against in-memory buffers.
pub async fn scan_reader<R: AsyncRead + AsyncSeek + Unpin>(
    reader: &mut RevLineReader<R>,
    request: &ScanRequest,
) -> std::io::Result<ScanOutcome> {
    let mut examined = 0usize;
    let mut collected: Vec<String> = Vec::new();

    while examined < request.max_lines {
        let Some(raw) = reader.next_line().await? else {
            break;
        };
        examined += 1;

        let line = strip_ansi(&raw).into_owned();
        if line.trim().is_empty() {
            continue;
        }

        match &request.mode {
            ScanMode::First => {
                if matches_any(&line, &request.targets) {
                    debug!(examined, "scan matched");
                    return Ok(ScanOutcome::Match(line));
                }
            }
            ScanMode::Filter { limit, stopgap } => {
                if let Some(stop) = stopgap.as_deref() {
                    if line.contains(stop) {
                        // The stopgap line bounds the scan and is part
                        // of the result.
                        collected.push(line);
                        break;
                    }
                }
                if matches_any(&line, &request.targets) {
                    collected.push(line);
                    if collected.len() >= *limit {
                        break;
                    }
                }
            }
            ScanMode::Tail { lines } => {
                collected.push(line);
                if collected.len() >= *lines {
                    break;
                }
            }
        }
    }

    debug!(examined, collected = collected.len(), "scan finished");
    Ok(finish(collected, request.reverse_output))
}

fn matches_any(line: &str, targets: &[String]) -> bool {
    targets.iter().any(|t| line.contains(t.as_str()))
}

/// Collected lines are newest-first; `reverse_output` flips them to
/// chronological order for display.
pub(crate) fn finish(mut collected: Vec<String>, reverse_output: bool) -> ScanOutcome {
    if collected.is_empty() {
        return ScanOutcome::NotFound;
    }
    if reverse_output {
        collected.reverse();
    }
    ScanOutcome::Matches(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    async fn run(data: &str, request: &ScanRequest) -> ScanOutcome {
        let mut reader = RevLineReader::new(Cursor::new(data.as_bytes().to_vec()));
        scan_reader(&mut reader, request).await.unwrap()
    }

    #[tokio::test]
    async fn test_first_match_is_newest() {
        let log = "old: player joined\nnoise\nnew: player joined\n";
        let outcome = run(log, &ScanRequest::first("player joined", 500)).await;
        assert_eq!(outcome, ScanOutcome::Match("new: player joined".to_string()));
    }

    #[tokio::test]
    async fn test_ceiling_bounds_examination() {
        // Match sits 4 lines from the end; a ceiling of 3 must miss it.
        let log = "target here\nnoise\nnoise\nnoise\n";
        let outcome = run(log, &ScanRequest::first("target", 3)).await;
        assert_eq!(outcome, ScanOutcome::NotFound);

        let outcome = run(log, &ScanRequest::first("target", 4)).await;
        assert!(outcome.is_found());
    }

    #[tokio::test]
    async fn test_blank_lines_skipped_but_examined() {
        let log = "target\n\n\n\n";
        // Three blanks plus the target is four examined lines.
        let outcome = run(log, &ScanRequest::first("target", 3)).await;
        assert_eq!(outcome, ScanOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_filter_collects_until_limit() {
        let log = "hit 1\nmiss\nhit 2\nhit 3\n";
        let outcome = run(log, &ScanRequest::filter(vec!["hit".to_string()], 2, 500)).await;
        assert_eq!(
            outcome,
            ScanOutcome::Matches(vec!["hit 3".to_string(), "hit 2".to_string()])
        );
    }

    #[tokio::test]
    async fn test_stopgap_terminates_and_is_included() {
        let log = "hit old\nSTOP marker\nhit new\n";
        let request =
            ScanRequest::filter(vec!["hit".to_string()], 50, 500).with_stopgap("STOP");
        let outcome = run(log, &request).await;
        assert_eq!(
            outcome,
            ScanOutcome::Matches(vec!["hit new".to_string(), "STOP marker".to_string()])
        );
    }

    #[tokio::test]
    async fn test_reverse_output_is_chronological() {
        let log = "a\nb\nc\n";
        let outcome = run(log, &ScanRequest::tail(3, 500)).await;
        assert_eq!(
            outcome,
            ScanOutcome::Matches(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
    }

    #[tokio::test]
    async fn test_ansi_stripped_before_matching() {
        let log = "\x1b[32mplayer joined\x1b[0m\n";
        let outcome = run(log, &ScanRequest::first("player joined", 500)).await;
        assert_eq!(outcome, ScanOutcome::Match("player joined".to_string()));
    }

    #[tokio::test]
    async fn test_empty_input_not_found() {
        let outcome = run("", &ScanRequest::first("anything", 500)).await;
        assert_eq!(outcome, ScanOutcome::NotFound);
    }
}
