//! Log scan request and outcome types.
//!
//! A scan walks the server's log file backward (newest line first)
//! under a hard ceiling on examined lines. Finding nothing is a
//! designed outcome, not an error; [`ScanError`] covers I/O only.

use std::path::PathBuf;

/// How matches are collected during a backward scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanMode {
    /// Stop at the first line containing any target substring.
    First,
    /// Collect every line containing a target substring, until `limit`
    /// matches are held or a stopgap substring is seen. The stopgap
    /// line itself is included, bounding scans whose exact line count
    /// is unpredictable.
    Filter {
        limit: usize,
        stopgap: Option<String>,
    },
    /// Plain tail: collect the newest `lines` non-blank lines with no
    /// matching at all.
    Tail { lines: usize },
}

/// Parameters for one backward scan.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Substrings to look for. A line matches if it contains any of
    /// them. Ignored in `Tail` mode.
    pub targets: Vec<String>,
    /// Hard ceiling on lines examined, regardless of file size.
    pub max_lines: usize,
    /// Collection mode.
    pub mode: ScanMode,
    /// Flip accumulated lines so the oldest examined line reads first.
    /// Purely a display concern; scanning always reads newest-first.
    pub reverse_output: bool,
}

impl ScanRequest {
    /// Single-match scan for one target substring.
    #[must_use]
    pub fn first(target: impl Into<String>, max_lines: usize) -> Self {
        Self {
            targets: vec![target.into()],
            max_lines,
            mode: ScanMode::First,
            reverse_output: false,
        }
    }

    /// Plain tail of the newest `lines` lines, in chronological order.
    #[must_use]
    pub fn tail(lines: usize, max_lines: usize) -> Self {
        Self {
            targets: Vec::new(),
            max_lines,
            mode: ScanMode::Tail { lines },
            reverse_output: true,
        }
    }

    /// Filter scan collecting up to `limit` matching lines.
    #[must_use]
    pub fn filter(targets: Vec<String>, limit: usize, max_lines: usize) -> Self {
        Self {
            targets,
            max_lines,
            mode: ScanMode::Filter {
                limit,
                stopgap: None,
            },
            reverse_output: false,
        }
    }

    /// Bound a filter scan with a stopgap substring.
    #[must_use]
    pub fn with_stopgap(mut self, stopgap: impl Into<String>) -> Self {
        if let ScanMode::Filter { limit, .. } = self.mode {
            self.mode = ScanMode::Filter {
                limit,
                stopgap: Some(stopgap.into()),
            };
        }
        self
    }

    /// Request chronological ordering of the accumulated lines.
    #[must_use]
    pub fn reversed(mut self) -> Self {
        self.reverse_output = true;
        self
    }
}

/// Result of a backward scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The single matching line (`First` mode).
    Match(String),
    /// All collected lines (`Filter` / `Tail` modes), ordered per
    /// `reverse_output`.
    Matches(Vec<String>),
    /// Nothing matched within the ceiling. Never an error.
    NotFound,
}

impl ScanOutcome {
    /// The matched line, if the scan found exactly one.
    #[must_use]
    pub fn into_match(self) -> Option<String> {
        match self {
            Self::Match(line) => Some(line),
            Self::Matches(_) | Self::NotFound => None,
        }
    }

    /// Whether anything was found.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

/// I/O-level scan failure. Match misses are [`ScanOutcome::NotFound`],
/// not errors.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read log file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_request() {
        let req = ScanRequest::first("joined the game", 500);
        assert_eq!(req.targets, vec!["joined the game".to_string()]);
        assert_eq!(req.mode, ScanMode::First);
        assert!(!req.reverse_output);
    }

    #[test]
    fn test_tail_is_chronological() {
        let req = ScanRequest::tail(10, 500);
        assert!(req.reverse_output);
        assert_eq!(req.mode, ScanMode::Tail { lines: 10 });
    }

    #[test]
    fn test_stopgap_builder() {
        let req = ScanRequest::filter(vec!["was banned by".to_string()], 50, 500)
            .with_stopgap("There are");
        assert_eq!(
            req.mode,
            ScanMode::Filter {
                limit: 50,
                stopgap: Some("There are".to_string()),
            }
        );
    }

    #[test]
    fn test_outcome_helpers() {
        assert!(ScanOutcome::Match("x".to_string()).is_found());
        assert!(!ScanOutcome::NotFound.is_found());
        assert_eq!(
            ScanOutcome::Match("x".to_string()).into_match(),
            Some("x".to_string())
        );
        assert_eq!(ScanOutcome::NotFound.into_match(), None);
    }
}
