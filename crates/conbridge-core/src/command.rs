//! Command payloads and correlation tokens.

use rand::Rng;

/// One command headed for the server console.
///
/// Immutable text plus an optional correlation token; created per
/// invocation and never persisted. The token is a random decimal
/// fraction embedded in probe output so the command's effect can be
/// located precisely in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    text: String,
    token: Option<String>,
}

impl Command {
    /// A plain command with no correlation token.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            token: None,
        }
    }

    /// A command carrying a fresh correlation token.
    #[must_use]
    pub fn with_token(text: impl Into<String>) -> Self {
        Self::correlated(text, generate_token())
    }

    /// A command correlated to an existing token, e.g. the one a
    /// preceding probe embedded in the log.
    #[must_use]
    pub fn correlated(text: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            token: Some(token.into()),
        }
    }

    /// The command text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The correlation token, if one was generated.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Generate a correlation token: a random decimal fraction rendered as
/// a string (e.g. `0.837261`). Six digits keeps accidental collisions
/// with ordinary log content implausible while staying innocuous in
/// probe command output.
#[must_use]
pub fn generate_token() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("0.{n:06}")
}
