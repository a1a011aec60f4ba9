//! ANSI escape stripping.
//!
//! Game servers routinely color their console output; escape sequences
//! must be removed before substring matching or the targets never hit.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// CSI sequences (`ESC [ ... final`) and bare two-byte escapes.
static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b(?:\[[0-?]*[ -/]*[@-~]|[@-Z\\-_])").expect("ANSI pattern is valid")
});

/// Remove ANSI escape sequences from a line.
///
/// Borrows when the line is already clean, which is the common case.
#[must_use]
pub fn strip_ansi(line: &str) -> Cow<'_, str> {
    ANSI_ESCAPE.replace_all(line, "")
}
