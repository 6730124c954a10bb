//! Golden comparison and advisory diff rendering.
//!
//! The pass/fail decision is plain equality of the normalized texts. The line diff
//! produced here is only for display and is bounded so reports stay readable.

use difference::{Changeset, Difference};
use serde::Serialize;

use crate::normalize::normalize;

/// Default cap on rendered diff lines.
pub const DEFAULT_MAX_DIFF_LINES: usize = 10;

/// Unchanged lines kept around each change.
const CONTEXT_LINES: usize = 1;

/// Result of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    /// Normalized texts differ.
    Fail { expected: String, actual: String },
    /// Expected-output fixture is missing.
    Skip { reason: String },
    /// The subject or secondary stage could not be run, or a fixture could not be read.
    ExecutionError { message: String },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Pass => "PASS",
            Outcome::Fail { .. } => "FAIL",
            Outcome::Skip { .. } => "SKIP",
            Outcome::ExecutionError { .. } => "ERROR",
        }
    }
}

/// Compares two texts after normalizing both.
pub fn compare(expected: &str, actual: &str) -> Outcome {
    let expected = normalize(expected);
    let actual = normalize(actual);
    if expected == actual {
        Outcome::Pass
    } else {
        Outcome::Fail { expected, actual }
    }
}

/// One rendered diff line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum DiffLine {
    Same(String),
    /// Present in expected, missing from actual.
    Removed(String),
    /// Present in actual, missing from expected.
    Added(String),
    /// Unchanged lines collapsed away from any change.
    Unchanged(usize),
    /// Lines cut by the cap.
    Elided(usize),
}

impl DiffLine {
    pub fn prefix(&self) -> &'static str {
        match self {
            DiffLine::Same(_) => " ",
            DiffLine::Removed(_) => "-",
            DiffLine::Added(_) => "+",
            DiffLine::Unchanged(_) | DiffLine::Elided(_) => "@",
        }
    }
}

impl std::fmt::Display for DiffLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiffLine::Same(s) | DiffLine::Removed(s) | DiffLine::Added(s) => {
                write!(f, "{}{}", self.prefix(), s)
            }
            DiffLine::Unchanged(n) => write!(f, "... {n} unchanged line(s)"),
            DiffLine::Elided(n) => write!(f, "... {n} more line(s)"),
        }
    }
}

/// Line diff of `expected` against `actual`, at most `max_lines` content lines long.
///
/// Long unchanged runs are collapsed to [`CONTEXT_LINES`] on either side of a change.
/// When the cap is hit, a trailing [`DiffLine::Elided`] reports how many lines were cut.
pub fn line_diff(expected: &str, actual: &str, max_lines: usize) -> Vec<DiffLine> {
    let changeset = Changeset::new(expected, actual, "\n");
    let chunks = &changeset.diffs;
    let mut full = Vec::new();

    for (i, chunk) in chunks.iter().enumerate() {
        match chunk {
            Difference::Same(text) => {
                let lines: Vec<&str> = text.split('\n').collect();
                let keep_head = if i > 0 { CONTEXT_LINES } else { 0 };
                let keep_tail = if i + 1 < chunks.len() { CONTEXT_LINES } else { 0 };
                if lines.len() <= keep_head + keep_tail {
                    full.extend(lines.iter().map(|l| DiffLine::Same(l.to_string())));
                    continue;
                }
                full.extend(lines[..keep_head].iter().map(|l| DiffLine::Same(l.to_string())));
                full.push(DiffLine::Unchanged(lines.len() - keep_head - keep_tail));
                full.extend(
                    lines[lines.len() - keep_tail..]
                        .iter()
                        .map(|l| DiffLine::Same(l.to_string())),
                );
            }
            Difference::Rem(text) => {
                full.extend(text.split('\n').map(|l| DiffLine::Removed(l.to_string())));
            }
            Difference::Add(text) => {
                full.extend(text.split('\n').map(|l| DiffLine::Added(l.to_string())));
            }
        }
    }

    if full.len() <= max_lines {
        return full;
    }
    let hidden = full[max_lines..]
        .iter()
        .map(|line| match line {
            DiffLine::Unchanged(n) | DiffLine::Elided(n) => *n,
            _ => 1,
        })
        .sum();
    full.truncate(max_lines);
    full.push(DiffLine::Elided(hidden));
    full
}
