//! Merge configuration
//!
//! Skip and ignore-collision patterns are captured once at the entry point
//! into an immutable `MergeConfig` and never re-derived inside recursion.
//! Patterns use POSIX shell glob semantics (`*`, `?`, character classes)
//! matched against the slash-joined relative path; `*` spans separators,
//! matching fnmatch behavior.

use crate::error::MergeError;
use glob::{MatchOptions, Pattern};

/// fnmatch-compatible options: `*` and `?` match across `/`.
const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Immutable merge configuration for one run.
#[derive(Debug, Clone, Default)]
pub struct MergeConfig {
    skip: Vec<Pattern>,
    ignore_collisions: Vec<Pattern>,
}

impl MergeConfig {
    /// Compile skip and ignore-collision patterns.
    ///
    /// Invalid patterns are rejected here, before any filesystem work.
    pub fn new<S: AsRef<str>>(
        skip: &[S],
        ignore_collisions: &[S],
    ) -> Result<Self, MergeError> {
        Ok(Self {
            skip: compile(skip)?,
            ignore_collisions: compile(ignore_collisions)?,
        })
    }

    /// Whether the relative path is pruned from the merge entirely.
    pub fn is_skipped(&self, rel_path: &str) -> bool {
        matches_any(&self.skip, rel_path)
    }

    /// Whether collisions at the relative path are tolerated
    /// (first root's candidate wins).
    pub fn collisions_ignored(&self, rel_path: &str) -> bool {
        matches_any(&self.ignore_collisions, rel_path)
    }
}

fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Pattern>, MergeError> {
    patterns
        .iter()
        .map(|p| Pattern::new(p.as_ref()).map_err(MergeError::from))
        .collect()
}

fn matches_any(patterns: &[Pattern], rel_path: &str) -> bool {
    patterns
        .iter()
        .any(|p| p.matches_with(rel_path, GLOB_OPTIONS))
}
