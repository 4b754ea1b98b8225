//! Invocation-scoped filesystem metadata cache
//!
//! Memoizes `symlink_metadata` lookups for the duration of one merge or
//! materialize invocation. Passed explicitly as a context object; it must
//! not be shared or reused across invocations, since the immutability
//! assumption on the inputs holds only for one run.

use std::collections::HashMap;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};

/// Metadata cache keyed by path, symlink-aware (does not follow links).
#[derive(Debug, Default)]
pub struct StatCache {
    entries: HashMap<PathBuf, Metadata>,
}

impl StatCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached `symlink_metadata` for the path.
    pub fn lstat(&mut self, path: &Path) -> io::Result<Metadata> {
        if let Some(meta) = self.entries.get(path) {
            return Ok(meta.clone());
        }
        let meta = fs::symlink_metadata(path)?;
        self.entries.insert(path.to_path_buf(), meta.clone());
        Ok(meta)
    }

    /// Whether the path itself (not its target) is a symlink.
    pub fn is_symlink(&mut self, path: &Path) -> io::Result<bool> {
        Ok(self.lstat(path)?.file_type().is_symlink())
    }
}
