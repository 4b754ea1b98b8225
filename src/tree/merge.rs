//! Recursive tree merger
//!
//! Reconciles an ordered list of root trees into one virtual merged tree.
//! Root ordering is load-bearing: earlier roots win every tie, both for
//! representative file choice and as the symlink resolution anchor.

use crate::compare::paths_equal;
use crate::config::MergeConfig;
use crate::error::{CollisionError, MergeError};
use crate::tree::stat::StatCache;
use crate::tree::{MergedTree, VirtualNode};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, trace};

/// Tree merger for one invocation.
///
/// Holds the immutable merge configuration; all filesystem metadata goes
/// through the invocation-scoped [`StatCache`] passed into [`Merger::merge`].
pub struct Merger<'a> {
    config: &'a MergeConfig,
}

impl<'a> Merger<'a> {
    pub fn new(config: &'a MergeConfig) -> Self {
        Self { config }
    }

    /// Merge the ordered list of immutable root trees.
    #[instrument(skip_all, fields(roots = roots.len()))]
    pub fn merge(
        &self,
        roots: &[PathBuf],
        stats: &mut StatCache,
    ) -> Result<MergedTree, MergeError> {
        let mut stack = Vec::new();
        let root = self.recurse(roots.to_vec(), &mut stack, stats)?;
        debug!("merge completed");
        Ok(MergedTree::new(root))
    }

    fn recurse(
        &self,
        candidates: Vec<PathBuf>,
        stack: &mut Vec<String>,
        stats: &mut StatCache,
    ) -> Result<VirtualNode, MergeError> {
        let rel_path = stack.join("/");

        if self.config.is_skipped(&rel_path) {
            trace!(path = %rel_path, "pruned by skip pattern");
            return Ok(VirtualNode::Absent);
        }

        // A position can exist purely because ancestors are produced through
        // merging, with no direct contributing content.
        if candidates.is_empty() {
            return Ok(VirtualNode::Subtree(BTreeMap::new()));
        }

        if let [single] = candidates.as_slice() {
            return Ok(VirtualNode::Leaf(single.clone()));
        }

        let mut any_dir = false;
        let mut any_file = false;
        let mut all_symlinks = true;
        for candidate in &candidates {
            let file_type = stats.lstat(candidate)?.file_type();
            any_dir |= file_type.is_dir();
            any_file |= file_type.is_file();
            all_symlinks &= file_type.is_symlink();
        }

        if any_dir {
            self.merge_directories(&candidates, stack, stats)
        } else if any_file {
            self.merge_files(candidates, &rel_path, stats)
        } else if all_symlinks {
            self.merge_symlinks(&candidates, &rel_path, stack, stats)
        } else {
            Err(MergeError::Unsupported(candidates))
        }
    }

    /// Directory position: union child names across every candidate that is
    /// a directory when followed, and recurse per child. Directory candidates
    /// take precedence over non-directories at the same position (documented
    /// edge case, preserved as-is).
    fn merge_directories(
        &self,
        candidates: &[PathBuf],
        stack: &mut Vec<String>,
        stats: &mut StatCache,
    ) -> Result<VirtualNode, MergeError> {
        let mut entries: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

        for candidate in candidates {
            let file_type = stats.lstat(candidate)?.file_type();
            let is_dir = file_type.is_dir()
                || (file_type.is_symlink()
                    && fs::metadata(candidate).map(|m| m.is_dir()).unwrap_or(false));
            if !is_dir {
                continue;
            }
            for entry in fs::read_dir(candidate)? {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().into_owned();
                entries.entry(name).or_default().push(entry.path());
            }
        }

        let mut children = BTreeMap::new();
        for (name, child_candidates) in entries {
            stack.push(name.clone());
            let node = self.recurse(child_candidates, stack, stats);
            stack.pop();
            children.insert(name, node?);
        }

        Ok(VirtualNode::Subtree(children))
    }

    /// Regular-file position: byte-compare all candidates, then pick the
    /// first regular file in root order as representative.
    fn merge_files(
        &self,
        candidates: Vec<PathBuf>,
        rel_path: &str,
        stats: &mut StatCache,
    ) -> Result<VirtualNode, MergeError> {
        self.check_collision(&candidates, rel_path)?;

        for candidate in &candidates {
            if stats.lstat(candidate)?.file_type().is_file() {
                return Ok(VirtualNode::Leaf(candidate.clone()));
            }
        }

        // Unreachable when the caller observed a regular file among the
        // candidates; kept as a structural failure rather than a panic.
        Err(MergeError::Unsupported(candidates))
    }

    /// All-symlink position: identical raw target text picks the first
    /// candidate; otherwise resolve in root order and retry.
    fn merge_symlinks(
        &self,
        candidates: &[PathBuf],
        rel_path: &str,
        stack: &mut Vec<String>,
        stats: &mut StatCache,
    ) -> Result<VirtualNode, MergeError> {
        let Some((first, rest)) = candidates.split_first() else {
            return Err(MergeError::Unsupported(candidates.to_vec()));
        };

        let first_target = fs::read_link(first)?;
        let mut identical = true;
        for candidate in rest {
            if fs::read_link(candidate)? != first_target {
                identical = false;
                break;
            }
        }
        if identical {
            return Ok(VirtualNode::Leaf(first.clone()));
        }

        for (index, candidate) in candidates.iter().enumerate() {
            let Ok(resolved) = fs::canonicalize(candidate) else {
                continue;
            };
            let Ok(meta) = fs::metadata(&resolved) else {
                continue;
            };

            if meta.is_dir() {
                // Substitute the resolved directory and retry this position.
                let mut retry = candidates.to_vec();
                retry[index] = resolved;
                return self.recurse(retry, stack, stats);
            }
            if meta.is_file() {
                self.check_collision(candidates, rel_path)?;
                // The symlink itself is the representative, not its target.
                return Ok(VirtualNode::Leaf(candidate.clone()));
            }
        }

        Err(MergeError::UnresolvedSymlinks(candidates.to_vec()))
    }

    fn check_collision(
        &self,
        candidates: &[PathBuf],
        rel_path: &str,
    ) -> Result<(), MergeError> {
        let Some(first) = candidates.first() else {
            return Ok(());
        };
        if is_bytecode(first) || self.config.collisions_ignored(rel_path) {
            return Ok(());
        }
        if paths_equal(candidates)? {
            return Ok(());
        }
        debug!(path = %rel_path, "content collision");
        Err(CollisionError {
            paths: candidates.to_vec(),
        }
        .into())
    }
}

/// Compiled bytecode caches embed fully resolved source paths, so their
/// bytes collide even when the originating sources are identical. The
/// sources themselves are compared for equality, which covers the caches.
fn is_bytecode(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "pyc")
        && path
            .components()
            .any(|c| c.as_os_str() == "__pycache__")
}
