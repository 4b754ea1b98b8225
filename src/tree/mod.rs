//! Virtual merged tree
//!
//! Represents the reconciliation of N input trees as an in-memory structure,
//! prior to being written to disk. Every position is an explicit tagged
//! variant so consumers match exhaustively instead of re-inspecting
//! filesystem metadata.

pub mod merge;
pub mod stat;

use std::collections::BTreeMap;
use std::path::PathBuf;

/// One position in the virtual merged tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VirtualNode {
    /// Pruned by a skip pattern; nothing exists or is materialized here.
    Absent,
    /// Exactly one physical entry chosen as representative among the
    /// candidates for this position.
    Leaf(PathBuf),
    /// A directory position with merged children by entry name.
    Subtree(BTreeMap<String, VirtualNode>),
}

impl VirtualNode {
    /// Look up a child node by slash-separated relative path.
    pub fn get(&self, rel_path: &str) -> Option<&VirtualNode> {
        let mut node = self;
        for name in rel_path.split('/').filter(|s| !s.is_empty()) {
            match node {
                VirtualNode::Subtree(children) => node = children.get(name)?,
                _ => return None,
            }
        }
        Some(node)
    }
}

/// The root of one merge invocation's virtual tree.
///
/// Immutable once built; consumed exactly once by materialization and
/// never persisted across runs.
#[derive(Debug, Clone)]
pub struct MergedTree {
    root: VirtualNode,
}

impl MergedTree {
    pub(crate) fn new(root: VirtualNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &VirtualNode {
        &self.root
    }
}
