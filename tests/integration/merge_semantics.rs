//! Integration tests for merge semantics across full trees

use linkenv::config::MergeConfig;
use linkenv::error::MergeError;
use linkenv::tree::merge::Merger;
use linkenv::tree::stat::StatCache;
use linkenv::tree::{MergedTree, VirtualNode};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn merge(roots: &[PathBuf], skip: &[&str], ignore: &[&str]) -> Result<MergedTree, MergeError> {
    let config = MergeConfig::new(skip, ignore).unwrap();
    let mut stats = StatCache::new();
    Merger::new(&config).merge(roots, &mut stats)
}

/// Build a dependency-style root with a nested site-packages layout.
fn site_packages_root(base: &std::path::Path, name: &str, module: &str, body: &str) -> PathBuf {
    let root = base.join(name);
    fs::create_dir_all(root.join("lib/site-packages")).unwrap();
    fs::write(root.join(format!("lib/site-packages/{}", module)), body).unwrap();
    root
}

#[test]
fn merging_many_references_to_one_root_never_collides() {
    let temp_dir = TempDir::new().unwrap();
    let root = site_packages_root(temp_dir.path(), "dep", "mod.py", "x = 1");

    for n in 2..6 {
        let roots = vec![root.clone(); n];
        let tree = merge(&roots, &[], &[]).unwrap();
        assert_eq!(
            tree.root().get("lib/site-packages/mod.py"),
            Some(&VirtualNode::Leaf(root.join("lib/site-packages/mod.py")))
        );
    }
}

#[test]
fn disjoint_roots_union_without_collisions() {
    let temp_dir = TempDir::new().unwrap();
    let dep_a = site_packages_root(temp_dir.path(), "depA", "foo.py", "foo");
    let dep_b = site_packages_root(temp_dir.path(), "depB", "bar.py", "bar");

    let tree = merge(&[dep_a.clone(), dep_b.clone()], &[], &[]).unwrap();

    assert_eq!(
        tree.root().get("lib/site-packages/foo.py"),
        Some(&VirtualNode::Leaf(dep_a.join("lib/site-packages/foo.py")))
    );
    assert_eq!(
        tree.root().get("lib/site-packages/bar.py"),
        Some(&VirtualNode::Leaf(dep_b.join("lib/site-packages/bar.py")))
    );
}

#[test]
fn collision_is_suppressed_by_ignore_pattern_but_not_elsewhere() {
    let temp_dir = TempDir::new().unwrap();
    let dep_a = site_packages_root(temp_dir.path(), "depA", "shared.py", "version a");
    let dep_b = site_packages_root(temp_dir.path(), "depB", "shared.py", "version b");

    let err = merge(&[dep_a.clone(), dep_b.clone()], &[], &[]).unwrap_err();
    assert!(matches!(err, MergeError::Collision(_)));

    let tree = merge(
        &[dep_a.clone(), dep_b],
        &[],
        &["lib/site-packages/shared.py"],
    )
    .unwrap();
    assert_eq!(
        tree.root().get("lib/site-packages/shared.py"),
        Some(&VirtualNode::Leaf(dep_a.join("lib/site-packages/shared.py")))
    );
}

#[test]
fn skipped_subtree_suppresses_nested_collisions() {
    let temp_dir = TempDir::new().unwrap();
    let dep_a = site_packages_root(temp_dir.path(), "depA", "clash.py", "a");
    let dep_b = site_packages_root(temp_dir.path(), "depB", "clash.py", "b");

    // The entire lib subtree is pruned, so the clash below it is never seen.
    let tree = merge(&[dep_a, dep_b], &["lib"], &[]).unwrap();
    assert_eq!(tree.root().get("lib"), Some(&VirtualNode::Absent));
}

#[test]
fn bytecode_with_differing_embedded_paths_merges_cleanly() {
    let temp_dir = TempDir::new().unwrap();
    let mut roots = Vec::new();
    for name in ["depA", "depB"] {
        let root = temp_dir.path().join(name);
        let cache = root.join("lib/site-packages/pkg/__pycache__");
        fs::create_dir_all(&cache).unwrap();
        // Byte-identical sources...
        fs::write(root.join("lib/site-packages/pkg/mod.py"), "value = 1\n").unwrap();
        // ...but caches embedding their own absolute source path.
        fs::write(
            cache.join("mod.cpython-312.pyc"),
            format!("magic {}/lib/site-packages/pkg/mod.py", root.display()),
        )
        .unwrap();
        roots.push(root);
    }

    let tree = merge(&roots, &[], &[]).unwrap();
    assert_eq!(
        tree.root()
            .get("lib/site-packages/pkg/__pycache__/mod.cpython-312.pyc"),
        Some(&VirtualNode::Leaf(
            roots[0].join("lib/site-packages/pkg/__pycache__/mod.cpython-312.pyc")
        ))
    );
}

#[test]
fn deep_positions_exist_through_merging_alone() {
    let temp_dir = TempDir::new().unwrap();
    let dep_a = site_packages_root(temp_dir.path(), "depA", "foo.py", "foo");
    let dep_b = site_packages_root(temp_dir.path(), "depB", "bar.py", "bar");

    let tree = merge(&[dep_a, dep_b], &[], &[]).unwrap();

    // lib and lib/site-packages are directory positions synthesized by the
    // merge; neither root is their representative.
    assert!(matches!(tree.root().get("lib"), Some(VirtualNode::Subtree(_))));
    assert!(matches!(
        tree.root().get("lib/site-packages"),
        Some(VirtualNode::Subtree(_))
    ));
}

#[test]
fn merge_is_deterministic_across_repeated_invocations() {
    let temp_dir = TempDir::new().unwrap();
    let dep_a = site_packages_root(temp_dir.path(), "depA", "foo.py", "foo");
    let dep_b = site_packages_root(temp_dir.path(), "depB", "bar.py", "bar");
    let roots = [dep_a, dep_b];

    // Fresh StatCache per invocation: cross-run reuse is not allowed.
    let first = merge(&roots, &[], &[]).unwrap();
    let second = merge(&roots, &[], &[]).unwrap();
    assert_eq!(first.root(), second.root());
}
