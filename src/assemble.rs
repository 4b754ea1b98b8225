//! Environment assembly pipeline
//!
//! Facade tying the stages together: capture the merge configuration once,
//! seed one invocation-scoped stat cache, merge the destination skeleton
//! with the dependency roots, materialize the virtual tree, then wrap the
//! interpreter links in the executable directory. Fails fast; on any error
//! the destination must be treated as disposable by the caller.

use crate::config::MergeConfig;
use crate::error::EnvError;
use crate::materialize::wrapper::RedirectWriter;
use crate::materialize::Materializer;
use crate::tree::merge::Merger;
use crate::tree::stat::StatCache;
use std::path::PathBuf;
use tracing::info;

/// The `nix-support` directory is owned by other hooks and never merged.
const BUILTIN_SKIP: &[&str] = &["nix-support"];

/// One environment assembly request.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Destination root; must already hold the bootstrapped skeleton and is
    /// merged as the first (tie-winning) root.
    pub out_root: PathBuf,
    /// Build-time interpreter installation the skeleton links against.
    pub interpreter_root: PathBuf,
    /// Ordered dependency roots; earlier roots win ties.
    pub roots: Vec<PathBuf>,
    /// Glob patterns pruned from the merge.
    pub skip: Vec<String>,
    /// Glob patterns whose collisions resolve to the first root.
    pub ignore_collisions: Vec<String>,
}

/// Merge, materialize, and wrap in one invocation.
pub fn assemble(options: &AssembleOptions, writer: &dyn RedirectWriter) -> Result<(), EnvError> {
    let mut skip: Vec<String> = BUILTIN_SKIP.iter().map(|s| (*s).to_string()).collect();
    skip.extend(options.skip.iter().cloned());
    let config = MergeConfig::new(&skip, &options.ignore_collisions)?;

    let mut roots = Vec::with_capacity(options.roots.len() + 1);
    roots.push(options.out_root.clone());
    roots.extend(options.roots.iter().cloned());

    let mut stats = StatCache::new();
    let tree = Merger::new(&config).merge(&roots, &mut stats)?;

    let materializer = Materializer::new(
        options.out_root.clone(),
        options.interpreter_root.clone(),
        writer,
    );
    materializer.materialize(&tree, &mut stats)?;
    materializer.wrap_interpreter_links()?;

    info!(
        out = %options.out_root.display(),
        roots = options.roots.len(),
        "environment assembled"
    );
    Ok(())
}
