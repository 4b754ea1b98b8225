//! Post-materialization configuration fixup
//!
//! The environment bootstrap writes the build-time interpreter prefix into
//! the environment's small metadata file. A single substitution pass points
//! those references at the target interpreter root instead. Idempotent: a
//! file without the build-time prefix passes through unchanged.

use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Replace the build-time runtime prefix (and, when cross-building, the
/// secondary base prefix) in `file` with the target interpreter root.
pub fn rewrite_prefixes(
    file: &Path,
    build_prefix: &Path,
    base_prefix: Option<&Path>,
    target_root: &Path,
) -> io::Result<()> {
    let contents = fs::read_to_string(file)?;
    let target = target_root.to_string_lossy();

    let mut rewritten = contents.replace(build_prefix.to_string_lossy().as_ref(), &target);
    if let Some(base) = base_prefix {
        rewritten = rewritten.replace(base.to_string_lossy().as_ref(), &target);
    }

    if rewritten != contents {
        debug!(file = %file.display(), "rewrote interpreter prefix");
        fs::write(file, rewritten)?;
    }
    Ok(())
}
