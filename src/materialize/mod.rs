//! Materializer
//!
//! Walks a virtual merged tree and writes real filesystem entries into the
//! destination directory. Ordinary leaves become symlinks into their source
//! trees, so no file payload is ever duplicated; this preserves space and
//! provenance, and means the produced environment stays valid only while
//! the source roots outlive it. Leaves destined for the executable
//! directory go through shebang inspection and may become compiled redirect
//! wrappers instead.

pub mod wrapper;

use crate::error::EnvError;
use crate::materialize::wrapper::RedirectWriter;
use crate::tree::stat::StatCache;
use crate::tree::{MergedTree, VirtualNode};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{symlink, PermissionsExt};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, trace};

/// Writes one merged tree into one destination.
///
/// The destination must be empty or exclusively owned scratch space; on any
/// error no contract is made about partial writes and the caller is expected
/// to discard the destination.
pub struct Materializer<'a> {
    out_root: PathBuf,
    out_bin: PathBuf,
    interpreter_root: PathBuf,
    shebang_prefix: Vec<u8>,
    writer: &'a dyn RedirectWriter,
}

impl<'a> Materializer<'a> {
    /// `interpreter_root` is the build-time interpreter installation whose
    /// `bin` directory anchors the shebang prefix match.
    pub fn new(
        out_root: PathBuf,
        interpreter_root: PathBuf,
        writer: &'a dyn RedirectWriter,
    ) -> Self {
        let out_bin = out_root.join("bin");
        let mut shebang_prefix = b"#!".to_vec();
        shebang_prefix.extend_from_slice(interpreter_root.join("bin").as_os_str().as_bytes());
        Self {
            out_root,
            out_bin,
            interpreter_root,
            shebang_prefix,
            writer,
        }
    }

    /// Write the merged tree under the destination root.
    #[instrument(skip_all, fields(out = %self.out_root.display()))]
    pub fn materialize(
        &self,
        tree: &MergedTree,
        stats: &mut StatCache,
    ) -> Result<(), EnvError> {
        self.write_node(&self.out_root, tree.root(), stats)
    }

    fn write_node(
        &self,
        dst: &Path,
        node: &VirtualNode,
        stats: &mut StatCache,
    ) -> Result<(), EnvError> {
        match node {
            VirtualNode::Absent => Ok(()),
            VirtualNode::Subtree(children) => {
                if !dst.is_dir() {
                    fs::create_dir_all(dst)?;
                }
                for (name, child) in children {
                    self.write_node(&dst.join(name), child, stats)?;
                }
                Ok(())
            }
            VirtualNode::Leaf(src) => {
                // A representative inside the destination means the output
                // skeleton was itself a merge input; nothing to write.
                if src.starts_with(&self.out_root) {
                    trace!(src = %src.display(), "leaf already inside destination");
                    return Ok(());
                }
                if dst.starts_with(&self.out_bin) {
                    self.write_bin(src, dst, stats)
                } else {
                    self.write_regular(src, dst, stats)
                }
            }
        }
    }

    /// Default write: preserve symlink entries, symlink everything else.
    fn write_regular(
        &self,
        src: &Path,
        dst: &Path,
        stats: &mut StatCache,
    ) -> Result<(), EnvError> {
        if stats.is_symlink(src)? {
            // Recreate the symlink with identical target text, not a link
            // to a link.
            let target = fs::read_link(src)?;
            symlink(&target, dst)?;
        } else {
            symlink(src, dst)?;
        }
        Ok(())
    }

    /// Executable-directory write: interpreter launchers become redirect
    /// wrappers, everything else falls back to the default behavior.
    fn write_bin(
        &self,
        src: &Path,
        dst: &Path,
        stats: &mut StatCache,
    ) -> Result<(), EnvError> {
        let meta = stats.lstat(src)?;

        if meta.file_type().is_symlink() {
            let target = fs::read_link(src)?;
            symlink(&target, dst)?;
            return Ok(());
        }

        if let Some(interpreter) = self.shebang_interpreter(src)? {
            debug!(src = %src.display(), interpreter = %interpreter.display(), "rewriting launcher");
            let mode = meta.permissions().mode();
            self.writer.write_redirect(dst, &interpreter, mode)?;
            return Ok(());
        }

        symlink(src, dst)?;
        Ok(())
    }

    /// If the file's leading bytes match the build-time interpreter shebang
    /// prefix, return the full interpreter path named on the shebang line.
    fn shebang_interpreter(&self, src: &Path) -> Result<Option<PathBuf>, EnvError> {
        let mut reader = BufReader::new(File::open(src)?);

        let mut prefix = vec![0u8; self.shebang_prefix.len()];
        let mut filled = 0;
        while filled < prefix.len() {
            match reader.read(&mut prefix[filled..])? {
                0 => return Ok(None),
                n => filled += n,
            }
        }
        if prefix != self.shebang_prefix {
            return Ok(None);
        }

        let mut rest = Vec::new();
        reader.read_until(b'\n', &mut rest)?;
        // Interpreter path runs to the end of the line or the first
        // whitespace (shebang arguments).
        let end = rest
            .iter()
            .position(|b| b.is_ascii_whitespace())
            .unwrap_or(rest.len());

        let mut interpreter = self.shebang_prefix[2..].to_vec();
        interpreter.extend_from_slice(&rest[..end]);
        Ok(Some(PathBuf::from(
            std::ffi::OsStr::from_bytes(&interpreter).to_os_string(),
        )))
    }

    /// Replace symlinks in the executable directory that point into the
    /// interpreter root with redirect wrappers.
    ///
    /// The skeleton links its interpreter binaries by absolute path; a
    /// symlink pointing at this environment would then resolve straight
    /// past it. The wrapper keeps the environment's own path as argv[0]
    /// so the interpreter locates the environment it was launched from.
    pub fn wrap_interpreter_links(&self) -> Result<(), EnvError> {
        if !self.out_bin.is_dir() {
            return Ok(());
        }

        for entry in fs::read_dir(&self.out_bin)? {
            let entry = entry?;
            if !entry.file_type()?.is_symlink() {
                continue;
            }
            let bin = entry.path();
            let target = fs::read_link(&bin)?;
            if !target.starts_with(&self.interpreter_root) {
                continue;
            }

            debug!(bin = %bin.display(), target = %target.display(), "wrapping interpreter link");
            let mode = fs::metadata(&target)
                .map(|m| m.permissions().mode())
                .unwrap_or(0o755);
            fs::remove_file(&bin)?;
            self.writer.write_redirect(&bin, &target, mode)?;
        }

        Ok(())
    }
}
