//! Redirect wrapper generation
//!
//! Executables generated at build time embed an absolute interpreter path
//! that is valid only at build time. Rewriting the executable's content
//! would break the reproducibility guarantees on the content itself, so the
//! redirect lives outside it: a self-contained stub that replaces argv[0]
//! with its own installed path and execs the original interpreter binary
//! directly. No supervising parent, no intermediate shell; exit status and
//! signal semantics flow through process replacement.

use crate::error::EnvError;
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Executable materialization strategy.
///
/// Pluggable so platforms without ahead-of-time native compilation can
/// substitute an alternate redirection mechanism without altering the
/// merge/materialize contract.
pub trait RedirectWriter {
    /// Write an executable at `dst` that replaces the current process image
    /// with `target`, forwarding the original arguments with argv[0] set to
    /// `dst`. `mode` carries the permission bits to install.
    fn write_redirect(&self, dst: &Path, target: &Path, mode: u32) -> Result<(), EnvError>;
}

/// Default strategy: compile a minimal C stub with the ambient C compiler.
pub struct CcRedirectWriter {
    cc: String,
}

impl CcRedirectWriter {
    /// Use `$CC`, falling back to `cc`.
    pub fn from_env() -> Self {
        Self {
            cc: std::env::var("CC").unwrap_or_else(|_| "cc".to_string()),
        }
    }
}

impl Default for CcRedirectWriter {
    fn default() -> Self {
        Self::from_env()
    }
}

impl RedirectWriter for CcRedirectWriter {
    fn write_redirect(&self, dst: &Path, target: &Path, mode: u32) -> Result<(), EnvError> {
        debug!(dst = %dst.display(), target = %target.display(), "compiling redirect wrapper");

        let source = redirect_source(dst, target);
        let mut child = Command::new(&self.cc)
            .args([
                "-Wall",
                "-Werror",
                "-Wpedantic",
                "-Wno-overlength-strings",
                "-Os",
                "-x",
                "c",
                "-o",
            ])
            .arg(dst)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| EnvError::WrapperCompile {
                bin: dst.to_path_buf(),
                detail: format!("failed to spawn '{}': {}", self.cc, e),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(source.as_bytes())
                .map_err(|e| EnvError::WrapperCompile {
                    bin: dst.to_path_buf(),
                    detail: format!("failed to feed source to '{}': {}", self.cc, e),
                })?;
        }

        let output = child.wait_with_output().map_err(EnvError::Io)?;
        if !output.status.success() {
            return Err(EnvError::WrapperCompile {
                bin: dst.to_path_buf(),
                detail: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        fs::set_permissions(dst, fs::Permissions::from_mode(mode))?;
        Ok(())
    }
}

fn redirect_source(dst: &Path, target: &Path) -> String {
    format!(
        "#include <unistd.h>\n\
         #include <stdlib.h>\n\
         \n\
         int main(int argc, char **argv) {{\n\
             argv[0] = \"{}\";\n\
             return execv(\"{}\", argv);\n\
         }}\n",
        dst.display(),
        target.display()
    )
}
