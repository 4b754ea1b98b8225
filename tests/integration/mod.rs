//! Integration tests for environment assembly

mod merge_semantics;

use std::path::Path;
use std::process::Command;

/// Whether a C compiler is reachable; wrapper-execution tests skip without one.
pub fn have_cc() -> bool {
    let cc = std::env::var("CC").unwrap_or_else(|_| "cc".to_string());
    Command::new(cc)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Install a POSIX shell as a stand-in interpreter binary at `dst`.
pub fn install_fake_interpreter(dst: &Path) {
    std::fs::copy("/bin/sh", dst).unwrap();
    let mut perms = std::fs::metadata(dst).unwrap().permissions();
    std::os::unix::fs::PermissionsExt::set_mode(&mut perms, 0o755);
    std::fs::set_permissions(dst, perms).unwrap();
}
