//! Error types for environment assembly.

use std::path::PathBuf;
use thiserror::Error;

/// Two or more inputs provide the same relative path with different contents.
///
/// Carries every offending absolute candidate path so operators can decide
/// whether to add a skip or ignore-collision pattern.
#[derive(Debug, Error)]
#[error(
    "two or more inputs provide the same file with different contents: {}",
    format_paths(.paths)
)]
pub struct CollisionError {
    pub paths: Vec<PathBuf>,
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Merge-level errors
#[derive(Debug, Error)]
pub enum MergeError {
    #[error(transparent)]
    Collision(#[from] CollisionError),

    #[error("input symlinks {0:?} do not resolve and symlink resolution is ambiguous")]
    UnresolvedSymlinks(Vec<PathBuf>),

    #[error("unsupported input file types for candidates {0:?}")]
    Unsupported(Vec<PathBuf>),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("merge I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Materialization and pipeline errors
#[derive(Debug, Error)]
pub enum EnvError {
    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("wrapper compilation failed for {bin}: {detail}")]
    WrapperCompile { bin: PathBuf, detail: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CollisionError> for EnvError {
    fn from(err: CollisionError) -> Self {
        EnvError::Merge(MergeError::Collision(err))
    }
}
