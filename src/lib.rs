//! Linkenv: Relocatable Environment Assembly
//!
//! Assembles an isolated runtime directory by overlaying a freshly created
//! base skeleton with read-only, independently built dependency trees.
//! Candidate trees are reconciled into one virtual merged tree, which is
//! then written back out as symlinks into the sources, with interpreter
//! launchers replaced by position-independent redirect wrappers.

pub mod assemble;
pub mod compare;
pub mod config;
pub mod error;
pub mod fixup;
pub mod logging;
pub mod materialize;
pub mod tree;
