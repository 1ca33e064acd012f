#![forbid(unsafe_code)]

//! Blocking file-system helpers used by the editor's asset and project
//! panels.
//!
//! # Operations
//!
//! | Operation | Missing path | Notes |
//! |-----------|--------------|-------|
//! | [`ensure_directory`](FileSystemService::ensure_directory) | created with parents | fails if a file is in the way |
//! | [`list_files_recursive`](FileSystemService::list_files_recursive) | empty list | sorted, regular files only |
//! | [`remove_directory_recursive`](FileSystemService::remove_directory_recursive) | no-op | also removes a plain file |
//! | [`wait_for_file`](FileSystemService::wait_for_file) | polls | 150 ms interval, 10 s timeout by default, never fails |
//! | [`directory_tree`](FileSystemService::directory_tree) | `None` | children sorted by name |
//!
//! Every call blocks the calling thread. Run them off the UI loop when the
//! tree may be large.

pub mod error;
pub mod local;
pub mod pattern;
pub mod tree;
pub mod wait;

use std::path::{Path, PathBuf};

pub use error::FsError;
pub use local::LocalFileSystem;
pub use pattern::{FilePattern, IgnoreSet};
pub use tree::{DirectoryTree, EntryKind};
pub use wait::{WaitConfig, WaitOutcome};

/// File-system operations the editor depends on.
///
/// Implemented by [`LocalFileSystem`]; hosts can swap in an in-memory or
/// sandboxed implementation.
pub trait FileSystemService {
    /// Create `path` and any missing parents. Returns `true` if anything was
    /// created.
    fn ensure_directory(&self, path: &Path) -> Result<bool, FsError>;

    /// Regular files matching `pattern`, minus those matching any `ignore`
    /// glob, sorted.
    ///
    /// Supports `*`, `?`, `**`, `[...]` and `{a,b}`. `*` and `?` stay within
    /// one path component.
    fn list_files_recursive(&self, pattern: &str, ignore: &[&str]) -> Result<Vec<PathBuf>, FsError>;

    /// Remove `path` and everything below it. Returns `false` if nothing was
    /// there.
    fn remove_directory_recursive(&self, path: &Path) -> Result<bool, FsError>;

    /// Block until `path` exists or the timeout elapses. Errors while
    /// checking count as "not there yet", so this ends in `TimedOut`.
    fn wait_for_file(&self, path: &Path, config: &WaitConfig) -> WaitOutcome;

    /// Snapshot of `path` and everything below it.
    fn directory_tree(&self, path: &Path) -> Result<Option<DirectoryTree>, FsError>;
}
