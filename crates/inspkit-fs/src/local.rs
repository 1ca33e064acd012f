#![forbid(unsafe_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::pattern::{FilePattern, IgnoreSet};
use crate::tree::DirectoryTree;
use crate::wait::{self, WaitConfig, WaitOutcome};
use crate::{FileSystemService, FsError};

/// [`FileSystemService`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl FileSystemService for LocalFileSystem {
    fn ensure_directory(&self, path: &Path) -> Result<bool, FsError> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => return Ok(false),
            Ok(_) => {
                return Err(FsError::NotADirectory {
                    path: path.to_path_buf(),
                });
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(FsError::io(path, e)),
        }
        fs::create_dir_all(path).map_err(|e| FsError::io(path, e))?;
        debug!(path = %path.display(), "created directory");
        Ok(true)
    }

    fn list_files_recursive(&self, pattern: &str, ignore: &[&str]) -> Result<Vec<PathBuf>, FsError> {
        let pattern = FilePattern::new(pattern)?;
        let ignore = IgnoreSet::new(ignore)?;

        let bare = pattern.base().as_os_str().is_empty();
        let root = if bare { Path::new(".") } else { pattern.base() };
        if !root.try_exists().map_err(|e| FsError::io(root, e))? {
            debug!(pattern = pattern.as_str(), "pattern base does not exist");
            return Ok(Vec::new());
        }

        // Paths are matched in the same form the pattern was written in.
        let shown = |path: &Path| -> PathBuf {
            if bare {
                path.strip_prefix(".").unwrap_or(path).to_path_buf()
            } else {
                path.to_path_buf()
            }
        };

        let mut walker = WalkDir::new(root);
        if let Some(depth) = pattern.max_depth() {
            walker = walker.max_depth(depth);
        }
        let entries = walker.into_iter().filter_entry(|entry| {
            entry.depth() == 0 || ignore.is_empty() || !ignore.is_match(&shown(entry.path()))
        });

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| FsError::Walk {
                root: root.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = shown(entry.path());
            if pattern.is_match(&path) && !ignore.is_match(&path) {
                files.push(path);
            }
        }
        files.sort();

        debug!(
            pattern = pattern.as_str(),
            matched = files.len(),
            "listed files"
        );
        Ok(files)
    }

    fn remove_directory_recursive(&self, path: &Path) -> Result<bool, FsError> {
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(FsError::io(path, e)),
        };
        let removed = if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        removed.map_err(|e| FsError::io(path, e))?;
        debug!(path = %path.display(), "removed");
        Ok(true)
    }

    fn wait_for_file(&self, path: &Path, config: &WaitConfig) -> WaitOutcome {
        wait::wait_for_file(path, config)
    }

    fn directory_tree(&self, path: &Path) -> Result<Option<DirectoryTree>, FsError> {
        DirectoryTree::read(path)
    }
}
