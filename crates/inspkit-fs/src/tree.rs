#![forbid(unsafe_code)]

//! Recursive directory snapshots for asset browsers.

use std::fs;
use std::path::{Path, PathBuf};

use crate::FsError;

/// Node kind in a [`DirectoryTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EntryKind {
    File,
    Directory,
}

/// A file or directory and, for directories, everything below it.
///
/// Directory sizes are the sum of their children. Children are sorted by
/// name. Symbolic links and other special files are left out.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectoryTree {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
    pub size: u64,
    /// Lower-cased extension with the leading dot, files only.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub extension: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub children: Vec<DirectoryTree>,
}

impl DirectoryTree {
    /// Snapshot `path`. Returns `Ok(None)` when nothing exists there.
    pub fn read(path: &Path) -> Result<Option<Self>, FsError> {
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FsError::io(path, e)),
        };
        if meta.is_dir() {
            Self::read_dir(path).map(Some)
        } else if meta.is_file() {
            Ok(Some(Self::file(path, meta.len())))
        } else {
            Ok(None)
        }
    }

    fn file(path: &Path, size: u64) -> Self {
        Self {
            name: file_name(path),
            path: path.to_path_buf(),
            kind: EntryKind::File,
            size,
            extension: path
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase())),
            children: Vec::new(),
        }
    }

    fn read_dir(path: &Path) -> Result<Self, FsError> {
        let mut children = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| FsError::io(path, e))? {
            let entry = entry.map_err(|e| FsError::io(path, e))?;
            let child = entry.path();
            let file_type = entry.file_type().map_err(|e| FsError::io(&child, e))?;
            if file_type.is_dir() {
                children.push(Self::read_dir(&child)?);
            } else if file_type.is_file() {
                let len = entry.metadata().map_err(|e| FsError::io(&child, e))?.len();
                children.push(Self::file(&child, len));
            }
        }
        children.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Self {
            name: file_name(path),
            path: path.to_path_buf(),
            kind: EntryKind::Directory,
            size: children.iter().map(|c| c.size).sum(),
            extension: None,
            children,
        })
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Number of files anywhere below this node (1 for a file).
    #[must_use]
    pub fn file_count(&self) -> usize {
        match self.kind {
            EntryKind::File => 1,
            EntryKind::Directory => self.children.iter().map(Self::file_count).sum(),
        }
    }

    /// Depth-first iterator over this node and all descendants.
    pub fn iter(&self) -> impl Iterator<Item = &DirectoryTree> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Child with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&DirectoryTree> {
        self.children.iter().find(|c| c.name == name)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.to_string_lossy().into_owned(),
        |name| name.to_string_lossy().into_owned(),
    )
}
