#![forbid(unsafe_code)]

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors from file-system operations.
#[derive(Debug)]
pub enum FsError {
    /// An I/O call failed on `path`.
    Io { path: PathBuf, source: io::Error },
    /// `path` exists but is not a directory.
    NotADirectory { path: PathBuf },
    /// A glob pattern (listing or ignore) failed to compile.
    Pattern {
        pattern: String,
        source: globset::Error,
    },
    /// Directory traversal failed below `root`.
    Walk {
        root: PathBuf,
        source: walkdir::Error,
    },
}

impl FsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Path the failure is about, when there is one.
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Io { path, .. } | Self::NotADirectory { path } => Some(path),
            Self::Walk { root, source } => source.path().or(Some(root.as_path())),
            Self::Pattern { .. } => None,
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::NotADirectory { path } => {
                write!(f, "{} exists and is not a directory", path.display())
            }
            Self::Pattern { pattern, source } => {
                write!(f, "invalid glob pattern '{pattern}': {source}")
            }
            Self::Walk { root, source } => {
                write!(f, "walking {} failed: {source}", root.display())
            }
        }
    }
}

impl std::error::Error for FsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Pattern { source, .. } => Some(source),
            Self::Walk { source, .. } => Some(source),
            Self::NotADirectory { .. } => None,
        }
    }
}
