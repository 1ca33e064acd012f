#![forbid(unsafe_code)]

//! Glob pattern compilation for recursive listing.
//!
//! A listing pattern such as `assets/**/*.png` is split into its literal base
//! directory (`assets`) and the full glob. Only the base is walked, and every
//! regular file found is matched against the glob as a whole path.

use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};

use crate::FsError;

const META: &[char] = &['*', '?', '[', ']', '{', '}'];

fn has_meta(s: &str) -> bool {
    s.contains(META)
}

/// A compiled listing pattern.
#[derive(Debug, Clone)]
pub struct FilePattern {
    raw: String,
    base: PathBuf,
    matcher: GlobMatcher,
    max_depth: Option<usize>,
}

impl FilePattern {
    /// Compile `pattern`. `*` and `?` never match a path separator; `**`
    /// matches any number of directories.
    pub fn new(pattern: &str) -> Result<Self, FsError> {
        let matcher = compile(pattern)?.compile_matcher();

        let mut base = PathBuf::new();
        let mut glob_depth = 0usize;
        let mut recursive = false;
        let mut in_glob = false;
        for component in Path::new(pattern).components() {
            let text = component.as_os_str().to_string_lossy();
            if !in_glob && !has_meta(&text) {
                base.push(component);
                continue;
            }
            in_glob = true;
            if matches!(component, Component::Normal(_)) {
                glob_depth += 1;
                recursive |= text.contains("**");
            }
        }

        Ok(Self {
            raw: pattern.to_string(),
            base,
            matcher,
            max_depth: (!recursive).then_some(glob_depth),
        })
    }

    /// The pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Literal directory prefix; empty for patterns like `*.rs`.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Deepest level below `base` a match can sit at, `None` with `**`.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    #[must_use]
    pub fn is_match(&self, path: &Path) -> bool {
        self.matcher.is_match(path)
    }
}

/// A set of ignore globs. Empty sets match nothing.
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    set: GlobSet,
}

impl IgnoreSet {
    pub fn new(patterns: &[&str]) -> Result<Self, FsError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(compile(pattern)?);
        }
        let set = builder.build().map_err(|source| FsError::Pattern {
            pattern: patterns.join(", "),
            source,
        })?;
        Ok(Self { set })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    #[must_use]
    pub fn is_match(&self, path: &Path) -> bool {
        self.set.is_match(path)
    }
}

fn compile(pattern: &str) -> Result<Glob, FsError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| FsError::Pattern {
            pattern: pattern.to_string(),
            source,
        })
}
