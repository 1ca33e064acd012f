#![forbid(unsafe_code)]

//! Undo/redo history for inspector edits.
//!
//! Every recorded edit is an [`UndoEntry`]: three closures supplied by the
//! producer (undo, redo, and a `common` step run after either) plus a
//! description for menus. The history never inspects what the closures touch.
//!
//! - [`UndoRecorder`]: the producer-side seam; the notification bus only
//!   ever calls `push`.
//! - [`HistoryManager`]: dual undo/redo stacks with depth limits and
//!   optional merging of rapid edits to the same property.
//! - [`UndoHistory`]: shared handle over a `HistoryManager` that runs entry
//!   closures outside its borrow, so they may re-enter the history.
//!
//! # Invariants
//!
//! 1. `undo_depth() <= config.max_depth` after any operation.
//! 2. The redo stack is cleared whenever a new entry is pushed.
//! 3. A failed undo/redo leaves the entry on the stack it came from.

pub mod entry;
pub mod history;

pub use entry::{MergeKey, UndoEntry};
pub use history::{HistoryConfig, HistoryManager, UndoHistory};

use std::fmt;

use crate::object::PropertyError;

/// Producer-side interface of an undo/redo history.
pub trait UndoRecorder {
    /// Record an edit that has already been applied.
    fn push(&self, entry: UndoEntry);
}

/// Errors raised while undoing or redoing an entry.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoError {
    /// The edited object no longer exists.
    ObjectDropped { description: String },
    /// Writing the value back was rejected by the object.
    Property(PropertyError),
    /// Any other failure reported by an entry closure.
    Failed(String),
}

impl fmt::Display for UndoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ObjectDropped { description } => {
                write!(f, "cannot replay '{description}': object was dropped")
            }
            Self::Property(err) => write!(f, "property write failed: {err}"),
            Self::Failed(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for UndoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Property(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PropertyError> for UndoError {
    fn from(err: PropertyError) -> Self {
        Self::Property(err)
    }
}
