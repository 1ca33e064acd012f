#![forbid(unsafe_code)]

//! History stack for undo/redo operations.
//!
//! This module provides the [`HistoryManager`] which maintains dual stacks
//! for undo and redo operations with support for:
//!
//! - **Depth limits**: Oldest entries evicted past `max_depth`
//! - **Branch handling**: New edits clear the redo stack
//! - **Merging**: Rapid edits to the same property collapse into one entry
//!
//! [`UndoHistory`] wraps a manager in shared storage and is what editors hand
//! to the notification bus as its [`UndoRecorder`].
//!
//! ```text
//! push(e5)
//! ┌───────────────────────────────────────────────┐
//! │ Undo Stack: [e1, e2, e3, e4, e5]              │
//! │ Redo Stack: []                                │
//! └───────────────────────────────────────────────┘
//!
//! undo() x2
//! ┌───────────────────────────────────────────────┐
//! │ Undo Stack: [e1, e2, e3]                      │
//! │ Redo Stack: [e4, e5]                          │
//! └───────────────────────────────────────────────┘
//!
//! push(e6)  <-- new branch, clears redo
//! ┌───────────────────────────────────────────────┐
//! │ Undo Stack: [e1, e2, e3, e6]                  │
//! │ Redo Stack: []                                │
//! └───────────────────────────────────────────────┘
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, warn};

use super::entry::UndoEntry;
use super::{UndoError, UndoRecorder};

/// Configuration for the history manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of entries kept in undo history.
    pub max_depth: usize,
    /// Entries with the same merge key pushed within this window collapse
    /// into one. `None` disables merging.
    pub merge_window: Option<Duration>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: 100,
            merge_window: None,
        }
    }
}

impl HistoryConfig {
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            merge_window: None,
        }
    }

    /// Collapse rapid edits of one property (e.g. a dragged slider).
    #[must_use]
    pub fn with_merge_window(mut self, window: Duration) -> Self {
        self.merge_window = Some(window);
        self
    }

    /// Create unlimited configuration (for testing).
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_depth: usize::MAX,
            merge_window: None,
        }
    }
}

/// Manager for undo/redo history.
pub struct HistoryManager {
    /// Entries available for undo (newest at back).
    undo_stack: VecDeque<UndoEntry>,
    /// Entries available for redo (newest at back).
    redo_stack: VecDeque<UndoEntry>,
    config: HistoryConfig,
}

impl fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryManager")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl HistoryManager {
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            config,
        }
    }

    // ========================================================================
    // Core Operations
    // ========================================================================

    /// Push an entry onto the undo stack.
    ///
    /// This clears the redo stack (new branch) and enforces limits.
    /// The entry is NOT executed - the edit is assumed to be applied already.
    pub fn push(&mut self, entry: UndoEntry) {
        self.redo_stack.clear();

        let entry = match self.try_merge(entry) {
            Ok(()) => return,
            Err(entry) => entry,
        };

        debug!(description = entry.description(), "history push");
        self.undo_stack.push_back(entry);
        self.enforce_limits();
    }

    /// Undo the newest entry.
    ///
    /// # Returns
    ///
    /// - `Some(Ok(description))` if undo succeeded
    /// - `Some(Err(error))` if undo failed (entry remains on undo stack)
    /// - `None` if there is nothing to undo
    pub fn undo(&mut self) -> Option<Result<String, UndoError>> {
        let mut entry = self.undo_stack.pop_back()?;
        let result = entry.undo();
        Some(self.finish_undo(entry, result))
    }

    /// Redo the newest undone entry.
    ///
    /// # Returns
    ///
    /// - `Some(Ok(description))` if redo succeeded
    /// - `Some(Err(error))` if redo failed (entry remains on redo stack)
    /// - `None` if there is nothing to redo
    pub fn redo(&mut self) -> Option<Result<String, UndoError>> {
        let mut entry = self.redo_stack.pop_back()?;
        let result = entry.redo();
        Some(self.finish_redo(entry, result))
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    // ========================================================================
    // Info
    // ========================================================================

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Descriptions of undo entries, most recent first.
    pub fn undo_descriptions(&self, limit: usize) -> Vec<&str> {
        self.undo_stack
            .iter()
            .rev()
            .take(limit)
            .map(|e| e.description())
            .collect()
    }

    /// Descriptions of redo entries, most recent first.
    pub fn redo_descriptions(&self, limit: usize) -> Vec<&str> {
        self.redo_stack
            .iter()
            .rev()
            .take(limit)
            .map(|e| e.description())
            .collect()
    }

    #[must_use]
    pub fn next_undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.description())
    }

    #[must_use]
    pub fn next_redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|e| e.description())
    }

    #[must_use]
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Clear all history (both undo and redo).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn take_undo(&mut self) -> Option<UndoEntry> {
        self.undo_stack.pop_back()
    }

    fn take_redo(&mut self) -> Option<UndoEntry> {
        self.redo_stack.pop_back()
    }

    fn finish_undo(
        &mut self,
        entry: UndoEntry,
        result: Result<(), UndoError>,
    ) -> Result<String, UndoError> {
        let description = entry.description().to_string();
        match result {
            Ok(()) => {
                debug!(description = %description, "undo");
                self.redo_stack.push_back(entry);
                Ok(description)
            }
            Err(err) => {
                warn!(description = %description, error = %err, "undo failed");
                self.undo_stack.push_back(entry);
                Err(err)
            }
        }
    }

    fn finish_redo(
        &mut self,
        entry: UndoEntry,
        result: Result<(), UndoError>,
    ) -> Result<String, UndoError> {
        let description = entry.description().to_string();
        match result {
            Ok(()) => {
                debug!(description = %description, "redo");
                self.undo_stack.push_back(entry);
                self.enforce_limits();
                Ok(description)
            }
            Err(err) => {
                warn!(description = %description, error = %err, "redo failed");
                self.redo_stack.push_back(entry);
                Err(err)
            }
        }
    }

    /// Evict oldest entries past the depth limit.
    fn enforce_limits(&mut self) {
        while self.undo_stack.len() > self.config.max_depth {
            if let Some(evicted) = self.undo_stack.pop_front() {
                debug!(description = evicted.description(), "history evict");
            }
        }
    }

    /// Try to merge an entry into the last one on the undo stack.
    ///
    /// Returns `Ok(())` if merged, `Err(entry)` if not merged.
    fn try_merge(&mut self, entry: UndoEntry) -> Result<(), UndoEntry> {
        let Some(window) = self.config.merge_window else {
            return Err(entry);
        };
        let Some(last) = self.undo_stack.back_mut() else {
            return Err(entry);
        };
        if !last.can_merge(&entry, window) {
            return Err(entry);
        }
        debug!(description = entry.description(), "history merge");
        last.absorb(entry);
        Ok(())
    }
}

/// Shared handle over a [`HistoryManager`].
///
/// Cloning an `UndoHistory` creates a new handle to the **same** stacks.
/// Entry closures run while the manager is *not* borrowed, so a `common`
/// step may query the history (e.g. to refresh toolbar state) or push new
/// entries without panicking.
#[derive(Clone, Default)]
pub struct UndoHistory {
    inner: Rc<RefCell<HistoryManager>>,
}

impl fmt::Debug for UndoHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(manager) => fmt::Debug::fmt(&*manager, f),
            Err(_) => f.write_str("UndoHistory(<busy>)"),
        }
    }
}

impl UndoHistory {
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(HistoryManager::new(config))),
        }
    }

    /// See [`HistoryManager::undo`].
    pub fn undo(&self) -> Option<Result<String, UndoError>> {
        let mut entry = self.inner.borrow_mut().take_undo()?;
        let result = entry.undo();
        Some(self.inner.borrow_mut().finish_undo(entry, result))
    }

    /// See [`HistoryManager::redo`].
    pub fn redo(&self) -> Option<Result<String, UndoError>> {
        let mut entry = self.inner.borrow_mut().take_redo()?;
        let result = entry.redo();
        Some(self.inner.borrow_mut().finish_redo(entry, result))
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.inner.borrow().can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.inner.borrow().can_redo()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.inner.borrow().undo_depth()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.inner.borrow().redo_depth()
    }

    #[must_use]
    pub fn next_undo_description(&self) -> Option<String> {
        self.inner.borrow().next_undo_description().map(str::to_string)
    }

    #[must_use]
    pub fn next_redo_description(&self) -> Option<String> {
        self.inner.borrow().next_redo_description().map(str::to_string)
    }

    /// Up to `limit` undo descriptions, newest first.
    #[must_use]
    pub fn undo_descriptions(&self, limit: usize) -> Vec<String> {
        let manager = self.inner.borrow();
        manager
            .undo_descriptions(limit)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[must_use]
    pub fn redo_descriptions(&self, limit: usize) -> Vec<String> {
        let manager = self.inner.borrow();
        manager
            .redo_descriptions(limit)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn clear(&self) {
        // Entry closures may hold handles back into this history; drop them
        // after the borrow ends.
        let (undo, redo) = {
            let mut manager = self.inner.borrow_mut();
            (
                std::mem::take(&mut manager.undo_stack),
                std::mem::take(&mut manager.redo_stack),
            )
        };
        drop((undo, redo));
    }

    /// Read-only access to the underlying manager.
    pub fn with<R>(&self, f: impl FnOnce(&HistoryManager) -> R) -> R {
        f(&self.inner.borrow())
    }
}

impl UndoRecorder for UndoHistory {
    fn push(&self, entry: UndoEntry) {
        self.inner.borrow_mut().push(entry);
    }
}

// ============================================================================
// Tests
// ============================================================================
