#![forbid(unsafe_code)]

//! A single reversible edit.

use std::fmt;
use std::time::Duration;

use web_time::Instant;

use super::UndoError;

type StepFn = Box<dyn FnMut() -> Result<(), UndoError>>;
type CommonFn = Box<dyn FnMut()>;

/// Identifies "the same edit target" for merging: one property of one object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MergeKey {
    object: usize,
    property: String,
}

impl MergeKey {
    /// `object` is an identity token, typically [`ObjectHandle::addr`].
    ///
    /// [`ObjectHandle::addr`]: crate::object::ObjectHandle::addr
    #[must_use]
    pub fn new(object: usize, property: impl Into<String>) -> Self {
        Self {
            object,
            property: property.into(),
        }
    }

    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }
}

/// An already-applied edit that can be reverted and re-applied.
///
/// `undo` and `redo` restore one side of the edit; `common` runs after either
/// of them succeeds (used to refresh whoever displays the edited object).
pub struct UndoEntry {
    description: String,
    undo: StepFn,
    redo: StepFn,
    common: Option<CommonFn>,
    merge_key: Option<MergeKey>,
    recorded_at: Instant,
}

impl fmt::Debug for UndoEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoEntry")
            .field("description", &self.description)
            .field("has_common", &self.common.is_some())
            .field("merge_key", &self.merge_key)
            .finish_non_exhaustive()
    }
}

impl UndoEntry {
    pub fn new(
        description: impl Into<String>,
        undo: impl FnMut() -> Result<(), UndoError> + 'static,
        redo: impl FnMut() -> Result<(), UndoError> + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            undo: Box::new(undo),
            redo: Box::new(redo),
            common: None,
            merge_key: None,
            recorded_at: Instant::now(),
        }
    }

    /// Step run after every successful undo or redo.
    #[must_use]
    pub fn with_common(mut self, common: impl FnMut() + 'static) -> Self {
        self.common = Some(Box::new(common));
        self
    }

    #[must_use]
    pub fn with_merge_key(mut self, key: MergeKey) -> Self {
        self.merge_key = Some(key);
        self
    }

    /// Override the recording timestamp (merge windows are measured from it).
    #[must_use]
    pub fn recorded_at(mut self, at: Instant) -> Self {
        self.recorded_at = at;
        self
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn merge_key(&self) -> Option<&MergeKey> {
        self.merge_key.as_ref()
    }

    /// Revert the edit, then run `common`.
    pub fn undo(&mut self) -> Result<(), UndoError> {
        (self.undo)()?;
        self.run_common();
        Ok(())
    }

    /// Re-apply the edit, then run `common`.
    pub fn redo(&mut self) -> Result<(), UndoError> {
        (self.redo)()?;
        self.run_common();
        Ok(())
    }

    fn run_common(&mut self) {
        if let Some(common) = self.common.as_mut() {
            common();
        }
    }

    /// Whether `newer` continues this edit within `window`.
    pub(crate) fn can_merge(&self, newer: &UndoEntry, window: Duration) -> bool {
        let (Some(mine), Some(theirs)) = (&self.merge_key, &newer.merge_key) else {
            return false;
        };
        mine == theirs && newer.recorded_at.saturating_duration_since(self.recorded_at) <= window
    }

    /// Absorb `newer`: keep our undo (oldest value), take its redo (newest
    /// value) and its refresh step.
    pub(crate) fn absorb(&mut self, newer: UndoEntry) {
        self.redo = newer.redo;
        if newer.common.is_some() {
            self.common = newer.common;
        }
        self.recorded_at = newer.recorded_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn counter_entry(value: &Rc<Cell<i32>>, old: i32, new: i32) -> UndoEntry {
        let v1 = Rc::clone(value);
        let v2 = Rc::clone(value);
        UndoEntry::new(
            "Set value",
            move || {
                v1.set(old);
                Ok(())
            },
            move || {
                v2.set(new);
                Ok(())
            },
        )
    }

    #[test]
    fn undo_then_common() {
        let value = Rc::new(Cell::new(2));
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let v = Rc::clone(&value);
        let mut entry = counter_entry(&value, 1, 2).with_common(move || l.borrow_mut().push(v.get()));

        entry.undo().unwrap();
        assert_eq!(value.get(), 1);
        entry.redo().unwrap();
        assert_eq!(value.get(), 2);
        // common observed the value after each step
        assert_eq!(*log.borrow(), vec![1, 2]);
    }

    #[test]
    fn failed_step_skips_common() {
        let ran = Rc::new(Cell::new(false));
        let r = Rc::clone(&ran);
        let mut entry = UndoEntry::new(
            "Broken",
            || Err(UndoError::Failed("nope".into())),
            || Ok(()),
        )
        .with_common(move || r.set(true));

        assert_eq!(entry.undo(), Err(UndoError::Failed("nope".into())));
        assert!(!ran.get());
    }

    #[test]
    fn merge_requires_same_key_and_window() {
        let value = Rc::new(Cell::new(0));
        let t0 = Instant::now();
        let key = MergeKey::new(1, "x");
        let a = counter_entry(&value, 0, 1).with_merge_key(key.clone()).recorded_at(t0);
        let b = counter_entry(&value, 1, 2)
            .with_merge_key(key.clone())
            .recorded_at(t0 + Duration::from_millis(100));
        let c = counter_entry(&value, 1, 2)
            .with_merge_key(MergeKey::new(1, "y"))
            .recorded_at(t0 + Duration::from_millis(100));
        let d = counter_entry(&value, 1, 2);

        assert!(a.can_merge(&b, Duration::from_millis(100)));
        assert!(!a.can_merge(&b, Duration::from_millis(99)));
        assert!(!a.can_merge(&c, Duration::from_secs(1)));
        assert!(!a.can_merge(&d, Duration::from_secs(1)));
    }

    #[test]
    fn absorb_keeps_oldest_undo_and_newest_redo() {
        let value = Rc::new(Cell::new(3));
        let mut a = counter_entry(&value, 1, 2);
        let b = counter_entry(&value, 2, 3);
        a.absorb(b);

        a.undo().unwrap();
        assert_eq!(value.get(), 1);
        a.redo().unwrap();
        assert_eq!(value.get(), 3);
    }
}
