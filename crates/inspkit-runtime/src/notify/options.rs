#![forbid(unsafe_code)]

//! Options and configuration for the notification bus.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use super::OwnerId;
use crate::object::PropertyValue;

/// Bus-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// Push undo/redo entries for notifications that carry a property and
    /// both values. Ignored while no recorder is attached.
    pub record_history: bool,
    /// Tag recorded entries with a merge key (object + property) so a
    /// history with a merge window can collapse slider drags.
    pub merge_edits: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            record_history: true,
            merge_edits: true,
        }
    }
}

impl BusConfig {
    #[must_use]
    pub fn with_record_history(mut self, enabled: bool) -> Self {
        self.record_history = enabled;
        self
    }

    #[must_use]
    pub fn with_merge_edits(mut self, enabled: bool) -> Self {
        self.merge_edits = enabled;
        self
    }
}

/// Describes one change passed to [`NotificationBus::notify_change`].
///
/// Every field is optional. A history entry is recorded only when
/// `property`, `old_value` and `new_value` are all present; `Some(Null)` is a
/// real value here, not "unset".
///
/// [`NotificationBus::notify_change`]: super::NotificationBus::notify_change
#[derive(Clone, Default)]
pub struct ChangeOptions {
    /// Name of the changed property.
    pub property: Option<String>,
    pub old_value: Option<PropertyValue>,
    pub new_value: Option<PropertyValue>,
    /// Called after the recorded edit is undone or redone.
    pub on_undo_redo: Option<Rc<dyn Fn()>>,
    /// Subscriber that made the change; its registrations are skipped.
    pub caller: Option<OwnerId>,
    /// Debounce delay. `None` or zero dispatches synchronously.
    pub wait: Option<Duration>,
    replay: bool,
}

impl fmt::Debug for ChangeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeOptions")
            .field("property", &self.property)
            .field("old_value", &self.old_value)
            .field("new_value", &self.new_value)
            .field("on_undo_redo", &self.on_undo_redo.is_some())
            .field("caller", &self.caller)
            .field("wait", &self.wait)
            .field("replay", &self.replay)
            .finish()
    }
}

impl ChangeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options used when the history replays an edit.
    pub(crate) fn replay() -> Self {
        Self {
            replay: true,
            ..Self::default()
        }
    }

    /// Whether these options come from an undo/redo replay.
    #[must_use]
    pub fn is_replay(&self) -> bool {
        self.replay
    }

    #[must_use]
    pub fn property(mut self, name: impl Into<String>) -> Self {
        self.property = Some(name.into());
        self
    }

    #[must_use]
    pub fn old_value(mut self, value: impl Into<PropertyValue>) -> Self {
        self.old_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn new_value(mut self, value: impl Into<PropertyValue>) -> Self {
        self.new_value = Some(value.into());
        self
    }

    /// Set both sides of the edit.
    #[must_use]
    pub fn values(self, old: impl Into<PropertyValue>, new: impl Into<PropertyValue>) -> Self {
        self.old_value(old).new_value(new)
    }

    #[must_use]
    pub fn on_undo_redo(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_undo_redo = Some(Rc::new(callback));
        self
    }

    #[must_use]
    pub fn caller(mut self, owner: OwnerId) -> Self {
        self.caller = Some(owner);
        self
    }

    #[must_use]
    pub fn wait(mut self, delay: Duration) -> Self {
        self.wait = Some(delay);
        self
    }

    #[must_use]
    pub fn wait_ms(self, ms: u64) -> Self {
        self.wait(Duration::from_millis(ms))
    }

    /// Effective debounce delay, `None` for synchronous dispatch.
    pub(crate) fn debounce(&self) -> Option<Duration> {
        self.wait.filter(|d| !d.is_zero())
    }

    /// Property, old and new value when all three are present.
    pub(crate) fn recorded_edit(&self) -> Option<(&str, &PropertyValue, &PropertyValue)> {
        match (&self.property, &self.old_value, &self.new_value) {
            (Some(p), Some(old), Some(new)) => Some((p.as_str(), old, new)),
            _ => None,
        }
    }
}

/// What a single `notify_change` call did. Purely informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotifyReport {
    /// Registrations whose target matched and whose owner was not the caller.
    pub matched: usize,
    /// Callbacks invoked synchronously.
    pub dispatched: usize,
    /// Debounce timers (re)scheduled.
    pub scheduled: usize,
    /// Whether an undo/redo entry was pushed.
    pub recorded: bool,
}
