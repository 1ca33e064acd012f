#![forbid(unsafe_code)]

//! The notification bus.
//!
//! # Design
//!
//! [`NotificationBus`] keeps an ordered list of registrations in shared,
//! reference-counted storage (`Rc<..>` with `RefCell`/`Cell` interiors).
//! A broadcast first snapshots the list, releases the borrow, then visits the
//! snapshot in registration order. Callbacks may therefore register,
//! unregister, or notify re-entrantly; a registration removed mid-broadcast
//! is flagged and skipped by the rest of that broadcast.
//!
//! Debounce timers live in the injected [`TimerService`]. Each registration
//! stores at most one pending handle; scheduling a new one cancels the old.
//!
//! # Performance
//!
//! | Operation         | Complexity                      |
//! |-------------------|---------------------------------|
//! | `register()`      | O(1) amortized                  |
//! | `unregister()`    | O(R) where R = registrations    |
//! | `notify_change()` | O(R) plus resolver calls        |
//!
//! # Failure Modes
//!
//! - **Panicking callback**: the panic propagates to the `notify_change`
//!   caller; the bus does not catch or log it. Remaining registrations of
//!   that broadcast are not visited.
//! - **Dropped object**: `Direct` targets stop matching; recorded history
//!   entries fail with [`UndoError::ObjectDropped`].
//!
//! [`UndoError::ObjectDropped`]: crate::undo::UndoError::ObjectDropped

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::{debug, trace};

use super::options::{BusConfig, ChangeOptions, NotifyReport};
use super::target::Target;
use super::{OwnerId, RegistrationId};
use crate::object::{ObjectHandle, PropertyValue};
use crate::timer::{TimerHandle, TimerService};
use crate::undo::{MergeKey, UndoEntry, UndoError, UndoRecorder};

struct Registration {
    id: RegistrationId,
    owner: OwnerId,
    target: Target,
    callback: Box<dyn Fn()>,
    pending_timer: Cell<Option<TimerHandle>>,
    /// Set when unregistered; snapshots taken earlier skip it.
    removed: Cell<bool>,
}

struct BusInner {
    config: BusConfig,
    next_id: Cell<u64>,
    registrations: RefCell<Vec<Rc<Registration>>>,
    timers: Rc<dyn TimerService>,
    recorder: RefCell<Option<Rc<dyn UndoRecorder>>>,
}

impl BusInner {
    fn cancel_pending(&self, registrations: &[Rc<Registration>]) {
        for reg in registrations {
            reg.removed.set(true);
            if let Some(handle) = reg.pending_timer.take() {
                self.timers.cancel(handle);
            }
        }
    }
}

impl Drop for BusInner {
    fn drop(&mut self) {
        let registrations = std::mem::take(self.registrations.get_mut());
        self.cancel_pending(&registrations);
    }
}

/// Change-notification bus shared by every inspector panel.
///
/// Cloning a `NotificationBus` creates a new handle to the **same** bus.
///
/// Dropping the last handle cancels every pending debounce timer, but a
/// callback that captures a strong handle keeps the bus alive through its
/// own registration. Callbacks should capture a [`WeakNotificationBus`]
/// from [`downgrade`](Self::downgrade); [`shutdown`](Self::shutdown) tears
/// the bus down either way.
#[derive(Clone)]
pub struct NotificationBus {
    inner: Rc<BusInner>,
}

impl fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationBus")
            .field("registrations", &self.registration_count())
            .field("pending_timers", &self.pending_timer_count())
            .field("has_recorder", &self.inner.recorder.borrow().is_some())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl NotificationBus {
    /// Create a bus that schedules debounced callbacks on `timers`.
    pub fn new(timers: impl TimerService + 'static) -> Self {
        Self::with_config(timers, BusConfig::default())
    }

    pub fn with_config(timers: impl TimerService + 'static, config: BusConfig) -> Self {
        Self {
            inner: Rc::new(BusInner {
                config,
                next_id: Cell::new(0),
                registrations: RefCell::new(Vec::new()),
                timers: Rc::new(timers),
                recorder: RefCell::new(None),
            }),
        }
    }

    /// Attach the undo/redo history that edits are recorded into.
    pub fn set_recorder(&self, recorder: impl UndoRecorder + 'static) {
        *self.inner.recorder.borrow_mut() = Some(Rc::new(recorder));
    }

    /// Stop recording edits.
    pub fn clear_recorder(&self) {
        self.inner.recorder.borrow_mut().take();
    }

    #[must_use]
    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    /// Non-owning handle, for callbacks that notify or unregister.
    #[must_use]
    pub fn downgrade(&self) -> WeakNotificationBus {
        WeakNotificationBus {
            inner: Rc::downgrade(&self.inner),
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Watch `target` on behalf of `owner`. Always succeeds.
    ///
    /// The returned id is informational; remove registrations with
    /// [`unregister`](Self::unregister).
    pub fn register(
        &self,
        owner: OwnerId,
        target: impl Into<Target>,
        callback: impl Fn() + 'static,
    ) -> RegistrationId {
        let id = RegistrationId::new(self.inner.next_id.get() + 1);
        self.inner.next_id.set(id.raw());

        let registration = Rc::new(Registration {
            id,
            owner,
            target: target.into(),
            callback: Box::new(callback),
            pending_timer: Cell::new(None),
            removed: Cell::new(false),
        });
        self.inner.registrations.borrow_mut().push(registration);

        debug!(registration = id.raw(), owner = owner.raw(), "register");
        id
    }

    /// Remove every registration of `owner`, cancelling their pending
    /// debounce timers. Returns how many were removed; zero is not an error.
    pub fn unregister(&self, owner: OwnerId) -> usize {
        let removed: Vec<Rc<Registration>> = {
            let mut registrations = self.inner.registrations.borrow_mut();
            let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut *registrations)
                .into_iter()
                .partition(|reg| reg.owner == owner);
            *registrations = kept;
            removed
        };
        self.inner.cancel_pending(&removed);

        if !removed.is_empty() {
            debug!(owner = owner.raw(), count = removed.len(), "unregister");
        }
        removed.len()
    }

    /// Guard that unregisters `owner` when dropped.
    #[must_use]
    pub fn scope(&self, owner: OwnerId) -> OwnerScope {
        OwnerScope {
            bus: Rc::downgrade(&self.inner),
            owner,
        }
    }

    // ========================================================================
    // Notification
    // ========================================================================

    /// Tell every watcher of `object` that it changed.
    ///
    /// 1. Records an undo/redo entry when the options carry a property and
    ///    both values (never for undo/redo replays).
    /// 2. Visits registrations in order, skipping the caller's own and those
    ///    watching another object.
    /// 3. Invokes each matching callback now, or after `wait` with any earlier
    ///    pending timer of that registration cancelled.
    pub fn notify_change(&self, object: &ObjectHandle, options: ChangeOptions) -> NotifyReport {
        let mut report = NotifyReport {
            recorded: self.record(object, &options),
            ..NotifyReport::default()
        };

        let snapshot: Vec<Rc<Registration>> = self.inner.registrations.borrow().clone();
        let debounce = options.debounce();

        for reg in &snapshot {
            if reg.removed.get() {
                continue;
            }
            if options.caller == Some(reg.owner) {
                continue;
            }
            if !reg.target.matches(object) {
                continue;
            }
            // A resolver may have unregistered this entry.
            if reg.removed.get() {
                continue;
            }

            report.matched += 1;
            match debounce {
                Some(wait) => {
                    self.schedule_debounced(reg, wait);
                    report.scheduled += 1;
                }
                None => {
                    trace!(registration = reg.id.raw(), "dispatch");
                    (reg.callback)();
                    report.dispatched += 1;
                }
            }
        }

        trace!(
            object = object.addr(),
            matched = report.matched,
            dispatched = report.dispatched,
            scheduled = report.scheduled,
            recorded = report.recorded,
            replay = options.is_replay(),
            "notify_change"
        );
        report
    }

    fn schedule_debounced(&self, reg: &Rc<Registration>, wait: Duration) {
        if let Some(previous) = reg.pending_timer.take() {
            self.inner.timers.cancel(previous);
        }

        let weak = Rc::downgrade(reg);
        let handle = self.inner.timers.schedule(
            wait,
            Box::new(move || {
                let Some(reg) = weak.upgrade() else {
                    return;
                };
                reg.pending_timer.set(None);
                if reg.removed.get() {
                    return;
                }
                trace!(registration = reg.id.raw(), "dispatch (debounced)");
                (reg.callback)();
            }),
        );
        reg.pending_timer.set(Some(handle));
    }

    /// Push an undo/redo entry for the edit described by `options`.
    fn record(&self, object: &ObjectHandle, options: &ChangeOptions) -> bool {
        if options.is_replay() || !self.inner.config.record_history {
            return false;
        }
        let Some((property, old_value, new_value)) = options.recorded_edit() else {
            return false;
        };
        // Clone out so the recorder runs without the bus borrowed.
        let Some(recorder) = self.inner.recorder.borrow().clone() else {
            return false;
        };

        let description = format!("Change {}.{property}", object.type_name());
        let bus = Rc::downgrade(&self.inner);
        let on_undo_redo = options.on_undo_redo.clone();

        let common = {
            let target = object.downgrade();
            move || {
                if let (Some(inner), Some(object)) = (bus.upgrade(), target.upgrade()) {
                    NotificationBus { inner }.notify_change(&object, ChangeOptions::replay());
                }
                if let Some(callback) = &on_undo_redo {
                    callback();
                }
            }
        };
        let undo = write_back(object, property, old_value.clone(), &description);
        let redo = write_back(object, property, new_value.clone(), &description);

        let mut entry = UndoEntry::new(description, undo, redo).with_common(common);
        if self.inner.config.merge_edits {
            entry = entry.with_merge_key(MergeKey::new(object.addr(), property));
        }

        debug!(description = entry.description(), "record edit");
        recorder.push(entry);
        true
    }

    // ========================================================================
    // Introspection & teardown
    // ========================================================================

    #[must_use]
    pub fn registration_count(&self) -> usize {
        self.inner.registrations.borrow().len()
    }

    /// Ids of `owner`'s registrations, in registration order.
    #[must_use]
    pub fn registrations_of(&self, owner: OwnerId) -> Vec<RegistrationId> {
        self.inner
            .registrations
            .borrow()
            .iter()
            .filter(|reg| reg.owner == owner)
            .map(|reg| reg.id)
            .collect()
    }

    /// Registrations with a debounce timer in flight.
    #[must_use]
    pub fn pending_timer_count(&self) -> usize {
        self.inner
            .registrations
            .borrow()
            .iter()
            .filter(|reg| reg.pending_timer.get().is_some())
            .count()
    }

    /// Tear the bus down: cancel every pending timer, drop every
    /// registration, detach the recorder.
    pub fn shutdown(&self) {
        let registrations = std::mem::take(&mut *self.inner.registrations.borrow_mut());
        self.inner.cancel_pending(&registrations);
        self.clear_recorder();
        debug!(count = registrations.len(), "bus shutdown");
    }
}

/// Bus handle that does not keep the bus alive.
#[derive(Clone, Default)]
pub struct WeakNotificationBus {
    inner: Weak<BusInner>,
}

impl WeakNotificationBus {
    /// `None` once every strong handle is gone.
    #[must_use]
    pub fn upgrade(&self) -> Option<NotificationBus> {
        self.inner.upgrade().map(|inner| NotificationBus { inner })
    }
}

impl fmt::Debug for WeakNotificationBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakNotificationBus")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Undo/redo step that writes `value` back into `property` of `object`.
fn write_back(
    object: &ObjectHandle,
    property: &str,
    value: PropertyValue,
    description: &str,
) -> impl FnMut() -> Result<(), UndoError> + use<> {
    let target = object.downgrade();
    let property = property.to_string();
    let description = description.to_string();
    move || {
        let object = target.upgrade().ok_or_else(|| UndoError::ObjectDropped {
            description: description.clone(),
        })?;
        object.set(&property, value.clone())?;
        Ok(())
    }
}

/// Unregisters its owner from the bus when dropped.
///
/// Holds the bus weakly; dropping the guard after the bus is gone is a no-op.
pub struct OwnerScope {
    bus: Weak<BusInner>,
    owner: OwnerId,
}

impl OwnerScope {
    #[must_use]
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Register on behalf of the scoped owner. `None` if the bus is gone.
    pub fn register(
        &self,
        target: impl Into<Target>,
        callback: impl Fn() + 'static,
    ) -> Option<RegistrationId> {
        let inner = self.bus.upgrade()?;
        Some(NotificationBus { inner }.register(self.owner, target, callback))
    }
}

impl Drop for OwnerScope {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            NotificationBus { inner }.unregister(self.owner);
        }
    }
}

impl fmt::Debug for OwnerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerScope")
            .field("owner", &self.owner)
            .field("bus_alive", &(self.bus.strong_count() > 0))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
