#![forbid(unsafe_code)]

//! Runtime: change notification, undo/redo history, and timers for
//! property inspectors.
//!
//! # Role in inspkit
//! `inspkit-runtime` is the glue between property editors and the panels
//! that display the same objects. An editor mutates an object, then calls
//! [`NotificationBus::notify_change`]; every other panel watching that object
//! is refreshed, and the edit lands in the [`UndoHistory`] so it can be
//! reverted later.
//!
//! # Primary responsibilities
//! - **Object model**: [`Inspectable`] capability trait, identity-compared
//!   [`ObjectHandle`], and the [`PropertyValue`] enum.
//! - **Notification bus**: registration by owner, caller exclusion,
//!   resolver targets, per-registration debounce.
//! - **Undo/redo**: [`HistoryManager`] stacks behind the [`UndoRecorder`] seam.
//! - **Timers**: the single-threaded [`TimerQueue`] that drives debounce.
//!
//! # Threading
//! Everything here is single-threaded (`Rc`/`RefCell`). The host event loop
//! owns the bus and the timer queue, and calls [`TimerQueue::run_due`] on
//! every iteration.

pub mod notify;
pub mod object;
pub mod timer;
pub mod undo;

pub use notify::{
    BusConfig, ChangeOptions, NotificationBus, NotifyReport, OwnerId, OwnerScope, RegistrationId,
    Target, WeakNotificationBus,
};
pub use object::{
    Inspectable, ObjectHandle, PropertyBag, PropertyError, PropertyValue, WeakObjectHandle,
};
pub use timer::{Clock, ManualClock, SystemClock, TimerHandle, TimerQueue, TimerService};
pub use undo::{HistoryConfig, HistoryManager, MergeKey, UndoEntry, UndoError, UndoHistory, UndoRecorder};
