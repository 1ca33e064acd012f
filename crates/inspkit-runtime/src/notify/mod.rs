#![forbid(unsafe_code)]

//! Change notification between inspector panels.
//!
//! This module provides the bus that keeps every panel showing an object in
//! sync after one of them edits it:
//!
//! - [`NotificationBus`]: registrations keyed by owner, broadcast with caller
//!   exclusion, per-registration debounce, undo/redo recording.
//! - [`Target`]: what a registration watches, either a fixed object or a
//!   resolver evaluated on every notification.
//! - [`ChangeOptions`]: what changed, who changed it, and how long to wait.
//! - [`OwnerScope`]: RAII guard that unregisters an owner on drop.
//!
//! # Architecture
//!
//! The bus is an explicit context object: construct it once when the editor
//! starts, hand clones to every panel, call [`NotificationBus::shutdown`] when
//! the editor closes. It uses `Rc`/`RefCell` and is single-threaded.
//! Callbacks that need the bus capture a [`WeakNotificationBus`]; a strong
//! handle inside a callback keeps the bus alive until `shutdown`.
//!
//! # Invariants
//!
//! 1. Registration ids increase monotonically and are never reused.
//! 2. Targets are resolved at notification time, not at registration time.
//! 3. Registrations are visited in registration order.
//! 4. A registration never sees a notification whose caller is its owner.
//! 5. At most one debounce timer is pending per registration.
//! 6. Undo/redo replays broadcast to every registration but never record a
//!    new history entry.

pub mod bus;
pub mod options;
pub mod target;

pub use bus::{NotificationBus, OwnerScope, WeakNotificationBus};
pub use options::{BusConfig, ChangeOptions, NotifyReport};
pub use target::Target;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a subscriber (typically one inspector panel).
///
/// Used to skip notifications the subscriber itself caused and to remove all
/// of its registrations at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Allocate a new, process-unique owner id.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Create an owner id from a raw value.
    ///
    /// Use this when the subscriber already has a stable numeric identity.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Owner({})", self.0)
    }
}

/// Id assigned to one registration. Informational: unregistration is keyed
/// by owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(u64);

impl RegistrationId {
    pub(crate) const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Registration({})", self.0)
    }
}
