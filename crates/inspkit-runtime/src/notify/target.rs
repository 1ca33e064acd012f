#![forbid(unsafe_code)]

//! What a registration watches.

use std::fmt;

use crate::object::{ObjectHandle, WeakObjectHandle};

type ResolverFn = Box<dyn Fn() -> Option<ObjectHandle>>;

/// The object a registration compares notifications against.
///
/// `Direct` holds the object weakly: watching an object never keeps it
/// alive. `Resolver` is evaluated on every notification, which lets a panel
/// follow "whatever is selected right now" without re-registering.
pub enum Target {
    Direct(WeakObjectHandle),
    Resolver(ResolverFn),
}

impl Target {
    #[must_use]
    pub fn direct(object: &ObjectHandle) -> Self {
        Self::Direct(object.downgrade())
    }

    pub fn resolver(resolve: impl Fn() -> Option<ObjectHandle> + 'static) -> Self {
        Self::Resolver(Box::new(resolve))
    }

    /// Current watched object, if any.
    #[must_use]
    pub fn resolve(&self) -> Option<ObjectHandle> {
        match self {
            Self::Direct(weak) => weak.upgrade(),
            Self::Resolver(resolve) => resolve(),
        }
    }

    /// Whether `object` is the watched object (identity, not equality).
    #[must_use]
    pub fn matches(&self, object: &ObjectHandle) -> bool {
        match self {
            Self::Direct(weak) => weak.points_to(object),
            Self::Resolver(resolve) => resolve().is_some_and(|current| current.ptr_eq(object)),
        }
    }
}

impl From<&ObjectHandle> for Target {
    fn from(object: &ObjectHandle) -> Self {
        Self::direct(object)
    }
}

impl From<WeakObjectHandle> for Target {
    fn from(weak: WeakObjectHandle) -> Self {
        Self::Direct(weak)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(weak) => f.debug_tuple("Direct").field(weak).finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}
