#![forbid(unsafe_code)]

//! Inspected objects: property access by name and identity-compared handles.
//!
//! # Design
//!
//! Inspectors edit arbitrary entities (meshes, lights, materials) through a
//! uniform interface. Instead of reflection, each entity implements
//! [`Inspectable`], a small capability trait exposing `get_property` /
//! `set_property` over the closed [`PropertyValue`] enum. This is what the
//! undo/redo history uses to write old and new values back.
//!
//! Entities are shared between panels through [`ObjectHandle`], a cloneable
//! `Rc<RefCell<dyn Inspectable>>`. Two handles are "the same object" when they
//! point at the same allocation; values are never compared deeply.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Unknown property | Name not exposed by the entity | `PropertyError::UnknownProperty` |
//! | Type mismatch | Value variant not accepted | `PropertyError::TypeMismatch` |
//! | Read-only | Entity refuses writes to the name | `PropertyError::ReadOnly` |
//! | Re-entrant `set` | Writing while a borrow is live | Panics (`RefCell` rules) |

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// A value shown and edited by a property inspector.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "value"))]
pub enum PropertyValue {
    /// Explicit empty value. Distinct from "no value supplied".
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Three-component vector (position, rotation, scaling).
    Vector3([f64; 3]),
    /// RGBA color, components in `0.0..=1.0`.
    Color([f32; 4]),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Short name of the variant, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Vector3(_) => "vector3",
            Self::Color(_) => "color",
            Self::List(_) => "list",
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_vector3(&self) -> Option<[f64; 3]> {
        match self {
            Self::Vector3(v) => Some(*v),
            _ => None,
        }
    }

    /// Whether `other` may replace `self` without changing the property type.
    ///
    /// `Null` is compatible with everything in both directions; integers may
    /// be written into float slots.
    #[must_use]
    pub fn accepts(&self, other: &PropertyValue) -> bool {
        match (self, other) {
            (Self::Null, _) | (_, Self::Null) => true,
            (Self::Float(_), Self::Int(_)) => true,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Vector3([x, y, z]) => write!(f, "({x}, {y}, {z})"),
            Self::Color([r, g, b, a]) => write!(f, "rgba({r}, {g}, {b}, {a})"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<[f64; 3]> for PropertyValue {
    fn from(value: [f64; 3]) -> Self {
        Self::Vector3(value)
    }
}

/// Errors from reading or writing a property by name.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyError {
    /// The entity does not expose a property with this name.
    UnknownProperty { type_name: String, property: String },
    /// The value variant is not accepted by the property.
    TypeMismatch {
        property: String,
        expected: &'static str,
        found: &'static str,
    },
    /// The property exists but cannot be written.
    ReadOnly { property: String },
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownProperty {
                type_name,
                property,
            } => write!(f, "unknown property '{property}' on {type_name}"),
            Self::TypeMismatch {
                property,
                expected,
                found,
            } => write!(
                f,
                "type mismatch for '{property}': expected {expected}, found {found}"
            ),
            Self::ReadOnly { property } => write!(f, "property '{property}' is read-only"),
        }
    }
}

impl std::error::Error for PropertyError {}

/// Capability exposed by every entity a property inspector can edit.
pub trait Inspectable {
    /// Human-readable type name shown in inspector headers and errors.
    fn type_name(&self) -> &str;

    /// Names of the editable properties, in display order.
    fn property_names(&self) -> Vec<String>;

    /// Read a property. `None` when the name is unknown.
    fn get_property(&self, name: &str) -> Option<PropertyValue>;

    /// Write a property.
    fn set_property(&mut self, name: &str, value: PropertyValue) -> Result<(), PropertyError>;
}

/// Shared, identity-compared handle to an inspected entity.
///
/// Cloning a handle yields another reference to the **same** entity; both
/// compare equal under [`ObjectHandle::ptr_eq`].
#[derive(Clone)]
pub struct ObjectHandle {
    inner: Rc<RefCell<dyn Inspectable>>,
}

impl ObjectHandle {
    /// Wrap a fresh entity.
    pub fn new<T: Inspectable + 'static>(value: T) -> Self {
        Self::from_shared(Rc::new(RefCell::new(value)))
    }

    /// Wrap an entity the caller already shares, keeping its typed `Rc`
    /// usable. The handle has the same identity as `shared`.
    pub fn from_shared<T: Inspectable + 'static>(shared: Rc<RefCell<T>>) -> Self {
        let inner: Rc<RefCell<dyn Inspectable>> = shared;
        Self { inner }
    }

    /// Identity comparison: same allocation, regardless of contents.
    #[must_use]
    pub fn ptr_eq(&self, other: &ObjectHandle) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.inner), Rc::as_ptr(&other.inner))
    }

    /// Whether this handle refers to the entity behind `shared`.
    #[must_use]
    pub fn is<T: Inspectable + 'static>(&self, shared: &Rc<RefCell<T>>) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.inner), Rc::as_ptr(shared))
    }

    /// Address of the entity, for diagnostics only.
    #[must_use]
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.inner).cast::<()>() as usize
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakObjectHandle {
        WeakObjectHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    #[must_use]
    pub fn type_name(&self) -> String {
        self.inner.borrow().type_name().to_string()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<PropertyValue> {
        self.inner.borrow().get_property(name)
    }

    /// Write a property.
    ///
    /// # Panics
    ///
    /// Panics if the entity is currently borrowed (e.g. from inside
    /// [`ObjectHandle::with`]).
    pub fn set(&self, name: &str, value: PropertyValue) -> Result<(), PropertyError> {
        self.inner.borrow_mut().set_property(name, value)
    }

    /// Access the entity by reference.
    pub fn with<R>(&self, f: impl FnOnce(&dyn Inspectable) -> R) -> R {
        f(&*self.inner.borrow())
    }

    /// Access the entity mutably.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut dyn Inspectable) -> R) -> R {
        f(&mut *self.inner.borrow_mut())
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ObjectHandle");
        s.field("addr", &format_args!("{:#x}", self.addr()));
        match self.inner.try_borrow() {
            Ok(inner) => s.field("type_name", &inner.type_name()),
            Err(_) => s.field("type_name", &"<borrowed>"),
        };
        s.finish()
    }
}

/// Non-owning counterpart of [`ObjectHandle`].
///
/// Registrations and history entries hold entities weakly so that closing a
/// scene releases its objects even while panels still watch them.
#[derive(Clone)]
pub struct WeakObjectHandle {
    inner: Weak<RefCell<dyn Inspectable>>,
}

impl WeakObjectHandle {
    #[must_use]
    pub fn upgrade(&self) -> Option<ObjectHandle> {
        self.inner.upgrade().map(|inner| ObjectHandle { inner })
    }

    /// Whether this weak reference points at `object`.
    ///
    /// The allocation stays reserved while any weak reference exists, so the
    /// address cannot be reused by another live entity.
    #[must_use]
    pub fn points_to(&self, object: &ObjectHandle) -> bool {
        std::ptr::addr_eq(self.inner.as_ptr(), Rc::as_ptr(&object.inner))
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl fmt::Debug for WeakObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObjectHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Generic [`Inspectable`] backed by an ordered name → value map.
///
/// Property types are fixed by the initial values: a write must be accepted
/// by [`PropertyValue::accepts`] against the stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyBag {
    type_name: String,
    properties: BTreeMap<String, PropertyValue>,
}

impl PropertyBag {
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Declare a property with its initial value.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl Inspectable for PropertyBag {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn property_names(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }

    fn get_property(&self, name: &str) -> Option<PropertyValue> {
        self.properties.get(name).cloned()
    }

    fn set_property(&mut self, name: &str, value: PropertyValue) -> Result<(), PropertyError> {
        let Some(slot) = self.properties.get_mut(name) else {
            return Err(PropertyError::UnknownProperty {
                type_name: self.type_name.clone(),
                property: name.to_string(),
            });
        };
        if !slot.accepts(&value) {
            return Err(PropertyError::TypeMismatch {
                property: name.to_string(),
                expected: slot.kind(),
                found: value.kind(),
            });
        }
        *slot = value;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
