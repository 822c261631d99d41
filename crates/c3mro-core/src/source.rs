//! The [`HierarchySource`] trait: the narrow interface the linearizer and the
//! combinator use to read a hierarchy.
//!
//! Implementations describe units by identity only. Everything the algorithms
//! need (superclass, mixins, kind, directly declared methods) is answered
//! through this trait, so any descriptor graph can be plugged in. The
//! in-memory [`Hierarchy`](crate::hierarchy::Hierarchy) is the first-class
//! implementation.

use std::fmt;

use crate::error::CoreError;
use crate::id::UnitId;
use crate::unit::MethodKey;

/// Reference to a unit, by identity or by name.
///
/// Resolved once at the API boundary with [`HierarchySource::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnitRef {
    Id(UnitId),
    Name(String),
}

impl From<UnitId> for UnitRef {
    fn from(id: UnitId) -> Self {
        UnitRef::Id(id)
    }
}

impl From<&str> for UnitRef {
    fn from(name: &str) -> Self {
        UnitRef::Name(name.to_string())
    }
}

impl From<String> for UnitRef {
    fn from(name: String) -> Self {
        UnitRef::Name(name)
    }
}

impl From<&UnitRef> for UnitRef {
    fn from(unit: &UnitRef) -> Self {
        unit.clone()
    }
}

impl fmt::Display for UnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitRef::Id(id) => write!(f, "UnitId({})", id),
            UnitRef::Name(name) => write!(f, "{}", name),
        }
    }
}

/// A method found by [`HierarchySource::own_method`], with the unit the
/// source reports as its declaring owner.
#[derive(Debug)]
pub struct DeclaredMethod<'a, M> {
    pub owner: UnitId,
    pub body: &'a M,
}

// Manual impls: derive would require `M: Clone`/`M: Copy`.
impl<M> Clone for DeclaredMethod<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for DeclaredMethod<'_, M> {}

/// Read-only view of a unit hierarchy.
///
/// `own_method` must only report methods declared on `unit` itself. Sources
/// backed by a reflection facility that also reports inherited members must
/// at least report the true declaring owner, which callers check.
pub trait HierarchySource {
    /// Method body type stored per declared method.
    type Method;

    /// Whether the unit exists in this hierarchy.
    fn contains(&self, unit: UnitId) -> bool;

    /// Name of the unit, if it exists.
    fn unit_name(&self, unit: UnitId) -> Option<&str>;

    /// Finds a unit by name.
    fn lookup(&self, name: &str) -> Option<UnitId>;

    /// The unit's superclass, if any.
    fn superclass(&self, unit: UnitId) -> Option<UnitId>;

    /// The unit's mixins in declaration order. Empty for unknown units.
    fn mixins(&self, unit: UnitId) -> &[UnitId];

    /// Whether the unit is a mixin.
    fn is_mixin(&self, unit: UnitId) -> bool;

    /// A method declared by `unit` under `key`, with its declaring owner.
    fn own_method(&self, unit: UnitId, key: &MethodKey) -> Option<DeclaredMethod<'_, Self::Method>>;

    /// Whether `unit` itself declares a method under `key`.
    fn has_own_method(&self, unit: UnitId, key: &MethodKey) -> bool {
        self.own_method(unit, key)
            .is_some_and(|method| method.owner == unit)
    }

    /// Resolves a [`UnitRef`] to an existing unit.
    fn resolve(&self, unit: &UnitRef) -> Result<UnitId, CoreError> {
        match unit {
            UnitRef::Id(id) if self.contains(*id) => Ok(*id),
            UnitRef::Id(id) => Err(CoreError::UnitNotFound { id: *id }),
            UnitRef::Name(name) => self
                .lookup(name)
                .ok_or_else(|| CoreError::UnknownUnitName { name: name.clone() }),
        }
    }

    /// Display name for a unit, falling back to its id.
    fn display_name(&self, unit: UnitId) -> String {
        self.unit_name(unit)
            .map(str::to_string)
            .unwrap_or_else(|| format!("UnitId({})", unit))
    }
}
