//! Unit descriptors: the nodes of a hierarchy.
//!
//! A unit is either a [`UnitKind::Class`] (which may extend one superclass) or
//! a [`UnitKind::Mixin`] (composed into other units). Both may use any number
//! of mixins, in declaration order, and both declare their own methods in an
//! insertion-ordered table keyed by [`MethodKey`].
//!
//! [`UnitDecl`] is the unvalidated form handed to
//! [`HierarchyBuilder::add`](crate::hierarchy::HierarchyBuilder::add);
//! [`UnitDef`] is the validated, immutable form stored in a
//! [`Hierarchy`](crate::hierarchy::Hierarchy).

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::id::UnitId;

/// Kind of unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Class,
    Mixin,
}

/// Lookup key for a directly declared method.
///
/// Methods declared in a mixin context carry a `scope` so that two mixins can
/// each declare a method with the same name without colliding. The combinator
/// derives the scope for a mixin from its attached scope strategy; the
/// declaration must use the same scope for the method to be found.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub name: String,
}

impl MethodKey {
    /// Key for a method declared without a mixin scope.
    pub fn plain(name: impl Into<String>) -> Self {
        MethodKey {
            scope: None,
            name: name.into(),
        }
    }

    /// Key for a method declared in a mixin context.
    pub fn scoped(scope: impl Into<String>, name: impl Into<String>) -> Self {
        MethodKey {
            scope: Some(scope.into()),
            name: name.into(),
        }
    }

    pub fn is_scoped(&self) -> bool {
        self.scope.is_some()
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{}::{}", scope, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Mixin list storage. Most units use only a handful of mixins.
pub type MixinList = SmallVec<[UnitId; 4]>;

/// A validated unit stored in a hierarchy.
#[derive(Debug, Clone)]
pub struct UnitDef<M> {
    /// Unique identity for this unit.
    pub id: UnitId,
    /// Unique name.
    pub name: String,
    pub kind: UnitKind,
    /// Superclass. Always `None` for mixins.
    pub superclass: Option<UnitId>,
    /// Mixins in declaration order, first = highest precedence.
    pub mixins: MixinList,
    /// Directly declared methods, in declaration order.
    pub methods: IndexMap<MethodKey, M>,
}

impl<M> UnitDef<M> {
    pub fn is_mixin(&self) -> bool {
        self.kind == UnitKind::Mixin
    }

    /// Local precedence list: mixins in declaration order, then the
    /// superclass if any.
    pub fn local_precedence(&self) -> Vec<UnitId> {
        let mut parents: Vec<UnitId> = self.mixins.iter().copied().collect();
        parents.extend(self.superclass);
        parents
    }

    /// Looks up a method declared directly on this unit.
    pub fn own_method(&self, key: &MethodKey) -> Option<&M> {
        self.methods.get(key)
    }
}

/// An unvalidated unit declaration.
///
/// ```
/// use c3mro_core::{HierarchyBuilder, UnitDecl};
///
/// let mut builder = HierarchyBuilder::new();
/// let root = builder.add(UnitDecl::class("Root").method("m", ())).unwrap();
/// let sub = builder.add(UnitDecl::class("Sub").extends(root)).unwrap();
/// let hierarchy = builder.build();
/// assert_eq!(hierarchy.superclass_of(sub), Some(root));
/// ```
#[derive(Debug, Clone)]
pub struct UnitDecl<M> {
    pub name: String,
    pub kind: UnitKind,
    pub superclass: Option<UnitId>,
    pub mixins: Vec<UnitId>,
    pub methods: Vec<(MethodKey, M)>,
}

impl<M> UnitDecl<M> {
    pub fn new(name: impl Into<String>, kind: UnitKind) -> Self {
        UnitDecl {
            name: name.into(),
            kind,
            superclass: None,
            mixins: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, UnitKind::Class)
    }

    pub fn mixin(name: impl Into<String>) -> Self {
        Self::new(name, UnitKind::Mixin)
    }

    /// Sets the superclass.
    pub fn extends(mut self, superclass: UnitId) -> Self {
        self.superclass = Some(superclass);
        self
    }

    /// Appends a mixin. Earlier calls take precedence over later ones.
    pub fn uses(mut self, mixin: UnitId) -> Self {
        self.mixins.push(mixin);
        self
    }

    /// Declares a plain method.
    pub fn method(self, name: impl Into<String>, body: M) -> Self {
        self.keyed_method(MethodKey::plain(name), body)
    }

    /// Declares a method in a mixin scope.
    pub fn scoped_method(self, scope: impl Into<String>, name: impl Into<String>, body: M) -> Self {
        self.keyed_method(MethodKey::scoped(scope, name), body)
    }

    /// Declares a method under an explicit key. A later declaration with the
    /// same key replaces the earlier one.
    pub fn keyed_method(mut self, key: MethodKey, body: M) -> Self {
        self.methods.retain(|(existing, _)| existing != &key);
        self.methods.push((key, body));
        self
    }
}
