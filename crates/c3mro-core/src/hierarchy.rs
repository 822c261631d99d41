//! In-memory hierarchy: the first-class [`HierarchySource`] implementation.
//!
//! [`HierarchyBuilder`] validates each [`UnitDecl`] as it is added and assigns
//! dense [`UnitId`]s in declaration order. Parents must be declared before
//! their children, so a built [`Hierarchy`] is acyclic by construction.

use indexmap::IndexMap;

use crate::error::CoreError;
use crate::id::UnitId;
use crate::source::{DeclaredMethod, HierarchySource};
use crate::unit::{MethodKey, MixinList, UnitDecl, UnitDef, UnitKind};

/// Immutable unit hierarchy with method bodies of type `M`.
#[derive(Debug, Clone)]
pub struct Hierarchy<M> {
    /// Units indexed by UnitId.0
    units: Vec<UnitDef<M>>,
    /// Name lookup, in declaration order
    names: IndexMap<String, UnitId>,
}

impl<M> Hierarchy<M> {
    /// Looks up a unit by its [`UnitId`].
    pub fn get(&self, id: UnitId) -> Option<&UnitDef<M>> {
        self.units.get(id.index())
    }

    /// Looks up a unit by name.
    pub fn get_by_name(&self, name: &str) -> Option<&UnitDef<M>> {
        self.names.get(name).and_then(|id| self.get(*id))
    }

    pub fn superclass_of(&self, id: UnitId) -> Option<UnitId> {
        self.get(id).and_then(|unit| unit.superclass)
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Iterates over all units in declaration order.
    pub fn units(&self) -> impl Iterator<Item = &UnitDef<M>> {
        self.units.iter()
    }

    /// Maps a sequence of ids to unit names. Unknown ids are skipped.
    pub fn names_of<'a>(&'a self, ids: impl IntoIterator<Item = &'a UnitId>) -> Vec<&'a str> {
        ids.into_iter()
            .filter_map(|id| self.get(*id).map(|unit| unit.name.as_str()))
            .collect()
    }

    /// Units that name `id` as their superclass or as one of their mixins.
    pub fn direct_descendants(&self, id: UnitId) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|unit| unit.superclass == Some(id) || unit.mixins.contains(&id))
            .map(|unit| unit.id)
            .collect()
    }
}

impl<M> HierarchySource for Hierarchy<M> {
    type Method = M;

    fn contains(&self, unit: UnitId) -> bool {
        unit.index() < self.units.len()
    }

    fn unit_name(&self, unit: UnitId) -> Option<&str> {
        self.get(unit).map(|def| def.name.as_str())
    }

    fn lookup(&self, name: &str) -> Option<UnitId> {
        self.names.get(name).copied()
    }

    fn superclass(&self, unit: UnitId) -> Option<UnitId> {
        self.superclass_of(unit)
    }

    fn mixins(&self, unit: UnitId) -> &[UnitId] {
        self.get(unit).map(|def| def.mixins.as_slice()).unwrap_or(&[])
    }

    fn is_mixin(&self, unit: UnitId) -> bool {
        self.get(unit).is_some_and(UnitDef::is_mixin)
    }

    fn own_method(&self, unit: UnitId, key: &MethodKey) -> Option<DeclaredMethod<'_, M>> {
        let def = self.get(unit)?;
        def.own_method(key).map(|body| DeclaredMethod {
            owner: def.id,
            body,
        })
    }
}

/// Incremental, validating builder for a [`Hierarchy`].
#[derive(Debug, Clone)]
pub struct HierarchyBuilder<M> {
    units: Vec<UnitDef<M>>,
    names: IndexMap<String, UnitId>,
}

impl<M> HierarchyBuilder<M> {
    pub fn new() -> Self {
        HierarchyBuilder {
            units: Vec::new(),
            names: IndexMap::new(),
        }
    }

    /// Validates a declaration and adds it, returning the new unit's id.
    ///
    /// Rejects duplicate names, unknown parents, a mixin as superclass, a
    /// superclass on a mixin, non-mixins in the mixin list, and a mixin
    /// listed twice.
    pub fn add(&mut self, decl: UnitDecl<M>) -> Result<UnitId, CoreError> {
        if self.names.contains_key(&decl.name) {
            return Err(CoreError::DuplicateUnitName { name: decl.name });
        }

        if let Some(superclass) = decl.superclass {
            let parent = self.unit(superclass)?;
            if decl.kind == UnitKind::Mixin {
                return Err(CoreError::InvalidSuperclass {
                    unit: decl.name,
                    reason: "a mixin cannot extend a superclass".to_string(),
                });
            }
            if parent.kind == UnitKind::Mixin {
                return Err(CoreError::InvalidSuperclass {
                    reason: format!("'{}' is a mixin", parent.name),
                    unit: decl.name,
                });
            }
        }

        let mut mixins = MixinList::new();
        for &mixin in &decl.mixins {
            let used = self.unit(mixin)?;
            if used.kind != UnitKind::Mixin {
                return Err(CoreError::InvalidMixin {
                    mixin: used.name.clone(),
                    unit: decl.name,
                });
            }
            if mixins.contains(&mixin) {
                return Err(CoreError::DuplicateMixin {
                    mixin: used.name.clone(),
                    unit: decl.name,
                });
            }
            mixins.push(mixin);
        }

        let id = UnitId(self.units.len() as u32);
        self.names.insert(decl.name.clone(), id);
        self.units.push(UnitDef {
            id,
            name: decl.name,
            kind: decl.kind,
            superclass: decl.superclass,
            mixins,
            methods: decl.methods.into_iter().collect(),
        });
        Ok(id)
    }

    /// Id of an already declared unit.
    pub fn id_of(&self, name: &str) -> Option<UnitId> {
        self.names.get(name).copied()
    }

    /// Finishes the hierarchy.
    pub fn build(self) -> Hierarchy<M> {
        Hierarchy {
            units: self.units,
            names: self.names,
        }
    }

    fn unit(&self, id: UnitId) -> Result<&UnitDef<M>, CoreError> {
        self.units
            .get(id.index())
            .ok_or(CoreError::UnitNotFound { id })
    }
}

impl<M> Default for HierarchyBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}
