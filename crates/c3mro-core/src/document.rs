//! JSON hierarchy documents.
//!
//! A [`HierarchyDocument`] lists units by name; `extends` and `uses` may refer
//! to units declared anywhere in the document. [`HierarchyDocument::build`]
//! resolves the names, rejects cycles, and feeds the units to a
//! [`HierarchyBuilder`] in dependency order.
//!
//! ```json
//! {
//!   "units": [
//!     { "name": "Sub1", "extends": "Root" },
//!     { "name": "Root", "methods": [{ "name": "m" }] },
//!     { "name": "Trait1", "kind": "mixin", "methods": [{ "scope": "Trait1", "name": "m" }] }
//!   ]
//! }
//! ```

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::hierarchy::{Hierarchy, HierarchyBuilder};
use crate::id::UnitId;
use crate::unit::{MethodKey, UnitDecl, UnitKind};

/// A whole hierarchy description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HierarchyDocument {
    #[serde(default)]
    pub units: Vec<UnitDoc>,
}

/// One unit in a [`HierarchyDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDoc {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: UnitKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uses: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDoc>,
}

/// A directly declared method in a [`UnitDoc`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDoc {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl MethodDoc {
    pub fn key(&self) -> MethodKey {
        MethodKey {
            scope: self.scope.clone(),
            name: self.name.clone(),
        }
    }
}

fn default_kind() -> UnitKind {
    UnitKind::Class
}

impl HierarchyDocument {
    /// Parses a document from JSON text.
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Builds a [`Hierarchy`], producing each method body with `body`.
    ///
    /// `body` receives the declaring unit's name and the method key. Units
    /// are declared parents-first. A method key listed twice on one unit is
    /// rejected with [`CoreError::DuplicateMethod`].
    pub fn build<M, F>(&self, mut body: F) -> Result<Hierarchy<M>, CoreError>
    where
        F: FnMut(&str, &MethodKey) -> M,
    {
        // One graph node per document unit, edges parent -> child.
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let mut nodes: HashMap<&str, NodeIndex<u32>> = HashMap::new();
        for (position, unit) in self.units.iter().enumerate() {
            if nodes.contains_key(unit.name.as_str()) {
                return Err(CoreError::DuplicateUnitName {
                    name: unit.name.clone(),
                });
            }
            nodes.insert(unit.name.as_str(), graph.add_node(position));
        }

        let node_of = |name: &str| {
            nodes
                .get(name)
                .copied()
                .ok_or_else(|| CoreError::UnknownUnitName {
                    name: name.to_string(),
                })
        };
        for unit in &self.units {
            let child = node_of(unit.name.as_str())?;
            for parent in unit.extends.iter().chain(&unit.uses) {
                graph.add_edge(node_of(parent.as_str())?, child, ());
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| CoreError::CyclicHierarchy {
            unit: self.units[graph[cycle.node_id()]].name.clone(),
        })?;

        let mut builder = HierarchyBuilder::new();
        for node in order {
            let unit = &self.units[graph[node]];
            let mut decl = UnitDecl::new(unit.name.clone(), unit.kind);
            if let Some(parent) = &unit.extends {
                decl = decl.extends(declared(&builder, parent)?);
            }
            for mixin in &unit.uses {
                decl = decl.uses(declared(&builder, mixin)?);
            }
            let mut seen = HashSet::new();
            for method in &unit.methods {
                let key = method.key();
                if !seen.insert(key.clone()) {
                    return Err(CoreError::DuplicateMethod {
                        unit: unit.name.clone(),
                        method: key.to_string(),
                    });
                }
                let method_body = body(unit.name.as_str(), &key);
                decl = decl.keyed_method(key, method_body);
            }
            builder.add(decl)?;
        }
        Ok(builder.build())
    }
}

fn declared<M>(builder: &HierarchyBuilder<M>, name: &str) -> Result<UnitId, CoreError> {
    builder
        .id_of(name)
        .ok_or_else(|| CoreError::UnknownUnitName {
            name: name.to_string(),
        })
}
