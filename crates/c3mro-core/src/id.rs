//! Stable identity for hierarchy units.
//!
//! [`UnitId`] is a newtype over `u32` assigned densely by the hierarchy
//! builder. It is the opaque comparable key used for equality and for every
//! memoization cache.

use std::fmt;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

/// Unit identity within a hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    /// Position of this unit in the hierarchy's unit table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// Display prints the inner value only.

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Bridge between UnitId and petgraph's NodeIndex<u32>. The document loader
// builds its dependency graph with one node per unit, in declaration order.

impl From<NodeIndex<u32>> for UnitId {
    fn from(idx: NodeIndex<u32>) -> Self {
        UnitId(idx.index() as u32)
    }
}

impl From<UnitId> for NodeIndex<u32> {
    fn from(id: UnitId) -> Self {
        NodeIndex::new(id.0 as usize)
    }
}
