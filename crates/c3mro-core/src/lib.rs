pub mod id;
pub mod error;
pub mod unit;
pub mod source;
pub mod hierarchy;
pub mod document;
pub mod linearize;

// Re-export commonly used types
pub use id::UnitId;
pub use error::{CoreError, LinearizeError};
pub use unit::{MethodKey, UnitDecl, UnitDef, UnitKind};
pub use source::{DeclaredMethod, HierarchySource, UnitRef};
pub use hierarchy::{Hierarchy, HierarchyBuilder};
pub use document::{HierarchyDocument, MethodDoc, UnitDoc};
pub use linearize::{merge, Linearizer, MergeConflict, Mro};
