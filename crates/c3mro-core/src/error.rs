//! Core error types for c3mro-core.
//!
//! [`CoreError`] covers hierarchy construction and unit resolution.
//! [`LinearizeError`] covers C3 merge failures; it is `Clone` so a failed
//! ordering can be cached alongside successful ones.

use thiserror::Error;

use crate::id::UnitId;

/// Errors produced while building or querying a hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Attempting to declare a unit name that already exists.
    #[error("duplicate unit name: '{name}'")]
    DuplicateUnitName { name: String },

    /// A UnitId was not found in the hierarchy.
    #[error("unit not found: UnitId({id})")]
    UnitNotFound { id: UnitId },

    /// A unit name was not found in the hierarchy.
    #[error("unknown unit: '{name}'")]
    UnknownUnitName { name: String },

    /// The declared superclass is a mixin, or a mixin declares a superclass.
    #[error("invalid superclass for '{unit}': {reason}")]
    InvalidSuperclass { unit: String, reason: String },

    /// A unit listed as a mixin is not a mixin.
    #[error("'{unit}' cannot use '{mixin}': not a mixin")]
    InvalidMixin { unit: String, mixin: String },

    /// The same mixin appears twice in one declaration.
    #[error("'{unit}' uses '{mixin}' more than once")]
    DuplicateMixin { unit: String, mixin: String },

    /// A document declares the same method key twice on one unit.
    #[error("'{unit}' declares '{method}' more than once")]
    DuplicateMethod { unit: String, method: String },

    /// Units reference each other in a cycle.
    #[error("cyclic hierarchy through '{unit}'")]
    CyclicHierarchy { unit: String },

    /// A hierarchy document could not be parsed.
    #[error("invalid hierarchy document: {reason}")]
    Document { reason: String },
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Document {
            reason: err.to_string(),
        }
    }
}

/// Errors produced by C3 linearization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinearizeError {
    /// No head of the pending sequences could be selected without violating
    /// local precedence or monotonicity.
    #[error("cannot determine a consistent ordering for '{name}' (pending: {pending:?})")]
    IndeterminateHierarchy {
        unit: UnitId,
        name: String,
        /// Names in each unmerged sequence at the point of failure.
        pending: Vec<Vec<String>>,
    },

    /// A UnitId was not found in the hierarchy source.
    #[error("unit not found: UnitId({id})")]
    UnitNotFound { id: UnitId },

    /// The hierarchy source reported a unit among its own ancestors.
    #[error("cyclic hierarchy through UnitId({unit})")]
    CyclicHierarchy { unit: UnitId },
}
