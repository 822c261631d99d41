//! Error types for c3mro-dispatch.
//!
//! [`ResolveError`] is what method-set resolution can fail with; it is `Clone`
//! so failures can be memoized next to successful method sets.
//! [`CombineError`] is what `execute`/`invoke` return: resolution failures
//! flattened into their own variants, plus a method body's own error, passed
//! through unwrapped.

use c3mro_core::{CoreError, LinearizeError};
use thiserror::Error;

use crate::method::MethodError;

/// Failures while resolving a method set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Linearize(#[from] LinearizeError),

    /// Mixin methods were requested, but no scope strategy is attached or the
    /// strategy gave no scope for `unit`.
    #[error("{}", missing_strategy_message(.unit))]
    MissingDisambiguationStrategy { unit: Option<String> },
}

fn missing_strategy_message(unit: &Option<String>) -> String {
    match unit {
        Some(unit) => format!("mixin scope strategy produced no scope for mixin '{unit}'"),
        None => "mixin methods requested without a mixin scope strategy".to_string(),
    }
}

/// Errors returned by [`MethodCombinator`](crate::MethodCombinator).
#[derive(Debug, Error)]
pub enum CombineError {
    /// The start unit could not be resolved.
    #[error(transparent)]
    Unit(#[from] CoreError),

    /// The start unit's ordering could not be computed.
    #[error(transparent)]
    Linearize(#[from] LinearizeError),

    /// Mixin methods were requested without a working scope strategy.
    #[error("{}", missing_strategy_message(.unit))]
    MissingDisambiguationStrategy { unit: Option<String> },

    /// A method body failed. The partial accumulator is discarded.
    #[error(transparent)]
    Method(MethodError),
}

impl From<ResolveError> for CombineError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Linearize(err) => CombineError::Linearize(err),
            ResolveError::MissingDisambiguationStrategy { unit } => {
                CombineError::MissingDisambiguationStrategy { unit }
            }
        }
    }
}
