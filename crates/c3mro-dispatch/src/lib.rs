//! Method combination over C3 orderings.
//!
//! A [`MethodCombinator`] is a map-reduce across a unit hierarchy: it collects
//! every method of a given name that a unit in the start unit's ordering
//! declares itself, calls them most-specific first, and folds the results.
//!
//! # Modules
//!
//! - [`error`]: CombineError and the cacheable ResolveError
//! - [`method`]: Method bodies, instances, argument values
//! - [`scope`]: mixin scope strategies for disambiguating mixin methods
//! - [`resolve`]: the memoized MethodSet resolver
//! - [`combinator`]: CombinatorConfig, MethodCombinator (`execute`/`invoke`)
//! - [`reducers`]: stock reducers

pub mod combinator;
pub mod error;
pub mod method;
pub mod reducers;
pub mod resolve;
pub mod scope;

// Re-export key types for ergonomic use.
pub use combinator::{CombinatorConfig, MethodCombinator, Reducer};
pub use error::{CombineError, ResolveError};
pub use method::{ClassHierarchy, Method, MethodError, Object, Value};
pub use resolve::{MethodEntry, MethodResolver, MethodSet, MixinMode};
pub use scope::{DigestScope, MixinScope, UnitNameScope};
