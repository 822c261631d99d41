//! Mixin scope strategies.
//!
//! A method declared inside a mixin is keyed by `(scope, name)` rather than by
//! name alone, so two mixins can each contribute a `merge` without one hiding
//! the other. The combinator asks its [`MixinScope`] for the scope of every
//! mixin it meets; the mixin's declarations must use the same scope.

use c3mro_core::UnitId;

/// Produces the scope under which a mixin's methods are declared.
///
/// Must be pure and give each mixin a distinct scope. Returning `None` means
/// the strategy has no scope for that mixin, which fails the lookup with
/// `MissingDisambiguationStrategy`.
pub trait MixinScope: Send + Sync {
    fn scope(&self, unit: UnitId, name: &str) -> Option<String>;
}

impl<F> MixinScope for F
where
    F: Fn(UnitId, &str) -> Option<String> + Send + Sync,
{
    fn scope(&self, unit: UnitId, name: &str) -> Option<String> {
        self(unit, name)
    }
}

/// Scope = the mixin's unit name. Sufficient while unit names are unique,
/// which the hierarchy builder enforces.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitNameScope;

impl MixinScope for UnitNameScope {
    fn scope(&self, _unit: UnitId, name: &str) -> Option<String> {
        Some(name.to_string())
    }
}

/// Scope = the first 16 hex digits of the blake3 digest of the mixin's name.
///
/// Declarations compute the same value with [`DigestScope::scope_for`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestScope;

impl DigestScope {
    pub fn scope_for(name: &str) -> String {
        let hash = blake3::hash(name.as_bytes());
        hash.to_hex()[..16].to_string()
    }
}

impl MixinScope for DigestScope {
    fn scope(&self, _unit: UnitId, name: &str) -> Option<String> {
        Some(Self::scope_for(name))
    }
}
