//! Method-set resolution: which units in an ordering declare a method
//! themselves.
//!
//! A [`MethodResolver`] walks the C3 ordering of a start unit and keeps, in
//! order, every unit whose own declarations contain the requested method. A
//! class is checked under the plain name; a mixin is checked (only in
//! [`MixinMode::Include`]) under the scope its [`MixinScope`] yields. An entry
//! is kept only when the source names the checked unit itself as the
//! declaring owner.
//!
//! Results are memoized per (unit, method) with the same at-most-once
//! `DashMap` + `OnceLock` discipline the linearizer uses. A resolver has one
//! fixed [`MixinMode`]; resolvers in different modes keep separate caches
//! over a shared linearizer.

use std::ops::Deref;
use std::sync::{Arc, OnceLock};

use c3mro_core::{HierarchySource, Linearizer, MethodKey, UnitId};
use dashmap::DashMap;

use crate::error::ResolveError;
use crate::scope::MixinScope;

/// Whether mixin-declared methods take part in combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MixinMode {
    /// Mixins are skipped entirely.
    Exclude,
    /// Mixins contribute their scoped methods.
    Include,
}

/// One directly declared method found along an ordering.
#[derive(Debug, Clone)]
pub struct MethodEntry<M> {
    /// The unit that declares the method.
    pub unit: UnitId,
    /// The key it is declared under.
    pub key: MethodKey,
    pub body: M,
}

/// Directly declared methods in ordering order, most specific first.
#[derive(Debug)]
pub struct MethodSet<M>(Arc<[MethodEntry<M>]>);

impl<M> MethodSet<M> {
    /// The declaring units, in order.
    pub fn units(&self) -> Vec<UnitId> {
        self.0.iter().map(|entry| entry.unit).collect()
    }
}

// Manual impl: cloning shares the entries and needs no `M: Clone`.
impl<M> Clone for MethodSet<M> {
    fn clone(&self) -> Self {
        MethodSet(Arc::clone(&self.0))
    }
}

impl<M> Deref for MethodSet<M> {
    type Target = [MethodEntry<M>];

    fn deref(&self) -> &[MethodEntry<M>] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MethodSetKey {
    unit: UnitId,
    method: String,
}

type Cell<M> = Arc<OnceLock<Result<MethodSet<M>, ResolveError>>>;

/// Memoizing method-set resolver over a shared [`Linearizer`].
pub struct MethodResolver<H: HierarchySource> {
    linearizer: Arc<Linearizer<H>>,
    mode: MixinMode,
    scope: Option<Arc<dyn MixinScope>>,
    cache: DashMap<MethodSetKey, Cell<H::Method>>,
}

impl<H> MethodResolver<H>
where
    H: HierarchySource,
    H::Method: Clone,
{
    pub fn new(linearizer: Arc<Linearizer<H>>, mode: MixinMode) -> Self {
        MethodResolver {
            linearizer,
            mode,
            scope: None,
            cache: DashMap::new(),
        }
    }

    /// Attaches the strategy used to scope mixin method lookups.
    pub fn with_scope(mut self, scope: impl MixinScope + 'static) -> Self {
        self.scope = Some(Arc::new(scope));
        self.cache.clear();
        self
    }

    pub fn mode(&self) -> MixinMode {
        self.mode
    }

    pub fn linearizer(&self) -> &Arc<Linearizer<H>> {
        &self.linearizer
    }

    /// The methods named `method` that units in `unit`'s ordering declare
    /// themselves, most specific first.
    ///
    /// In [`MixinMode::Include`] without a scope strategy this fails with
    /// `MissingDisambiguationStrategy` on every call; nothing is cached.
    pub fn method_set(&self, unit: UnitId, method: &str) -> Result<MethodSet<H::Method>, ResolveError> {
        if self.mode == MixinMode::Include && self.scope.is_none() {
            return Err(ResolveError::MissingDisambiguationStrategy { unit: None });
        }

        let key = MethodSetKey {
            unit,
            method: method.to_string(),
        };
        let cell: Cell<H::Method> = Arc::clone(self.cache.entry(key).or_default().value());
        if let Some(cached) = cell.get() {
            tracing::trace!(unit = %unit, method, "method set cache hit");
            return cached.clone();
        }
        cell.get_or_init(|| self.collect(unit, method)).clone()
    }

    /// Number of cached method sets (including cached failures).
    pub fn cached_len(&self) -> usize {
        self.cache
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    /// Drops every cached method set. The linearizer's cache is untouched.
    pub fn clear(&self) {
        self.cache.clear();
    }

    fn collect(&self, unit: UnitId, method: &str) -> Result<MethodSet<H::Method>, ResolveError> {
        let mro = self.linearizer.ordering_for(unit)?;
        let source = self.linearizer.source();

        let mut entries = Vec::new();
        for &candidate in mro.iter() {
            let key = if source.is_mixin(candidate) {
                match (self.mode, &self.scope) {
                    (MixinMode::Include, Some(strategy)) => {
                        let name = source.display_name(candidate);
                        let scope = strategy.scope(candidate, &name).ok_or_else(|| {
                            ResolveError::MissingDisambiguationStrategy {
                                unit: Some(name.clone()),
                            }
                        })?;
                        MethodKey::scoped(scope, method)
                    }
                    _ => continue,
                }
            } else {
                MethodKey::plain(method)
            };

            match source.own_method(candidate, &key) {
                Some(found) if found.owner == candidate => entries.push(MethodEntry {
                    unit: candidate,
                    key,
                    body: found.body.clone(),
                }),
                Some(found) => tracing::trace!(
                    unit = %candidate,
                    owner = %found.owner,
                    key = %key,
                    "skipping method not declared by this unit"
                ),
                None => {}
            }
        }

        tracing::debug!(
            unit = %source.display_name(unit),
            method,
            mode = ?self.mode,
            found = entries.len(),
            "resolved method set"
        );
        Ok(MethodSet(entries.into()))
    }
}
