//! C3 linearization with a concurrent, at-most-once memoization cache.
//!
//! [`merge`] is the C3 merge over plain sequences. [`Linearizer`] applies it
//! to a [`HierarchySource`]: the ordering of unit `U` with mixins `M1..Mk` and
//! superclass `P` is
//!
//! ```text
//! merge([U], mro(M1), .., mro(Mk), mro(P), [M1, .., Mk, P])
//! ```
//!
//! # Caching
//!
//! Each unit maps to an `Arc<OnceLock<..>>` cell in a `DashMap`. The map shard
//! is locked only while the cell is fetched or inserted; the computation runs
//! inside `OnceLock::get_or_init`, so concurrent first queries of one unit
//! compute it once and the losers reuse the result. Recursion into ancestors
//! never holds a shard lock. Failures are cached as well: the hierarchy is
//! immutable, so a retry could not succeed.
//!
//! A top-level computation first walks the unit's ancestry without touching
//! any cell. A cycle reported by the source fails there, so threads starting
//! on different units of one cycle each get `CyclicHierarchy` rather than
//! waiting on each other's cells.

use std::collections::HashSet;
use std::ops::Deref;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::error::LinearizeError;
use crate::id::UnitId;
use crate::source::HierarchySource;

/// A method resolution order: distinct units, most specific first.
///
/// Only the linearizer builds orderings, so one is never empty:
///
/// ```compile_fail
/// use c3mro_core::Mro;
///
/// let empty = Mro::from(Vec::new());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mro(Arc<[UnitId]>);

impl Mro {
    /// The unit this ordering was computed for.
    pub fn head(&self) -> UnitId {
        self.0[0]
    }

    pub fn as_slice(&self) -> &[UnitId] {
        &self.0
    }

    pub fn position(&self, unit: UnitId) -> Option<usize> {
        self.0.iter().position(|u| *u == unit)
    }

    /// Whether `earlier` appears before `later`. False if either is absent.
    pub fn precedes(&self, earlier: UnitId, later: UnitId) -> bool {
        match (self.position(earlier), self.position(later)) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        }
    }
}

impl Deref for Mro {
    type Target = [UnitId];

    fn deref(&self) -> &[UnitId] {
        &self.0
    }
}

impl Mro {
    /// Wraps a merge result, which always starts with the unit itself.
    fn from_merged(units: Vec<UnitId>) -> Self {
        debug_assert!(!units.is_empty());
        Mro(units.into())
    }
}

/// The sequences that were still pending when [`merge`] found no eligible head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConflict<T> {
    pub pending: Vec<Vec<T>>,
}

/// C3 merge.
///
/// Repeatedly takes the first sequence head that appears in no sequence's
/// tail, appends it to the result, and pops it from every sequence it heads.
/// Fails when every remaining head is blocked.
pub fn merge<T: Copy + PartialEq>(seqs: Vec<Vec<T>>) -> Result<Vec<T>, MergeConflict<T>> {
    // Sequences are stored reversed so popping the head is O(1).
    let mut seqs: Vec<Vec<T>> = seqs
        .into_iter()
        .filter(|seq| !seq.is_empty())
        .map(|mut seq| {
            seq.reverse();
            seq
        })
        .collect();
    let mut result = Vec::new();

    while !seqs.is_empty() {
        let candidate = match find_candidate(&seqs) {
            Some(candidate) => candidate,
            None => {
                return Err(MergeConflict {
                    pending: seqs
                        .into_iter()
                        .map(|mut seq| {
                            seq.reverse();
                            seq
                        })
                        .collect(),
                })
            }
        };

        result.push(candidate);
        for seq in &mut seqs {
            if seq.last() == Some(&candidate) {
                seq.pop();
            }
        }
        seqs.retain(|seq| !seq.is_empty());
    }

    Ok(result)
}

/// First head (in sequence order) not found in any tail. Sequences are
/// reversed: the head is the last element, the tail everything before it.
fn find_candidate<T: Copy + PartialEq>(seqs: &[Vec<T>]) -> Option<T> {
    seqs.iter()
        .filter_map(|seq| seq.last().copied())
        .find(|head| {
            !seqs
                .iter()
                .any(|seq| seq[..seq.len() - 1].contains(head))
        })
}

type Cell = Arc<OnceLock<Result<Mro, LinearizeError>>>;

/// Memoizing C3 linearizer over a shared [`HierarchySource`].
///
/// One linearizer is meant to live as long as its hierarchy; share it behind
/// an `Arc`.
pub struct Linearizer<H> {
    source: Arc<H>,
    cache: DashMap<UnitId, Cell>,
}

impl<H: HierarchySource> Linearizer<H> {
    pub fn new(source: Arc<H>) -> Self {
        Linearizer {
            source,
            cache: DashMap::new(),
        }
    }

    /// The hierarchy this linearizer reads.
    pub fn source(&self) -> &Arc<H> {
        &self.source
    }

    /// The C3 ordering of `unit`, computed at most once per unit.
    pub fn ordering_for(&self, unit: UnitId) -> Result<Mro, LinearizeError> {
        self.ordering_with(unit, &mut Vec::new())
    }

    /// Like [`ordering_for`](Self::ordering_for), mapped to unit names.
    pub fn ordering_names(&self, unit: UnitId) -> Result<Vec<String>, LinearizeError> {
        let mro = self.ordering_for(unit)?;
        Ok(mro.iter().map(|u| self.source.display_name(*u)).collect())
    }

    /// Number of units with a cached ordering (or cached failure).
    pub fn cached_len(&self) -> usize {
        self.cache
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    /// Drops every cached result.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// `stack` holds the units whose computation is in progress on this call
    /// path; meeting one again means the source is cyclic.
    fn ordering_with(&self, unit: UnitId, stack: &mut Vec<UnitId>) -> Result<Mro, LinearizeError> {
        if !self.source.contains(unit) {
            return Err(LinearizeError::UnitNotFound { id: unit });
        }
        if stack.contains(&unit) {
            return Err(LinearizeError::CyclicHierarchy { unit });
        }

        let cell: Cell = Arc::clone(self.cache.entry(unit).or_default().value());
        if let Some(cached) = cell.get() {
            tracing::trace!(unit = %unit, "ordering cache hit");
            return cached.clone();
        }

        let top_level = stack.is_empty();
        stack.push(unit);
        let result = cell
            .get_or_init(|| {
                if top_level {
                    self.check_acyclic(unit)?;
                }
                self.compute(unit, stack)
            })
            .clone();
        stack.pop();
        result
    }

    /// Walks the ancestry of `unit` through the source alone. Units with a
    /// settled cell are skipped: their ancestry was already walked.
    fn check_acyclic(&self, unit: UnitId) -> Result<(), LinearizeError> {
        let mut done = HashSet::new();
        self.visit(unit, &mut Vec::new(), &mut done)
    }

    fn visit(
        &self,
        unit: UnitId,
        path: &mut Vec<UnitId>,
        done: &mut HashSet<UnitId>,
    ) -> Result<(), LinearizeError> {
        if path.contains(&unit) {
            tracing::warn!(unit = %self.source.display_name(unit), "cyclic hierarchy");
            return Err(LinearizeError::CyclicHierarchy { unit });
        }
        if done.contains(&unit) || !self.source.contains(unit) || self.is_settled(unit, path) {
            return Ok(());
        }

        path.push(unit);
        for &mixin in self.source.mixins(unit) {
            self.visit(mixin, path, done)?;
        }
        if let Some(superclass) = self.source.superclass(unit) {
            self.visit(superclass, path, done)?;
        }
        path.pop();
        done.insert(unit);
        Ok(())
    }

    /// Whether an ancestor (never the walk's own start) already has a result.
    fn is_settled(&self, unit: UnitId, path: &[UnitId]) -> bool {
        !path.is_empty()
            && self
                .cache
                .get(&unit)
                .is_some_and(|cell| cell.value().get().is_some())
    }

    fn compute(&self, unit: UnitId, stack: &mut Vec<UnitId>) -> Result<Mro, LinearizeError> {
        let mut parents: Vec<UnitId> = self.source.mixins(unit).to_vec();
        parents.extend(self.source.superclass(unit));

        let mut seqs = Vec::with_capacity(parents.len() + 2);
        seqs.push(vec![unit]);
        for &parent in &parents {
            seqs.push(self.ordering_with(parent, stack)?.to_vec());
        }
        seqs.push(parents);

        match merge(seqs) {
            Ok(order) => {
                tracing::debug!(
                    unit = %self.source.display_name(unit),
                    len = order.len(),
                    "computed ordering"
                );
                Ok(Mro::from_merged(order))
            }
            Err(conflict) => {
                let name = self.source.display_name(unit);
                tracing::warn!(unit = %name, "indeterminate hierarchy");
                Err(LinearizeError::IndeterminateHierarchy {
                    unit,
                    name,
                    pending: conflict
                        .pending
                        .iter()
                        .map(|seq| seq.iter().map(|u| self.source.display_name(*u)).collect())
                        .collect(),
                })
            }
        }
    }
}
