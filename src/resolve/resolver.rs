// src/resolve/resolver.rs

//! Reverse-reachability over the runtime link graph.
//!
//! An edge `A -> B` means "A links against B". Given a changed unit `X`, the
//! dependents are every unit from which `X` is reachable. The cache offers no
//! reverse index, so each discovered unit costs one full scan of the cache;
//! caches hold hundreds of units, not millions.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::cache::{ModuleCacheView, UnitIter};
use crate::resolve::namespace::NamespaceFilter;
use crate::resolve::plan::InvalidationResult;
use crate::unit::UnitId;

/// Computes the stale set for a changed unit.
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver {
    exclude: HashSet<UnitId>,
    namespaces: NamespaceFilter,
}

/// One pending scan: the unit whose dependents we are looking for, and the
/// cache entries not yet inspected for it.
struct Frame<'a> {
    unit: UnitId,
    candidates: UnitIter<'a>,
}

impl DependencyResolver {
    pub fn new(exclude: impl IntoIterator<Item = UnitId>, namespaces: NamespaceFilter) -> Self {
        Self {
            exclude: exclude.into_iter().collect(),
            namespaces,
        }
    }

    pub fn exclude(&self) -> &HashSet<UnitId> {
        &self.exclude
    }

    pub fn namespaces(&self) -> &NamespaceFilter {
        &self.namespaces
    }

    /// Every unit that transitively links against `changed`, in depth-first
    /// discovery order, without `changed` itself.
    ///
    /// A dependent's own dependents are listed right after it, before its
    /// siblings. Excluded units are never listed, and nothing is discovered
    /// *through* them either. Candidates whose link record cannot be read
    /// are treated as non-dependents.
    pub async fn dependents<C>(&self, changed: &UnitId, cache: &C) -> Vec<UnitId>
    where
        C: ModuleCacheView + ?Sized,
    {
        let mut visited: HashSet<UnitId> = self.exclude.clone();
        let mut result: Vec<UnitId> = Vec::new();

        if !visited.insert(changed.clone()) {
            debug!(unit = %changed, "changed unit is excluded; no dependents");
            return result;
        }

        // Explicit stack instead of recursion: same discovery order, no stack
        // growth on long chains.
        let mut frames: Vec<Frame<'_>> = vec![Frame {
            unit: changed.clone(),
            candidates: cache.units(),
        }];

        while let Some(frame) = frames.last_mut() {
            let Some(candidate) = frame.candidates.next() else {
                frames.pop();
                continue;
            };

            if visited.contains(&candidate) {
                continue;
            }
            if self.namespaces.excludes(&candidate) {
                trace!(candidate = %candidate, "skipping built-in or vendored unit");
                continue;
            }

            let target = frame.unit.clone();
            match cache.links(&candidate).await {
                Ok(record) if record.links_to(&target) => {
                    debug!(dependent = %candidate, of = %target, "found dependent");
                    visited.insert(candidate.clone());
                    result.push(candidate.clone());
                    frames.push(Frame {
                        unit: candidate,
                        candidates: cache.units(),
                    });
                }
                Ok(_) => {}
                Err(err) => {
                    debug!(candidate = %candidate, error = %err, "link inspection failed; skipping");
                }
            }
        }

        result
    }

    /// Full invalidation for `changed`: the unit itself followed by its
    /// dependents, or nothing if `changed` was never loaded.
    pub async fn plan<C>(&self, changed: &UnitId, cache: &C) -> InvalidationResult
    where
        C: ModuleCacheView + ?Sized,
    {
        if !cache.contains(changed) {
            return InvalidationResult::empty();
        }

        let dependents = self.dependents(changed, cache).await;
        InvalidationResult::new(changed.clone(), dependents)
    }
}

/// Dependents of `changed` with the default namespace filter.
pub async fn resolve_dependents<C>(
    changed: &UnitId,
    exclude: &HashSet<UnitId>,
    cache: &C,
) -> Vec<UnitId>
where
    C: ModuleCacheView + ?Sized,
{
    DependencyResolver::new(exclude.iter().cloned(), NamespaceFilter::default())
        .dependents(changed, cache)
        .await
}
