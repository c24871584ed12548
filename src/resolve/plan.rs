// src/resolve/plan.rs

use tracing::{debug, warn};

use crate::cache::ModuleCache;
use crate::errors::EvictionError;
use crate::unit::UnitId;

/// Ordered list of units to evict for one change: the changed unit first,
/// then its dependents in discovery order. Empty if the changed unit was
/// never loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationResult {
    units: Vec<UnitId>,
}

impl InvalidationResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(changed: UnitId, dependents: Vec<UnitId>) -> Self {
        let mut units = Vec::with_capacity(dependents.len() + 1);
        units.push(changed);
        units.extend(dependents);
        Self { units }
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// The changed unit, if it was loaded.
    pub fn changed(&self) -> Option<&UnitId> {
        self.units.first()
    }

    pub fn dependents(&self) -> &[UnitId] {
        self.units.get(1..).unwrap_or(&[])
    }

    /// Every unit in eviction order.
    pub fn units(&self) -> &[UnitId] {
        &self.units
    }

    /// Issue one deletion per unit, in order.
    ///
    /// A failed deletion does not stop the remaining ones and nothing is
    /// rolled back; failures are collected in the report.
    pub fn evict<C>(&self, cache: &C) -> EvictionReport
    where
        C: ModuleCache + ?Sized,
    {
        let mut report = EvictionReport::default();

        for unit in &self.units {
            match cache.evict(unit) {
                Ok(true) => report.evicted.push(unit.clone()),
                Ok(false) => debug!(%unit, "unit already gone from cache"),
                Err(err) => {
                    warn!(%unit, error = %err, "eviction failed");
                    report.failures.push(err);
                }
            }
        }

        report
    }
}

/// Outcome of evicting an [`InvalidationResult`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionReport {
    /// Units actually removed, in eviction order.
    pub evicted: Vec<UnitId>,
    /// Deletions the cache refused.
    pub failures: Vec<EvictionError>,
}

impl EvictionReport {
    /// True if no deletion failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
