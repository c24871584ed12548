// src/cache/memory.rs

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::cache::{LinkFuture, ModuleCache, ModuleCacheView, UnitIter};
use crate::errors::{EvictionError, LinkInspectionError};
use crate::unit::{LinkRecord, UnitId};

/// Linkage state of one cached unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Linkage {
    /// The runtime has finished linking; the record is complete.
    Linked(LinkRecord),
    /// The unit is cached but its dependencies are still being linked.
    Linking,
}

/// In-memory module cache.
///
/// Stands in for a host runtime's cache in tests and in the manifest-backed
/// demo runtime. Clones share the same underlying map, so one clone can play
/// the "runtime" mutating entries while another is handed to the coordinator.
///
/// Entries keep load order: a unit re-inserted after eviction goes to the end.
#[derive(Debug, Clone, Default)]
pub struct MemoryModuleCache {
    entries: Arc<RwLock<IndexMap<UnitId, Linkage>>>,
}

impl MemoryModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `unit` as loaded and fully linked against `links`.
    ///
    /// Replacing an existing entry keeps its position.
    pub fn insert(&self, unit: UnitId, links: impl IntoIterator<Item = UnitId>) {
        let record: LinkRecord = links.into_iter().collect();
        self.entries.write().insert(unit, Linkage::Linked(record));
    }

    /// Record `unit` as loaded with linkage still in flight.
    pub fn insert_linking(&self, unit: UnitId) {
        self.entries.write().insert(unit, Linkage::Linking);
    }

    /// Complete the linkage of an entry added with [`insert_linking`].
    ///
    /// Returns false if `unit` is not cached.
    ///
    /// [`insert_linking`]: Self::insert_linking
    pub fn link(&self, unit: &UnitId, links: impl IntoIterator<Item = UnitId>) -> bool {
        let mut entries = self.entries.write();
        match entries.get_mut(unit) {
            Some(linkage) => {
                *linkage = Linkage::Linked(links.into_iter().collect());
                true
            }
            None => false,
        }
    }

    pub fn get(&self, unit: &UnitId) -> Option<Linkage> {
        self.entries.read().get(unit).cloned()
    }

    /// Cached units in load order.
    pub fn units_snapshot(&self) -> Vec<UnitId> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ModuleCacheView for MemoryModuleCache {
    fn contains(&self, unit: &UnitId) -> bool {
        self.entries.read().contains_key(unit)
    }

    fn units(&self) -> UnitIter<'_> {
        Box::new(self.units_snapshot().into_iter())
    }

    fn links<'a>(&'a self, unit: &'a UnitId) -> LinkFuture<'a> {
        let result = match self.entries.read().get(unit) {
            Some(Linkage::Linked(record)) => Ok(record.clone()),
            Some(Linkage::Linking) => Err(LinkInspectionError::Pending(unit.clone())),
            None => Err(LinkInspectionError::Missing(unit.clone())),
        };
        Box::pin(std::future::ready(result))
    }
}

impl ModuleCache for MemoryModuleCache {
    fn evict(&self, unit: &UnitId) -> Result<bool, EvictionError> {
        // shift_remove keeps the remaining entries in load order.
        Ok(self.entries.write().shift_remove(unit).is_some())
    }
}
