// src/cache/mod.rs

//! Module cache capability.
//!
//! The module cache is owned by the host runtime, not by this crate. We only
//! see it through two narrow traits:
//!
//! - [`ModuleCacheView`]: read-only membership test, enumeration of loaded
//!   units, and per-unit link records.
//! - [`ModuleCache`]: the view plus eviction, used by the coordinator once the
//!   resolver has decided what is stale.
//!
//! A host that does not expose its cache at all is reported through
//! [`acquire_cache`] as [`HmrError::UnsupportedRuntime`].

pub mod memory;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{EvictionError, HmrError, LinkInspectionError, Result};
use crate::unit::{LinkRecord, UnitId};

pub use memory::{Linkage, MemoryModuleCache};

/// Future returned by [`ModuleCacheView::links`].
pub type LinkFuture<'a> =
    Pin<Box<dyn Future<Output = std::result::Result<LinkRecord, LinkInspectionError>> + Send + 'a>>;

/// Lazy enumeration of the units present in the cache.
pub type UnitIter<'a> = Box<dyn Iterator<Item = UnitId> + Send + 'a>;

/// Read-only view over the host runtime's module cache.
///
/// Implementations must tolerate the host mutating the cache while a caller
/// is enumerating it: a unit yielded by [`units`](Self::units) may be gone by
/// the time its links are inspected, in which case `links` returns
/// [`LinkInspectionError::Missing`].
pub trait ModuleCacheView: Send + Sync {
    /// Is `unit` currently loaded?
    fn contains(&self, unit: &UnitId) -> bool;

    /// Units loaded at the time of the call, in load order.
    fn units(&self) -> UnitIter<'_>;

    /// Link record of `unit`.
    ///
    /// Asynchronous because some hosts only produce linkage information once
    /// their loader has finished linking the unit.
    fn links<'a>(&'a self, unit: &'a UnitId) -> LinkFuture<'a>;
}

/// A module cache that also accepts deletion requests.
pub trait ModuleCache: ModuleCacheView {
    /// Remove `unit` from the cache.
    ///
    /// Returns `Ok(false)` if the unit was not present.
    fn evict(&self, unit: &UnitId) -> std::result::Result<bool, EvictionError>;
}

/// One way of locating the host runtime's module cache.
///
/// Hosts may expose the cache in different places depending on their version;
/// [`acquire_cache`] tries each locator in turn.
pub trait CacheLocator {
    fn name(&self) -> &str;

    fn locate(&self) -> Option<Arc<dyn ModuleCache>>;
}

/// Obtain the module cache from the first locator that exposes one.
///
/// Fails with [`HmrError::UnsupportedRuntime`] if none does. Callers should
/// treat that as fatal; the capability either exists on this host or it
/// doesn't.
pub fn acquire_cache(locators: &[&dyn CacheLocator]) -> Result<Arc<dyn ModuleCache>> {
    let mut tried = Vec::with_capacity(locators.len());

    for locator in locators {
        match locator.locate() {
            Some(cache) => {
                info!(locator = locator.name(), "module cache acquired");
                return Ok(cache);
            }
            None => {
                debug!(locator = locator.name(), "module cache not exposed");
                tried.push(locator.name().to_string());
            }
        }
    }

    let detail = if tried.is_empty() {
        "no module cache locators configured".to_string()
    } else {
        format!("module cache not exposed (tried: {})", tried.join(", "))
    };
    Err(HmrError::UnsupportedRuntime(detail))
}
