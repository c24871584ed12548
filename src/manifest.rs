// src/manifest.rs

//! In-memory stand-in for a host runtime, seeded from `[[unit]]` entries.
//!
//! The `hmr` binary has no real module loader to attach to. Instead it
//! "loads" the units declared in the config into a [`MemoryModuleCache`] and
//! exposes that cache through [`CacheLocator`], exactly as an embedding host
//! would.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::cache::{CacheLocator, MemoryModuleCache, ModuleCache};
use crate::config::ConfigFile;
use crate::errors::Result;
use crate::unit::{UnitId, has_scheme};

#[derive(Debug, Clone)]
pub struct ManifestRuntime {
    root: PathBuf,
    /// Declared units and their links, in declaration order.
    units: IndexMap<UnitId, Vec<UnitId>>,
    cache: MemoryModuleCache,
}

impl ManifestRuntime {
    /// Resolve every `[[unit]]` against `root` and load them all.
    pub fn from_config(cfg: &ConfigFile, root: &Path) -> Result<Self> {
        let mut units = IndexMap::with_capacity(cfg.unit.len());
        for entry in &cfg.unit {
            let unit = resolve_unit_ref(root, &entry.path)?;
            let links = entry
                .links
                .iter()
                .map(|link| resolve_unit_ref(root, link))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            units.insert(unit, links);
        }

        let runtime = Self {
            root: root.to_path_buf(),
            units,
            cache: MemoryModuleCache::new(),
        };
        for (unit, links) in &runtime.units {
            runtime.cache.insert(unit.clone(), links.iter().cloned());
        }
        info!(units = runtime.units.len(), "manifest runtime loaded");
        Ok(runtime)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache(&self) -> &MemoryModuleCache {
        &self.cache
    }

    /// Declared units, in declaration order.
    pub fn units(&self) -> impl Iterator<Item = &UnitId> {
        self.units.keys()
    }

    /// Load `units` again with their declared links, as a host would on the
    /// next import. Units not in the manifest are skipped. Returns how many
    /// were loaded.
    pub fn reload(&self, units: &[UnitId]) -> usize {
        let mut loaded = 0;
        for unit in units {
            match self.units.get(unit) {
                Some(links) => {
                    self.cache.insert(unit.clone(), links.iter().cloned());
                    loaded += 1;
                }
                None => debug!(%unit, "not in manifest; not reloaded"),
            }
        }
        loaded
    }
}

impl CacheLocator for ManifestRuntime {
    fn name(&self) -> &str {
        "manifest"
    }

    fn locate(&self) -> Option<Arc<dyn ModuleCache>> {
        Some(Arc::new(self.cache.clone()))
    }
}

/// Turn a config reference into a unit identifier.
///
/// Scheme-qualified names (`builtin:fs`, `file:///x.rs`) are taken as is;
/// anything else is a path relative to `root`.
pub fn resolve_unit_ref(root: &Path, reference: &str) -> Result<UnitId> {
    if has_scheme(reference) {
        return Ok(UnitId::new(reference));
    }
    Ok(UnitId::from_path_in(root, Path::new(reference))?)
}
