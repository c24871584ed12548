#![allow(dead_code)]

use hmr::cache::MemoryModuleCache;
use hmr::config::{ConfigFile, RawConfigFile, UnitEntry};
use hmr::unit::UnitId;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        self.config.watch.paths.push(pattern.to_string());
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.config.watch.ignored.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, unit: &str) -> Self {
        self.config.watch.exclude.push(unit.to_string());
        self
    }

    pub fn show_hidden(mut self) -> Self {
        self.config.watch.ignore_hidden = false;
        self
    }

    pub fn unit(mut self, path: &str, links: &[&str]) -> Self {
        self.config.unit.push(UnitEntry {
            path: path.to_string(),
            links: links.iter().map(|l| l.to_string()).collect(),
        });
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a `MemoryModuleCache` keyed by short names.
///
/// Names are turned into identifiers with a fixed prefix, so tests can write
/// `("b", &["a"])` instead of full `file://` URLs.
pub struct CacheBuilder {
    prefix: String,
    cache: MemoryModuleCache,
}

impl CacheBuilder {
    /// Identifiers look like `file:///app/<name>`.
    pub fn new() -> Self {
        Self::with_prefix("file:///app/")
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            cache: MemoryModuleCache::new(),
        }
    }

    pub fn id(&self, name: &str) -> UnitId {
        UnitId::from(format!("{}{}", self.prefix, name))
    }

    /// Load `name`, linked against `links`.
    pub fn unit(self, name: &str, links: &[&str]) -> Self {
        let links: Vec<UnitId> = links.iter().map(|l| self.id(l)).collect();
        self.cache.insert(self.id(name), links);
        self
    }

    /// Load a unit under its full identifier.
    pub fn raw_unit(self, id: UnitId, links: Vec<UnitId>) -> Self {
        self.cache.insert(id, links);
        self
    }

    /// Register `name` as still linking.
    pub fn linking(self, name: &str) -> Self {
        self.cache.insert_linking(self.id(name));
        self
    }

    pub fn build(self) -> MemoryModuleCache {
        self.cache
    }
}

impl Default for CacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}
