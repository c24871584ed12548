// src/resolve/namespace.rs

use crate::unit::UnitId;

/// Default prefixes marking host built-in units.
pub const DEFAULT_BUILTIN_PREFIXES: &[&str] = &["builtin:", "node:"];

/// Default path segments marking third-party / vendored units.
pub const DEFAULT_VENDOR_MARKERS: &[&str] = &["/node_modules/", "/vendor/"];

/// Namespace categories that are never treated as dependents, whatever their
/// link records say.
///
/// Evicting a host built-in is unsafe, and evicting a vendored package is
/// pointless: neither is edited by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceFilter {
    builtin_prefixes: Vec<String>,
    vendor_markers: Vec<String>,
}

impl NamespaceFilter {
    pub fn new<P, V>(builtin_prefixes: P, vendor_markers: V) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        Self {
            builtin_prefixes: builtin_prefixes.into_iter().map(Into::into).collect(),
            vendor_markers: vendor_markers.into_iter().map(Into::into).collect(),
        }
    }

    /// A filter that excludes nothing.
    pub fn permissive() -> Self {
        Self {
            builtin_prefixes: Vec::new(),
            vendor_markers: Vec::new(),
        }
    }

    pub fn is_builtin(&self, unit: &UnitId) -> bool {
        let id = unit.as_str();
        self.builtin_prefixes.iter().any(|p| id.starts_with(p.as_str()))
    }

    pub fn is_vendored(&self, unit: &UnitId) -> bool {
        let id = unit.as_str();
        self.vendor_markers.iter().any(|m| id.contains(m.as_str()))
    }

    /// True if `unit` belongs to an excluded namespace category.
    pub fn excludes(&self, unit: &UnitId) -> bool {
        self.is_builtin(unit) || self.is_vendored(unit)
    }

    pub fn builtin_prefixes(&self) -> &[String] {
        &self.builtin_prefixes
    }

    pub fn vendor_markers(&self) -> &[String] {
        &self.vendor_markers
    }
}

impl Default for NamespaceFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_BUILTIN_PREFIXES.iter().copied(),
            DEFAULT_VENDOR_MARKERS.iter().copied(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_categories() {
        let filter = NamespaceFilter::default();

        assert!(filter.excludes(&UnitId::from("node:fs")));
        assert!(filter.excludes(&UnitId::from("builtin:path")));
        assert!(filter.excludes(&UnitId::from("file:///app/node_modules/lodash/index.js")));
        assert!(filter.excludes(&UnitId::from("file:///app/vendor/shim.rs")));
        assert!(!filter.excludes(&UnitId::from("file:///app/src/main.rs")));
    }

    #[test]
    fn permissive_filter_excludes_nothing() {
        let filter = NamespaceFilter::permissive();
        assert!(!filter.excludes(&UnitId::from("node:fs")));
        assert!(!filter.excludes(&UnitId::from("file:///app/vendor/shim.rs")));
    }
}
