// src/config/model.rs

use serde::Deserialize;

use crate::resolve::namespace::{DEFAULT_BUILTIN_PREFIXES, DEFAULT_VENDOR_MARKERS};
use crate::resolve::NamespaceFilter;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [watch]
/// paths = ["src/**/*.rs"]
/// ignored = ["**/target/**"]
/// exclude = ["src/shim.rs"]
///
/// [namespaces]
/// builtin_prefixes = ["builtin:"]
///
/// [[unit]]
/// path = "src/a.rs"
/// links = ["src/b.rs"]
/// ```
///
/// All sections are optional and have reasonable defaults. This is the
/// unvalidated form; convert with `ConfigFile::try_from`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub namespaces: NamespaceSection,

    /// Units the manifest runtime loads at startup, from `[[unit]]`.
    #[serde(default)]
    pub unit: Vec<UnitEntry>,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Files, directories or globs to watch, relative to the config directory.
    #[serde(default)]
    pub paths: Vec<String>,

    /// Extra ignore globs.
    #[serde(default)]
    pub ignored: Vec<String>,

    /// Skip dot-files and dot-directories below each watch target.
    #[serde(default = "default_ignore_hidden")]
    pub ignore_hidden: bool,

    /// Units never treated as dependents: paths relative to the config
    /// directory, or scheme-qualified identifiers such as `builtin:fs`.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_ignore_hidden() -> bool {
    true
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            ignored: Vec::new(),
            ignore_hidden: default_ignore_hidden(),
            exclude: Vec::new(),
        }
    }
}

/// `[namespaces]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamespaceSection {
    #[serde(default = "default_builtin_prefixes")]
    pub builtin_prefixes: Vec<String>,

    #[serde(default = "default_vendor_markers")]
    pub vendor_markers: Vec<String>,
}

fn default_builtin_prefixes() -> Vec<String> {
    DEFAULT_BUILTIN_PREFIXES.iter().map(|s| s.to_string()).collect()
}

fn default_vendor_markers() -> Vec<String> {
    DEFAULT_VENDOR_MARKERS.iter().map(|s| s.to_string()).collect()
}

impl Default for NamespaceSection {
    fn default() -> Self {
        Self {
            builtin_prefixes: default_builtin_prefixes(),
            vendor_markers: default_vendor_markers(),
        }
    }
}

impl NamespaceSection {
    pub fn to_filter(&self) -> NamespaceFilter {
        NamespaceFilter::new(self.builtin_prefixes.clone(), self.vendor_markers.clone())
    }
}

/// One `[[unit]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitEntry {
    pub path: String,

    /// Paths of the units this one links against.
    #[serde(default)]
    pub links: Vec<String>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub watch: WatchSection,
    pub namespaces: NamespaceSection,
    pub unit: Vec<UnitEntry>,
}

impl ConfigFile {
    /// Construct without validation. Prefer `ConfigFile::try_from`.
    pub(crate) fn new_unchecked(
        watch: WatchSection,
        namespaces: NamespaceSection,
        unit: Vec<UnitEntry>,
    ) -> Self {
        Self {
            watch,
            namespaces,
            unit,
        }
    }
}
