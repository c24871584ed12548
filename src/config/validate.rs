// src/config/validate.rs

use std::collections::HashSet;

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{HmrError, Result};
use crate::unit::reference_key;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = HmrError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.watch, raw.namespaces, raw.unit))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_watch(cfg)?;
    validate_namespaces(cfg)?;
    validate_units(cfg)?;
    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.paths.is_empty() {
        return Err(HmrError::ConfigError(
            "[watch].paths must name at least one file, directory or glob".to_string(),
        ));
    }
    if let Some(blank) = cfg.watch.paths.iter().find(|p| p.trim().is_empty()) {
        return Err(HmrError::ConfigError(format!(
            "[watch].paths contains an empty entry: {blank:?}"
        )));
    }

    for pattern in cfg.watch.paths.iter().chain(&cfg.watch.ignored) {
        Glob::new(pattern).map_err(|err| {
            HmrError::ConfigError(format!("invalid glob '{pattern}' in [watch]: {err}"))
        })?;
    }

    if cfg.watch.exclude.iter().any(|e| e.trim().is_empty()) {
        return Err(HmrError::ConfigError(
            "[watch].exclude entries must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_namespaces(cfg: &RawConfigFile) -> Result<()> {
    let ns = &cfg.namespaces;
    if ns.builtin_prefixes.iter().any(|p| p.is_empty()) {
        return Err(HmrError::ConfigError(
            "[namespaces].builtin_prefixes entries must not be empty".to_string(),
        ));
    }
    if ns.vendor_markers.iter().any(|m| m.is_empty()) {
        return Err(HmrError::ConfigError(
            "[namespaces].vendor_markers entries must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Unit paths must be unique and every link must name a declared unit.
/// References are compared after normalisation, so `./a.rs` and `a.rs` are
/// the same unit. Cycles are fine: the runtime link graph may contain them.
fn validate_units(cfg: &RawConfigFile) -> Result<()> {
    let mut declared: HashSet<String> = HashSet::new();
    for unit in &cfg.unit {
        if unit.path.trim().is_empty() {
            return Err(HmrError::ConfigError(
                "[[unit]] entries must have a non-empty `path`".to_string(),
            ));
        }
        if !declared.insert(reference_key(&unit.path)) {
            return Err(HmrError::ConfigError(format!(
                "unit '{}' is declared more than once",
                unit.path
            )));
        }
    }

    for unit in &cfg.unit {
        for link in &unit.links {
            if !declared.contains(&reference_key(link)) {
                return Err(HmrError::ConfigError(format!(
                    "unit '{}' links to undeclared unit '{}'",
                    unit.path, link
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::UnitEntry;

    fn raw(paths: &[&str]) -> RawConfigFile {
        let mut cfg = RawConfigFile::default();
        cfg.watch.paths = paths.iter().map(|s| s.to_string()).collect();
        cfg
    }

    fn unit(path: &str, links: &[&str]) -> UnitEntry {
        UnitEntry {
            path: path.to_string(),
            links: links.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn minimal_config_is_valid() {
        let cfg = ConfigFile::try_from(raw(&["src"])).unwrap();
        assert!(cfg.watch.ignore_hidden);
        assert!(cfg.unit.is_empty());
    }

    #[test]
    fn watch_paths_are_required() {
        let err = ConfigFile::try_from(raw(&[])).unwrap_err();
        assert!(err.to_string().contains("[watch].paths"));
    }

    #[test]
    fn bad_ignore_glob_is_rejected() {
        let mut cfg = raw(&["src"]);
        cfg.watch.ignored.push("src/[".to_string());
        let err = ConfigFile::try_from(cfg).unwrap_err();
        assert!(err.to_string().contains("src/["));
    }

    #[test]
    fn empty_namespace_entries_are_rejected() {
        let mut cfg = raw(&["src"]);
        cfg.namespaces.vendor_markers.push(String::new());
        assert!(ConfigFile::try_from(cfg).is_err());
    }

    #[test]
    fn duplicate_units_are_rejected() {
        let mut cfg = raw(&["src"]);
        cfg.unit = vec![unit("a.rs", &[]), unit("a.rs", &[])];
        let err = ConfigFile::try_from(cfg).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn links_must_name_declared_units() {
        let mut cfg = raw(&["src"]);
        cfg.unit = vec![unit("a.rs", &["b.rs"])];
        let err = ConfigFile::try_from(cfg).unwrap_err();
        assert!(err.to_string().contains("undeclared unit 'b.rs'"));
    }

    #[test]
    fn links_match_differently_spelled_paths() {
        let mut cfg = raw(&["src"]);
        cfg.unit = vec![unit("src/a.rs", &[]), unit("src/b.rs", &["./src/a.rs", "src/x/../a.rs"])];
        assert!(ConfigFile::try_from(cfg).is_ok());
    }

    #[test]
    fn same_unit_spelled_twice_is_a_duplicate() {
        let mut cfg = raw(&["src"]);
        cfg.unit = vec![unit("src/a.rs", &[]), unit("./src/a.rs", &[])];
        let err = ConfigFile::try_from(cfg).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn cyclic_units_are_allowed() {
        let mut cfg = raw(&["src"]);
        cfg.unit = vec![unit("a.rs", &["b.rs"]), unit("b.rs", &["a.rs"])];
        assert!(ConfigFile::try_from(cfg).is_ok());
    }
}
