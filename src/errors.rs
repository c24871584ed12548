// src/errors.rs

//! Crate-wide error types.
//!
//! [`HmrError`] covers construction-time and configuration failures, which
//! are returned to the caller. The per-event and per-candidate errors
//! ([`IdentifierMappingError`], [`LinkInspectionError`], [`EvictionError`])
//! never abort the watch loop; they are logged, skipped, or reported on the
//! event channel.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::unit::UnitId;

#[derive(Error, Debug)]
pub enum HmrError {
    /// The host runtime does not expose module-cache introspection.
    #[error("Unsupported runtime: {0}")]
    UnsupportedRuntime(String),

    #[error(transparent)]
    IdentifierMapping(#[from] IdentifierMappingError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("File watch error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A filesystem path could not be turned into a canonical unit identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot map {path:?} to a unit identifier: {reason}")]
pub struct IdentifierMappingError {
    pub path: PathBuf,
    pub reason: String,
}

impl IdentifierMappingError {
    pub fn new(path: &Path, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// A candidate's link record could not be read during traversal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkInspectionError {
    /// The unit left the cache between enumeration and inspection.
    #[error("unit {0} is no longer cached")]
    Missing(UnitId),

    /// The runtime has not finished linking the unit yet.
    #[error("linkage of {0} is still in flight")]
    Pending(UnitId),

    #[error("link record of {unit} is inconsistent: {reason}")]
    Inconsistent { unit: UnitId, reason: String },
}

/// Deleting one identifier from the cache failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to evict {unit}: {reason}")]
pub struct EvictionError {
    pub unit: UnitId,
    pub reason: String,
}

impl EvictionError {
    pub fn new(unit: UnitId, reason: impl Into<String>) -> Self {
        Self {
            unit,
            reason: reason.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, HmrError>;
