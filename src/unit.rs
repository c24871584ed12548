// src/unit.rs

//! Unit identifiers and link records.
//!
//! A [`UnitId`] is the canonical, scheme-qualified name of one loaded unit of
//! code. Filesystem paths are turned into identifiers with
//! [`UnitId::from_path`], which makes the path absolute, strips `.`/`..`
//! lexically and normalises separators, so the same file never produces two
//! distinct identifiers on one machine.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::errors::IdentifierMappingError;

/// Scheme prefix for file units.
///
/// - Windows: `file:///C:/path/to/file.rs`
/// - Unix: `file:///path/to/file.rs` (the path itself starts with `/`)
#[cfg(windows)]
pub const FILE_URL_PREFIX: &str = "file:///";
#[cfg(not(windows))]
pub const FILE_URL_PREFIX: &str = "file://";

/// Canonical identifier of one loaded unit.
///
/// Compared by exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(String);

impl UnitId {
    /// Adopt an identifier that is already canonical (e.g. `builtin:fs` or a
    /// `file://` URL reported by the host runtime).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Map a filesystem path to a unit identifier, resolving relative paths
    /// against the current working directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IdentifierMappingError> {
        let path = path.as_ref();
        if path.is_absolute() || path.as_os_str().is_empty() {
            return Self::from_path_in(Path::new(""), path);
        }

        let cwd = std::env::current_dir().map_err(|err| {
            IdentifierMappingError::new(path, format!("current directory unavailable: {err}"))
        })?;
        Self::from_path_in(&cwd, path)
    }

    /// Map a filesystem path to a unit identifier, resolving relative paths
    /// against `base`.
    pub fn from_path_in(base: &Path, path: &Path) -> Result<Self, IdentifierMappingError> {
        if path.as_os_str().is_empty() {
            return Err(IdentifierMappingError::new(path, "empty path"));
        }

        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        };
        let absolute = normalize_path(&joined);
        if !absolute.is_absolute() {
            return Err(IdentifierMappingError::new(
                path,
                format!("{joined:?} does not resolve to an absolute path"),
            ));
        }

        let text = absolute
            .to_str()
            .ok_or_else(|| IdentifierMappingError::new(path, "path is not valid UTF-8"))?;

        Ok(Self(format!(
            "{FILE_URL_PREFIX}{}",
            normalize_separators(text)
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier names a file on disk (`file://` scheme).
    pub fn is_file(&self) -> bool {
        self.0.starts_with("file://")
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UnitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UnitId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UnitId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The units one unit has linked against, in the order the runtime recorded
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRecord(Vec<UnitId>);

impl LinkRecord {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns true if this record links against `unit`.
    pub fn links_to(&self, unit: &UnitId) -> bool {
        self.0.iter().any(|linked| linked == unit)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UnitId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<UnitId> for LinkRecord {
    fn from_iter<I: IntoIterator<Item = UnitId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a LinkRecord {
    type Item = &'a UnitId;
    type IntoIter = std::slice::Iter<'a, UnitId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Remove `.` and `..` components without touching the filesystem.
///
/// `..` at the root stays at the root, matching how shells resolve `/..`.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Does `reference` start with a `scheme:` of two or more characters?
///
/// `builtin:fs` and `file:///x.rs` do; `C:/x.rs` and `src/x.rs` don't.
pub(crate) fn has_scheme(reference: &str) -> bool {
    match reference.find(':') {
        Some(idx) if idx > 1 => reference[..idx]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')),
        _ => false,
    }
}

/// Spelling-independent key for a unit reference as written in config.
///
/// Scheme-qualified names are kept as is; paths are normalised lexically, so
/// `./src/a.rs` and `src/lib/../a.rs` share the key `src/a.rs`.
pub(crate) fn reference_key(reference: &str) -> String {
    if has_scheme(reference) {
        return reference.to_string();
    }
    normalize_separators(&normalize_path(Path::new(reference)).to_string_lossy())
}

/// Forward slashes everywhere and an upper-case drive letter (`c:/x` and
/// `C:/x` are the same file on Windows).
fn normalize_separators(text: &str) -> String {
    let mut out = text.replace('\\', "/");
    let bytes = out.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        let drive = (bytes[0] as char).to_ascii_uppercase();
        out.replace_range(0..1, &drive.to_string());
    }
    out
}
