// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Path, PathBuf};

/// Characters that make a path segment a glob rather than a literal name.
const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Render a path with forward slashes, as globs expect.
pub fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Split a watch pattern into its literal leading directory and the rest.
///
/// - `"src/**/*.rs"` -> `("src", Some("**/*.rs"))`
/// - `"**/*.rs"` -> `("", Some("**/*.rs"))`
/// - `"src/main.rs"` -> `("src/main.rs", None)`
pub fn split_glob(pattern: &str) -> (String, Option<String>) {
    let normalized = pattern.replace('\\', "/");
    let segments: Vec<&str> = normalized.split('/').collect();

    match segments.iter().position(|s| s.contains(GLOB_META)) {
        None => (normalized, None),
        Some(idx) => {
            let base = segments[..idx].join("/");
            let rest = segments[idx..].join("/");
            (base, Some(rest))
        }
    }
}

/// Returns true if `path` is `prefix` or lies beneath it.
pub fn is_within(path: &Path, prefix: &Path) -> bool {
    path.starts_with(prefix)
}

/// Closest ancestor of `path` (or `path` itself) that exists on disk.
pub fn nearest_existing(path: &Path) -> Option<&Path> {
    path.ancestors().find(|p| !p.as_os_str().is_empty() && p.exists())
}

/// Canonicalise the existing part of `path` and re-append the rest, so a
/// path that does not exist yet is spelled like one that does.
pub fn canonicalize_lenient(path: &Path) -> PathBuf {
    let Some(existing) = nearest_existing(path) else {
        return path.to_path_buf();
    };
    let Ok(canonical) = existing.canonicalize() else {
        return path.to_path_buf();
    };
    match path.strip_prefix(existing) {
        Ok(rest) if !rest.as_os_str().is_empty() => canonical.join(rest),
        _ => canonical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_glob_variants() {
        assert_eq!(
            split_glob("src/**/*.rs"),
            ("src".to_string(), Some("**/*.rs".to_string()))
        );
        assert_eq!(
            split_glob("**/*.rs"),
            (String::new(), Some("**/*.rs".to_string()))
        );
        assert_eq!(split_glob("src/main.rs"), ("src/main.rs".to_string(), None));
        assert_eq!(
            split_glob("/abs/lib/*.{js,ts}"),
            ("/abs/lib".to_string(), Some("*.{js,ts}".to_string()))
        );
    }

    #[test]
    fn within_checks_components() {
        assert!(is_within(Path::new("/a/b/c"), Path::new("/a/b")));
        assert!(is_within(Path::new("/a/b"), Path::new("/a/b")));
        assert!(!is_within(Path::new("/a/bc"), Path::new("/a/b")));
    }

    #[test]
    fn missing_paths_keep_their_tail() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let missing = dir.path().join("later").join("a.rs");

        assert_eq!(nearest_existing(&missing), Some(dir.path()));
        assert_eq!(canonicalize_lenient(&missing), root.join("later").join("a.rs"));
    }
}
