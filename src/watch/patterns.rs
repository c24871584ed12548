// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use regex::Regex;

use crate::errors::Result;
use crate::unit::normalize_path;
use crate::watch::path_utils::{canonicalize_lenient, is_within, slash_path, split_glob};

/// Matches a path component starting with `.` (hidden files and dirs).
const HIDDEN_PATH_PATTERN: &str = r"(^|/)\.";

/// One compiled watch target.
///
/// A target is either a plain path (a file, or a directory meaning
/// "everything beneath it") or a glob. Globs are anchored at their literal
/// leading directory, which is what actually gets watched on disk:
///
/// ```text
/// "src/**/*.rs"  ->  base "<root>/src", glob "<root>/src/**/*.rs"
/// ```
#[derive(Clone)]
pub struct WatchTarget {
    pattern: String,
    base: PathBuf,
    glob: Option<GlobMatcher>,
}

impl fmt::Debug for WatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchTarget")
            .field("pattern", &self.pattern)
            .field("base", &self.base)
            .field("glob", &self.glob.as_ref().map(|g| g.glob().glob().to_string()))
            .finish()
    }
}

impl WatchTarget {
    /// Compile `pattern`, resolving it against `root` if relative.
    pub fn parse(root: &Path, pattern: &str) -> Result<Self> {
        let (literal, rest) = split_glob(pattern);

        let base = normalize_path(&root.join(&literal));
        // Same directory, same spelling: keeps event paths and bases comparable
        // on systems where temp dirs live behind symlinks, even for targets
        // that do not exist yet.
        let base = canonicalize_lenient(&base);

        let glob = match rest {
            None => None,
            Some(rest) => {
                let anchored = format!("{}/{}", slash_path(&base).trim_end_matches('/'), rest);
                let matcher = GlobBuilder::new(&anchored)
                    .literal_separator(true)
                    .build()?
                    .compile_matcher();
                Some(matcher)
            }
        };

        Ok(Self {
            pattern: pattern.to_string(),
            base,
            glob,
        })
    }

    /// The pattern as the caller wrote it.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Literal directory (or file) this target is rooted at.
    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn is_glob(&self) -> bool {
        self.glob.is_some()
    }

    /// Identity used to recognise the same target spelled differently.
    fn key(&self) -> String {
        match &self.glob {
            Some(g) => g.glob().glob().to_string(),
            None => slash_path(&self.base),
        }
    }

    /// Returns true if the absolute `path` is covered by this target.
    pub fn matches(&self, path: &Path) -> bool {
        match &self.glob {
            Some(glob) => glob.is_match(slash_path(path)),
            None => is_within(path, &self.base),
        }
    }
}

/// Compiled watch set plus ignore rules.
///
/// Shared between the watcher handle (which mutates it on `add` / `unwatch`)
/// and the event translator (which asks [`is_relevant`](Self::is_relevant)
/// for every raw event path).
#[derive(Debug, Clone)]
pub struct WatchFilter {
    root: PathBuf,
    targets: Vec<WatchTarget>,
    ignored: GlobSet,
    unwatched: Vec<PathBuf>,
    hidden: Option<Regex>,
}

impl WatchFilter {
    /// Build an empty filter.
    ///
    /// `ignored` globs that are relative (and not starting with `**`) are
    /// resolved against `root`.
    pub fn new(root: &Path, ignored: &[String], ignore_hidden: bool) -> Result<Self> {
        let root = normalize_path(root);
        let root = root.canonicalize().unwrap_or(root);

        let mut builder = GlobSetBuilder::new();
        for pattern in ignored {
            let anchored = if pattern.starts_with('/') || pattern.starts_with("**") {
                pattern.clone()
            } else {
                format!("{}/{}", slash_path(&root).trim_end_matches('/'), pattern)
            };
            let glob = GlobBuilder::new(&anchored)
                .literal_separator(true)
                .build()
                .with_context(|| format!("invalid ignore pattern: {pattern}"))?;
            builder.add(glob);
        }

        let hidden = if ignore_hidden {
            Some(Regex::new(HIDDEN_PATH_PATTERN).context("compiling hidden-path pattern")?)
        } else {
            None
        };

        Ok(Self {
            root,
            targets: Vec::new(),
            ignored: builder.build()?,
            unwatched: Vec::new(),
            hidden,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn targets(&self) -> &[WatchTarget] {
        &self.targets
    }

    /// Add a target. Returns false if an equivalent target already exists.
    ///
    /// Adding a path that was previously unwatched lifts that exclusion.
    pub fn add(&mut self, pattern: &str) -> Result<bool> {
        let target = WatchTarget::parse(&self.root, pattern)?;

        self.unwatched
            .retain(|p| !is_within(p, target.base()) && !is_within(target.base(), p));

        let key = target.key();
        if self.targets.iter().any(|t| t.key() == key) {
            return Ok(false);
        }
        self.targets.push(target);
        Ok(true)
    }

    /// Remove a target, or, if `pattern` is not a registered target, ignore
    /// the path it names from now on.
    pub fn unwatch(&mut self, pattern: &str) -> Result<()> {
        let target = WatchTarget::parse(&self.root, pattern)?;
        let key = target.key();

        let before = self.targets.len();
        self.targets.retain(|t| t.key() != key);

        if self.targets.len() == before && !target.is_glob() {
            self.unwatched.push(target.base().to_path_buf());
        }
        Ok(())
    }

    /// Should an event for the absolute `path` reach the coordinator?
    pub fn is_relevant(&self, path: &Path) -> bool {
        let Some(target) = self.targets.iter().find(|t| t.matches(path)) else {
            return false;
        };

        if self.unwatched.iter().any(|p| is_within(path, p)) {
            return false;
        }

        if self.ignored.is_match(slash_path(path)) {
            return false;
        }

        if let Some(hidden) = &self.hidden {
            // Only look below the target base: a project living in a hidden
            // directory must still be watchable.
            let rel = path.strip_prefix(target.base()).unwrap_or(path);
            if hidden.is_match(&slash_path(rel)) {
                return false;
            }
        }

        true
    }
}
