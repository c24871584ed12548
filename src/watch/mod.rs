// src/watch/mod.rs

//! Filesystem change source.
//!
//! This module is responsible for:
//! - Turning watch targets (plain paths or globs) and ignore rules into a
//!   path filter.
//! - Wiring up a cross-platform filesystem watcher (`notify`) that watches
//!   the minimal set of directories for those targets.
//! - Translating raw `notify` events into [`FsEvent`]s.
//!
//! It does **not** know about units or the module cache; the coordinator
//! consumes the [`FsEvent`] stream and decides what to evict.

pub mod path_utils;
pub mod patterns;
pub mod watcher;

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::errors::Result;

pub use patterns::{WatchFilter, WatchTarget};
pub use watcher::NotifyWatcher;

/// Kind of filesystem change, as seen by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    /// A new path matched the watch set.
    Add,
    /// An existing file was modified.
    Change,
    /// A file was deleted (or renamed away).
    Unlink,
}

/// One filesystem notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub kind: FsEventKind,
    pub path: PathBuf,
}

impl FsEvent {
    pub fn new(kind: FsEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    pub fn add(path: impl Into<PathBuf>) -> Self {
        Self::new(FsEventKind::Add, path)
    }

    pub fn change(path: impl Into<PathBuf>) -> Self {
        Self::new(FsEventKind::Change, path)
    }

    pub fn unlink(path: impl Into<PathBuf>) -> Self {
        Self::new(FsEventKind::Unlink, path)
    }
}

/// Initial configuration of a watch source.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Directory that relative targets and ignore globs are resolved against.
    pub root: PathBuf,
    /// Plain paths or globs to watch.
    pub paths: Vec<String>,
    /// Extra ignore globs.
    pub ignored: Vec<String>,
    /// Ignore paths with a component starting with `.`.
    pub ignore_hidden: bool,
}

impl WatchOptions {
    pub fn new(root: impl Into<PathBuf>, paths: Vec<String>) -> Self {
        Self {
            root: root.into(),
            paths,
            ignored: Vec::new(),
            ignore_hidden: true,
        }
    }
}

/// Trait abstracting the filesystem watcher behind the coordinator.
///
/// Production code uses [`NotifyWatcher`]; tests provide a fake that records
/// calls and feeds [`FsEvent`]s by hand.
pub trait WatchBackend: Send {
    /// Start watching additional targets.
    fn add(&mut self, targets: &[String]) -> Result<()>;

    /// Stop watching targets, or ignore paths beneath existing targets.
    fn unwatch(&mut self, targets: &[String]) -> Result<()>;

    /// Watched base directories and the target patterns rooted at each.
    fn watched(&self) -> BTreeMap<PathBuf, Vec<String>>;

    /// Stop watching and release resources. Must be idempotent.
    fn close(&mut self);
}
