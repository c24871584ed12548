// src/watch/watcher.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::watch::path_utils::nearest_existing;
use crate::watch::patterns::WatchFilter;
use crate::watch::{FsEvent, WatchBackend, WatchOptions};

/// Filesystem watcher built on `notify`.
///
/// Owns the underlying `RecommendedWatcher`; dropping or closing this handle
/// stops file watching, which in turn ends the translator task.
pub struct NotifyWatcher {
    watcher: Option<RecommendedWatcher>,
    filter: Arc<RwLock<WatchFilter>>,
    /// Directories currently registered with `notify`.
    active: BTreeMap<PathBuf, RecursiveMode>,
}

impl std::fmt::Debug for NotifyWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyWatcher")
            .field("active", &self.active)
            .field("closed", &self.watcher.is_none())
            .finish_non_exhaustive()
    }
}

impl NotifyWatcher {
    /// Start watching `options.paths` and forward relevant changes to
    /// `events_tx`.
    ///
    /// Files already present are not reported. Must be called from within a
    /// Tokio runtime.
    pub fn spawn(options: &WatchOptions, events_tx: mpsc::Sender<FsEvent>) -> Result<Self> {
        let filter = WatchFilter::new(&options.root, &options.ignored, options.ignore_hidden)?;
        let filter = Arc::new(RwLock::new(filter));

        // Channel from the blocking notify callback into the async world.
        let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<Event>();

        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if raw_tx.send(event).is_err() {
                        debug!("translator gone; dropping notify event");
                    }
                }
                Err(err) => warn!("file watch error: {err}"),
            },
            Config::default(),
        )?;

        let translator_filter = Arc::clone(&filter);
        tokio::spawn(async move {
            while let Some(event) = raw_rx.recv().await {
                debug!(?event, "received notify event");

                for fs_event in translate(&event) {
                    let relevant = translator_filter.read().is_relevant(&fs_event.path);
                    if !relevant {
                        continue;
                    }
                    if events_tx.send(fs_event).await.is_err() {
                        debug!("coordinator gone; stopping translator");
                        return;
                    }
                }
            }
            debug!("watcher event loop finished");
        });

        let mut this = Self {
            watcher: Some(watcher),
            filter,
            active: BTreeMap::new(),
        };
        this.add(&options.paths)?;

        info!(root = ?options.root, targets = ?options.paths, "file watcher started");
        Ok(this)
    }

    /// Bring the set of `notify` registrations in line with the filter.
    fn sync_watches(&mut self) {
        let Some(watcher) = self.watcher.as_mut() else {
            return;
        };
        let wanted = required_watches(&self.filter.read());

        let stale: Vec<PathBuf> = self
            .active
            .iter()
            .filter(|(dir, mode)| wanted.get(*dir) != Some(*mode))
            .map(|(dir, _)| dir.clone())
            .collect();
        for dir in stale {
            if let Err(err) = watcher.unwatch(&dir) {
                debug!(?dir, error = %err, "unwatch failed");
            }
            self.active.remove(&dir);
        }

        for (dir, mode) in wanted {
            if self.active.contains_key(&dir) {
                continue;
            }
            match watcher.watch(&dir, mode) {
                Ok(()) => {
                    debug!(?dir, ?mode, "watching directory");
                    self.active.insert(dir, mode);
                }
                Err(err) => warn!(?dir, error = %err, "cannot watch path"),
            }
        }
    }
}

impl WatchBackend for NotifyWatcher {
    fn add(&mut self, targets: &[String]) -> Result<()> {
        {
            let mut filter = self.filter.write();
            for target in targets {
                filter.add(target)?;
            }
        }
        self.sync_watches();
        Ok(())
    }

    fn unwatch(&mut self, targets: &[String]) -> Result<()> {
        {
            let mut filter = self.filter.write();
            for target in targets {
                filter.unwatch(target)?;
            }
        }
        self.sync_watches();
        Ok(())
    }

    fn watched(&self) -> BTreeMap<PathBuf, Vec<String>> {
        let mut out: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();
        for target in self.filter.read().targets() {
            out.entry(target.base().to_path_buf())
                .or_default()
                .push(target.pattern().to_string());
        }
        out
    }

    fn close(&mut self) {
        if self.watcher.take().is_some() {
            self.active.clear();
            info!("file watcher closed");
        }
    }
}

/// Map a raw `notify` event to zero or more [`FsEvent`]s.
///
/// Directory creation/removal, access and metadata-only events are dropped.
/// A rename yields one `Unlink` for its source and one `Add` for its
/// destination.
pub fn translate(event: &Event) -> Vec<FsEvent> {
    let all = |make: fn(PathBuf) -> FsEvent| -> Vec<FsEvent> {
        event.paths.iter().cloned().map(make).collect()
    };

    match &event.kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => Vec::new(),
        EventKind::Create(_) => all(FsEvent::add),
        EventKind::Remove(_) => all(FsEvent::unlink),
        // Backends that report `Both` also report each side as `From`/`To`.
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => Vec::new(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => all(FsEvent::unlink),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => all(FsEvent::add),
        // Backends that cannot tell which side of a rename they saw.
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|p| {
                if p.exists() {
                    FsEvent::add(p.clone())
                } else {
                    FsEvent::unlink(p.clone())
                }
            })
            .collect(),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => all(FsEvent::change),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

/// Minimal set of directories to register for the filter's targets.
///
/// - glob and directory targets: their base, recursively,
/// - file targets: their parent, non-recursively (editors replace files by
///   renaming, which a watch on the file itself would miss),
/// - targets that do not exist yet: their nearest existing ancestor,
///   recursively, so the target is seen once created,
/// - anything already covered by a recursive ancestor is dropped.
fn required_watches(filter: &WatchFilter) -> BTreeMap<PathBuf, RecursiveMode> {
    let mut candidates: Vec<(PathBuf, RecursiveMode)> = filter
        .targets()
        .iter()
        .filter_map(|t| {
            let dir = watch_dir_for(t.base(), t.is_glob());
            if dir.is_none() {
                warn!(target = t.pattern(), "no existing ancestor to watch");
            }
            dir
        })
        .collect();
    candidates.sort_by(|(a, am), (b, bm)| {
        a.cmp(b)
            .then((*am == RecursiveMode::NonRecursive).cmp(&(*bm == RecursiveMode::NonRecursive)))
    });

    let mut out: BTreeMap<PathBuf, RecursiveMode> = BTreeMap::new();
    for (dir, mode) in candidates {
        let covered = out
            .iter()
            .any(|(kept, kept_mode)| {
                *kept == dir || (*kept_mode == RecursiveMode::Recursive && dir.starts_with(kept))
            });
        if !covered {
            out.insert(dir, mode);
        }
    }
    out
}

fn watch_dir_for(base: &Path, is_glob: bool) -> Option<(PathBuf, RecursiveMode)> {
    if !base.exists() {
        let ancestor = nearest_existing(base)?;
        return Some((ancestor.to_path_buf(), RecursiveMode::Recursive));
    }
    if !is_glob && base.is_file() {
        let parent = base.parent().unwrap_or(base);
        return Some((parent.to_path_buf(), RecursiveMode::NonRecursive));
    }
    Some((base.to_path_buf(), RecursiveMode::Recursive))
}
