// src/engine/coordinator.rs

//! Public handle over a watcher plus the invalidation runtime.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::ModuleCache;
use crate::errors::Result;
use crate::resolve::DependencyResolver;
use crate::watch::{FsEvent, NotifyWatcher, WatchBackend, WatchOptions};

use super::core::InvalidationCore;
use super::runtime::Runtime;
use super::{CoordinatorOptions, CoordinatorState, HmrEvent};

/// Capacity of the watcher -> runtime channel.
const FS_EVENT_BUFFER: usize = 64;

/// Watches files and evicts stale units from a module cache.
///
/// Each accepted filesystem event yields exactly one [`HmrEvent`] on the
/// receiver returned at construction.
pub struct Coordinator<B: WatchBackend> {
    backend: B,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    state: Arc<watch::Sender<CoordinatorState>>,
}

impl<B: WatchBackend> fmt::Debug for Coordinator<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Coordinator<NotifyWatcher> {
    /// Watch `watch.paths` on disk and invalidate `cache` on change.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn watch(
        watch: &WatchOptions,
        cache: Arc<dyn ModuleCache>,
        options: CoordinatorOptions,
    ) -> Result<(Self, mpsc::UnboundedReceiver<HmrEvent>)> {
        let (events_tx, events_rx) = mpsc::channel(FS_EVENT_BUFFER);
        let backend = NotifyWatcher::spawn(watch, events_tx)?;
        Ok(Self::start(backend, events_rx, cache, options))
    }
}

impl<B: WatchBackend> Coordinator<B> {
    /// Start the runtime over an already running watch backend whose events
    /// arrive on `events_rx`.
    pub fn start(
        backend: B,
        events_rx: mpsc::Receiver<FsEvent>,
        cache: Arc<dyn ModuleCache>,
        options: CoordinatorOptions,
    ) -> (Self, mpsc::UnboundedReceiver<HmrEvent>) {
        let (state_tx, _) = watch::channel(CoordinatorState::Idle);
        let state = Arc::new(state_tx);

        let resolver = DependencyResolver::new(options.exclude, options.namespaces);
        let core = InvalidationCore::new(cache, resolver);

        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let runtime = Runtime::new(core, events_rx, notify_tx, shutdown_rx, Arc::clone(&state));

        state.send_replace(CoordinatorState::Watching);
        let task = tokio::spawn(runtime.run());

        let coordinator = Self {
            backend,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
            state,
        };
        (coordinator, notify_rx)
    }

    /// Extend the watch set. No-op once closed.
    pub fn add(&mut self, paths: &[String]) -> Result<()> {
        if self.is_closed() {
            debug!(?paths, "add on closed coordinator ignored");
            return Ok(());
        }
        self.backend.add(paths)
    }

    /// Shrink the watch set. No-op once closed.
    pub fn unwatch(&mut self, paths: &[String]) -> Result<()> {
        if self.is_closed() {
            debug!(?paths, "unwatch on closed coordinator ignored");
            return Ok(());
        }
        self.backend.unwatch(paths)
    }

    /// Watched patterns grouped by the directory they are rooted at.
    pub fn watched(&self) -> BTreeMap<PathBuf, Vec<String>> {
        self.backend.watched()
    }

    pub fn state(&self) -> CoordinatorState {
        *self.state.borrow()
    }

    /// Subscribe to lifecycle changes.
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.state.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.state() == CoordinatorState::Closed
    }

    /// Stop watching and wait for the runtime to finish.
    ///
    /// An event being handled when `close` is called completes (and its
    /// notification is delivered); nothing after it is processed. Calling
    /// `close` again is a no-op.
    pub async fn close(&mut self) {
        if self.is_closed() {
            return;
        }

        self.backend.close();

        if let Some(tx) = self.shutdown_tx.take() {
            // The runtime may already have exited on its own.
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!("invalidation runtime task failed: {err}");
            }
        }

        self.state.send_replace(CoordinatorState::Closed);
        info!("coordinator closed");
    }
}
