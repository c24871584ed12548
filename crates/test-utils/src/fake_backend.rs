use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use hmr::errors::Result;
use hmr::watch::WatchBackend;

/// One call observed by [`FakeWatchBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Add(Vec<String>),
    Unwatch(Vec<String>),
    Close,
}

/// A watch backend that watches nothing:
/// - records every `add` / `unwatch` / `close` call
/// - keeps the watched patterns under a single fixed root
///
/// Tests push `FsEvent`s into the coordinator themselves.
pub struct FakeWatchBackend {
    root: PathBuf,
    patterns: Vec<String>,
    calls: Arc<Mutex<Vec<BackendCall>>>,
}

impl FakeWatchBackend {
    pub fn new(root: impl Into<PathBuf>, calls: Arc<Mutex<Vec<BackendCall>>>) -> Self {
        Self {
            root: root.into(),
            patterns: Vec::new(),
            calls,
        }
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl WatchBackend for FakeWatchBackend {
    fn add(&mut self, targets: &[String]) -> Result<()> {
        self.record(BackendCall::Add(targets.to_vec()));
        for t in targets {
            if !self.patterns.contains(t) {
                self.patterns.push(t.clone());
            }
        }
        Ok(())
    }

    fn unwatch(&mut self, targets: &[String]) -> Result<()> {
        self.record(BackendCall::Unwatch(targets.to_vec()));
        self.patterns.retain(|p| !targets.contains(p));
        Ok(())
    }

    fn watched(&self) -> BTreeMap<PathBuf, Vec<String>> {
        let mut out = BTreeMap::new();
        if !self.patterns.is_empty() {
            out.insert(self.root.clone(), self.patterns.clone());
        }
        out
    }

    fn close(&mut self) {
        self.record(BackendCall::Close);
    }
}
