// tests/coordinator_events.rs

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use hmr::cache::{LinkFuture, MemoryModuleCache, ModuleCache, ModuleCacheView, UnitIter};
use hmr::engine::{Coordinator, CoordinatorOptions, CoordinatorState, HmrEvent};
use hmr::errors::EvictionError;
use hmr::unit::UnitId;
use hmr::watch::FsEvent;
use hmr_test_utils::fake_backend::{BackendCall, FakeWatchBackend};
use hmr_test_utils::{init_tracing, with_timeout};

/// Absolute path for `name` plus the unit identifier it maps to.
fn unit(name: &str) -> (PathBuf, UnitId) {
    let path = std::env::temp_dir().join("hmr-app").join(name);
    let id = UnitId::from_path(&path).unwrap();
    (path, id)
}

fn id(name: &str) -> UnitId {
    unit(name).1
}

fn path(name: &str) -> PathBuf {
    unit(name).0
}

fn cache_of(entries: &[(&str, &[&str])]) -> MemoryModuleCache {
    let cache = MemoryModuleCache::new();
    for (name, links) in entries {
        cache.insert(id(name), links.iter().map(|l| id(l)));
    }
    cache
}

/// Wraps a memory cache, records eviction calls and refuses to evict `refuse`.
struct RecordingCache {
    inner: MemoryModuleCache,
    refuse: Option<UnitId>,
    evictions: Mutex<Vec<UnitId>>,
}

impl RecordingCache {
    fn new(inner: MemoryModuleCache) -> Self {
        Self {
            inner,
            refuse: None,
            evictions: Mutex::new(Vec::new()),
        }
    }

    fn eviction_calls(&self) -> Vec<UnitId> {
        self.evictions.lock().unwrap().clone()
    }
}

impl ModuleCacheView for RecordingCache {
    fn contains(&self, unit: &UnitId) -> bool {
        self.inner.contains(unit)
    }

    fn units(&self) -> UnitIter<'_> {
        self.inner.units()
    }

    fn links<'a>(&'a self, unit: &'a UnitId) -> LinkFuture<'a> {
        self.inner.links(unit)
    }
}

impl ModuleCache for RecordingCache {
    fn evict(&self, unit: &UnitId) -> Result<bool, EvictionError> {
        self.evictions.lock().unwrap().push(unit.clone());
        if self.refuse.as_ref() == Some(unit) {
            return Err(EvictionError::new(unit.clone(), "unit is executing"));
        }
        self.inner.evict(unit)
    }
}

struct Harness {
    coordinator: Coordinator<FakeWatchBackend>,
    events_tx: mpsc::Sender<FsEvent>,
    notifications: mpsc::UnboundedReceiver<HmrEvent>,
    calls: Arc<Mutex<Vec<BackendCall>>>,
}

impl Harness {
    fn start(cache: Arc<dyn ModuleCache>, exclude: Vec<UnitId>) -> Self {
        init_tracing();

        let calls = Arc::new(Mutex::new(Vec::new()));
        let backend = FakeWatchBackend::new(std::env::temp_dir().join("hmr-app"), Arc::clone(&calls));
        let (events_tx, events_rx) = mpsc::channel(16);
        let options = CoordinatorOptions {
            exclude,
            ..CoordinatorOptions::default()
        };

        let (coordinator, notifications) = Coordinator::start(backend, events_rx, cache, options);
        Self {
            coordinator,
            events_tx,
            notifications,
            calls,
        }
    }

    async fn send(&self, event: FsEvent) {
        self.events_tx.send(event).await.unwrap();
    }

    async fn next(&mut self) -> HmrEvent {
        with_timeout(self.notifications.recv())
            .await
            .expect("notification channel closed")
    }

    fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn change_evicts_unit_and_transitive_dependents() {
    let cache = cache_of(&[("a.rs", &[]), ("b.rs", &["a.rs"]), ("c.rs", &["b.rs"])]);
    let mut h = Harness::start(Arc::new(cache.clone()), vec![]);

    h.send(FsEvent::change(path("a.rs"))).await;

    match h.next().await {
        HmrEvent::Change {
            unit,
            eviction: Some(report),
        } => {
            assert_eq!(unit, id("a.rs"));
            assert_eq!(report.evicted, vec![id("a.rs"), id("b.rs"), id("c.rs")]);
            assert!(report.is_complete());
        }
        other => panic!("expected an evicting Change, got {other:?}"),
    }
    assert!(cache.is_empty());
}

#[tokio::test]
async fn change_of_unloaded_file_touches_nothing() {
    let cache = Arc::new(RecordingCache::new(cache_of(&[("b.rs", &["a.rs"])])));
    let mut h = Harness::start(cache.clone(), vec![]);

    h.send(FsEvent::change(path("a.rs"))).await;

    let event = h.next().await;
    assert_eq!(event.unit(), Some(&id("a.rs")));
    assert!(!event.was_evicted());
    assert!(cache.eviction_calls().is_empty());
    assert!(cache.inner.contains(&id("b.rs")));
}

#[tokio::test]
async fn add_is_passed_through() {
    let cache = cache_of(&[("a.rs", &[])]);
    let mut h = Harness::start(Arc::new(cache.clone()), vec![]);

    h.send(FsEvent::add(path("new.rs"))).await;

    assert_eq!(h.next().await, HmrEvent::Add { unit: id("new.rs") });
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn add_over_a_loaded_unit_is_reported_as_change() {
    let cache = cache_of(&[("a.rs", &[]), ("b.rs", &["a.rs"])]);
    let mut h = Harness::start(Arc::new(cache.clone()), vec![]);

    // A file renamed over a loaded unit arrives as an add.
    h.send(FsEvent::add(path("a.rs"))).await;

    match h.next().await {
        HmrEvent::Change {
            unit,
            eviction: Some(report),
        } => {
            assert_eq!(unit, id("a.rs"));
            assert_eq!(report.evicted, vec![id("a.rs"), id("b.rs")]);
        }
        other => panic!("expected an evicting Change, got {other:?}"),
    }
    assert!(cache.is_empty());
}

#[tokio::test]
async fn unlink_of_loaded_unit_is_reported_as_change() {
    let cache = cache_of(&[("a.rs", &[]), ("b.rs", &["a.rs"])]);
    let mut h = Harness::start(Arc::new(cache.clone()), vec![]);

    h.send(FsEvent::unlink(path("a.rs"))).await;

    let event = h.next().await;
    assert!(matches!(event, HmrEvent::Change { .. }));
    assert!(event.was_evicted());
    assert!(cache.is_empty());
}

#[tokio::test]
async fn unlink_of_unloaded_file_is_passed_through() {
    let mut h = Harness::start(Arc::new(MemoryModuleCache::new()), vec![]);

    h.send(FsEvent::unlink(path("gone.rs"))).await;

    assert_eq!(h.next().await, HmrEvent::Unlink { unit: id("gone.rs") });
}

#[tokio::test]
async fn notifications_follow_delivery_order() {
    let cache = cache_of(&[("a.rs", &[]), ("b.rs", &[])]);
    let mut h = Harness::start(Arc::new(cache), vec![]);

    h.send(FsEvent::change(path("a.rs"))).await;
    h.send(FsEvent::add(path("n.rs"))).await;
    h.send(FsEvent::change(path("b.rs"))).await;

    assert_eq!(h.next().await.unit(), Some(&id("a.rs")));
    assert_eq!(h.next().await.unit(), Some(&id("n.rs")));
    assert_eq!(h.next().await.unit(), Some(&id("b.rs")));
}

#[tokio::test]
async fn excluded_units_are_never_evicted_as_dependents() {
    let cache = cache_of(&[("a.rs", &[]), ("b.rs", &["a.rs"]), ("c.rs", &["b.rs"])]);
    let mut h = Harness::start(Arc::new(cache.clone()), vec![id("b.rs")]);

    h.send(FsEvent::change(path("a.rs"))).await;

    match h.next().await {
        HmrEvent::Change {
            eviction: Some(report),
            ..
        } => assert_eq!(report.evicted, vec![id("a.rs")]),
        other => panic!("expected an evicting Change, got {other:?}"),
    }
    assert_eq!(cache.units_snapshot(), vec![id("b.rs"), id("c.rs")]);
}

#[tokio::test]
async fn eviction_failure_is_reported_and_others_still_evicted() {
    let mut recording = RecordingCache::new(cache_of(&[
        ("a.rs", &[]),
        ("b.rs", &["a.rs"]),
        ("c.rs", &["b.rs"]),
    ]));
    recording.refuse = Some(id("b.rs"));
    let cache = Arc::new(recording);
    let mut h = Harness::start(cache.clone(), vec![]);

    h.send(FsEvent::change(path("a.rs"))).await;

    match h.next().await {
        HmrEvent::Change {
            eviction: Some(report),
            ..
        } => {
            assert_eq!(report.evicted, vec![id("a.rs"), id("c.rs")]);
            assert_eq!(report.failures.len(), 1);
            assert_eq!(report.failures[0].unit, id("b.rs"));
        }
        other => panic!("expected an evicting Change, got {other:?}"),
    }
    assert_eq!(cache.eviction_calls(), vec![id("a.rs"), id("b.rs"), id("c.rs")]);
}

#[cfg(unix)]
#[tokio::test]
async fn unmappable_path_is_reported_and_loop_continues() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let cache = cache_of(&[("a.rs", &[])]);
    let mut h = Harness::start(Arc::new(cache.clone()), vec![]);

    let bad = PathBuf::from(OsStr::from_bytes(b"/tmp/hmr-app/\xff.rs"));
    h.send(FsEvent::change(bad.clone())).await;
    h.send(FsEvent::change(path("a.rs"))).await;

    match h.next().await {
        HmrEvent::Failed { path, .. } => assert_eq!(path, bad),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert!(h.next().await.was_evicted());
}

#[tokio::test]
async fn add_and_unwatch_are_delegated_to_the_backend() {
    let mut h = Harness::start(Arc::new(MemoryModuleCache::new()), vec![]);

    h.coordinator.add(&["src".to_string(), "lib/**/*.rs".to_string()]).unwrap();
    h.coordinator.unwatch(&["lib/**/*.rs".to_string()]).unwrap();

    assert_eq!(
        h.calls(),
        vec![
            BackendCall::Add(vec!["src".to_string(), "lib/**/*.rs".to_string()]),
            BackendCall::Unwatch(vec!["lib/**/*.rs".to_string()]),
        ]
    );
    let watched: Vec<Vec<String>> = h.coordinator.watched().into_values().collect();
    assert_eq!(watched, vec![vec!["src".to_string()]]);
}

#[tokio::test]
async fn close_is_idempotent() {
    let mut h = Harness::start(Arc::new(MemoryModuleCache::new()), vec![]);
    assert_eq!(h.coordinator.state(), CoordinatorState::Watching);

    h.coordinator.close().await;
    h.coordinator.close().await;

    assert!(h.coordinator.is_closed());
    assert_eq!(h.calls(), vec![BackendCall::Close]);

    h.coordinator.add(&["src".to_string()]).unwrap();
    assert_eq!(h.calls(), vec![BackendCall::Close]);
}

#[tokio::test]
async fn nothing_is_delivered_after_close() {
    let cache = cache_of(&[("a.rs", &[])]);
    let mut h = Harness::start(Arc::new(cache.clone()), vec![]);

    h.coordinator.close().await;

    // The runtime has dropped its receiver, so the send is refused.
    assert!(h.events_tx.send(FsEvent::change(path("a.rs"))).await.is_err());
    assert_eq!(with_timeout(h.notifications.recv()).await, None);
    assert!(cache.contains(&id("a.rs")));
}
