// tests/notify_watcher.rs

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;

use hmr::cache::MemoryModuleCache;
use hmr::engine::{Coordinator, CoordinatorOptions, HmrEvent};
use hmr::unit::UnitId;
use hmr::watch::{NotifyWatcher, WatchOptions};
use hmr_test_utils::{init_tracing, with_timeout};

#[tokio::test]
async fn modifying_a_loaded_file_evicts_it_and_its_dependents() {
    init_tracing();

    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let a_path = root.join("a.rs");
    let b_path = root.join("b.rs");
    fs::write(&a_path, "pub fn a() {}").unwrap();
    fs::write(&b_path, "pub fn b() {}").unwrap();

    let a = UnitId::from_path(&a_path).unwrap();
    let b = UnitId::from_path(&b_path).unwrap();
    let cache = MemoryModuleCache::new();
    cache.insert(a.clone(), []);
    cache.insert(b.clone(), [a.clone()]);

    let options = WatchOptions::new(&root, vec!["**/*.rs".to_string()]);
    let (mut coordinator, mut events) = Coordinator::<NotifyWatcher>::watch(
        &options,
        Arc::new(cache.clone()),
        CoordinatorOptions::default(),
    )
    .unwrap();
    assert_eq!(coordinator.watched().len(), 1);

    tokio::time::sleep(Duration::from_millis(100)).await;
    fs::write(&a_path, "pub fn a() { /* edited */ }").unwrap();

    let event = with_timeout(async {
        loop {
            match events.recv().await {
                Some(event) if event.was_evicted() => break event,
                Some(_) => continue,
                None => panic!("coordinator stopped"),
            }
        }
    })
    .await;

    match event {
        HmrEvent::Change {
            unit,
            eviction: Some(report),
        } => {
            assert_eq!(unit, a);
            assert_eq!(report.evicted, vec![a, b]);
        }
        other => panic!("expected an evicting Change, got {other:?}"),
    }
    assert!(cache.is_empty());

    coordinator.close().await;
}

#[tokio::test]
async fn new_files_are_reported_as_add() {
    init_tracing();

    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::create_dir(root.join("src")).unwrap();

    let options = WatchOptions::new(&root, vec!["src".to_string()]);
    let (mut coordinator, mut events) = Coordinator::<NotifyWatcher>::watch(
        &options,
        Arc::new(MemoryModuleCache::new()),
        CoordinatorOptions::default(),
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    let c_path = root.join("src").join("c.rs");
    fs::write(&c_path, "pub fn c() {}").unwrap();
    let c = UnitId::from_path(&c_path).unwrap();

    let added = with_timeout(async {
        loop {
            match events.recv().await {
                Some(HmrEvent::Add { unit }) => break unit,
                Some(_) => continue,
                None => panic!("coordinator stopped"),
            }
        }
    })
    .await;
    assert_eq!(added, c);

    coordinator.close().await;
    assert!(coordinator.is_closed());
}

#[tokio::test]
async fn atomic_save_over_a_loaded_file_is_one_evicting_change() {
    init_tracing();

    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let a_path = root.join("a.rs");
    let b_path = root.join("b.rs");
    fs::write(&a_path, "pub fn a() {}").unwrap();
    fs::write(&b_path, "pub fn b() {}").unwrap();

    let a = UnitId::from_path(&a_path).unwrap();
    let b = UnitId::from_path(&b_path).unwrap();
    let cache = MemoryModuleCache::new();
    cache.insert(a.clone(), []);
    cache.insert(b.clone(), [a.clone()]);

    let options = WatchOptions::new(&root, vec!["**/*.rs".to_string()]);
    let (mut coordinator, mut events) = Coordinator::<NotifyWatcher>::watch(
        &options,
        Arc::new(cache.clone()),
        CoordinatorOptions::default(),
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    let tmp_path = root.join("a.rs.tmp123");
    fs::write(&tmp_path, "pub fn a() { /* saved */ }").unwrap();
    fs::rename(&tmp_path, &a_path).unwrap();

    let first = with_timeout(events.recv()).await.expect("coordinator stopped");
    match first {
        HmrEvent::Change {
            unit,
            eviction: Some(report),
        } => {
            assert_eq!(unit, a);
            assert_eq!(report.evicted, vec![a.clone(), b]);
        }
        other => panic!("expected an evicting Change, got {other:?}"),
    }

    // Let any duplicate rename notifications arrive.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let mut rest = Vec::new();
    while let Ok(event) = events.try_recv() {
        rest.push(event);
    }
    assert!(
        rest.iter().all(|e| e.unit() != Some(&a)),
        "duplicate notifications for a.rs: {rest:?}"
    );

    coordinator.close().await;
}

#[tokio::test]
async fn target_created_after_start_is_reported() {
    init_tracing();

    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();

    let options = WatchOptions::new(&root, vec!["later.rs".to_string()]);
    let (mut coordinator, mut events) = Coordinator::<NotifyWatcher>::watch(
        &options,
        Arc::new(MemoryModuleCache::new()),
        CoordinatorOptions::default(),
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    let later_path = root.join("later.rs");
    fs::write(root.join("other.rs"), "pub fn other() {}").unwrap();
    fs::write(&later_path, "pub fn later() {}").unwrap();
    let later = UnitId::from_path(&later_path).unwrap();

    let added = with_timeout(async {
        loop {
            match events.recv().await {
                Some(HmrEvent::Add { unit }) => break unit,
                Some(_) => continue,
                None => panic!("coordinator stopped"),
            }
        }
    })
    .await;
    assert_eq!(added, later);

    coordinator.close().await;
}
