// src/lib.rs

//! Hot-reload invalidation: watch source files and, when one changes, evict
//! its unit and every unit that transitively links against it from the host
//! runtime's module cache.

pub mod cache;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod manifest;
pub mod resolve;
pub mod unit;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

pub use crate::cache::{CacheLocator, MemoryModuleCache, ModuleCache, ModuleCacheView, acquire_cache};
pub use crate::engine::{Coordinator, CoordinatorOptions, CoordinatorState, HmrEvent};
pub use crate::errors::HmrError;
pub use crate::resolve::{DependencyResolver, EvictionReport, InvalidationResult, resolve_dependents};
pub use crate::unit::{LinkRecord, UnitId};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, RawConfigFile, default_config_path, load_from_path};
use crate::manifest::{ManifestRuntime, resolve_unit_ref};
use crate::unit::has_scheme;
use crate::watch::{NotifyWatcher, WatchOptions};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (plus command-line overrides)
/// - the manifest runtime and its module cache
/// - the coordinator (file watcher + invalidation runtime)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let explicit_config = args.config.is_some();
    let config_path = args
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    let mut raw = if config_path.exists() || explicit_config {
        load_from_path(&config_path)
            .with_context(|| format!("loading config {}", config_path.display()))?
    } else if !args.paths.is_empty() {
        debug!(path = %config_path.display(), "no config file; using command-line paths only");
        RawConfigFile::default()
    } else {
        bail!(
            "no {} found and no paths given on the command line",
            config_path.display()
        );
    };
    // Config entries are relative to the config file; command-line entries
    // are relative to where the command was run.
    let cwd = std::env::current_dir().context("reading current directory")?;
    raw.watch
        .paths
        .extend(args.paths.iter().map(|p| absolutize_cli_entry(&cwd, p)));
    raw.watch
        .exclude
        .extend(args.exclude.iter().map(|e| absolutize_cli_entry(&cwd, e)));
    let cfg = ConfigFile::try_from(raw)?;

    let root = config_root_dir(&config_path);
    let manifest = ManifestRuntime::from_config(&cfg, &root)?;
    let exclude = cfg
        .watch
        .exclude
        .iter()
        .map(|e| resolve_unit_ref(&root, e))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let options = CoordinatorOptions {
        exclude,
        namespaces: cfg.namespaces.to_filter(),
    };

    if args.dry_run {
        print_dry_run(&cfg, &manifest, &options).await;
        return Ok(());
    }

    let cache = acquire_cache(&[&manifest])?;

    let watch_options = WatchOptions {
        root: root.clone(),
        paths: cfg.watch.paths.clone(),
        ignored: cfg.watch.ignored.clone(),
        ignore_hidden: cfg.watch.ignore_hidden,
    };
    let (mut coordinator, mut events) =
        Coordinator::<NotifyWatcher>::watch(&watch_options, cache, options)
            .context("starting file watcher")?;
    info!(root = %root.display(), watched = ?coordinator.watched(), "watching for changes");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                if let Err(e) = res {
                    eprintln!("failed to listen for Ctrl+C: {e}");
                }
                info!("Ctrl+C received; shutting down");
                break;
            }
            event = events.recv() => match event {
                Some(event) => report_event(&event, &manifest, args.reload),
                None => break,
            },
        }
    }

    coordinator.close().await;
    Ok(())
}

/// Figure out the project root that relative paths are resolved against.
///
/// - If the config path has a non-empty parent (e.g. "app/Hmr.toml"), we use
///   that directory.
/// - Otherwise the current working directory.
///
/// The result is canonicalised when possible so unit identifiers line up with
/// the paths the watcher reports.
fn config_root_dir(config_path: &Path) -> PathBuf {
    let dir = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    dir.canonicalize().unwrap_or(dir)
}

/// Anchor a relative command-line path or glob at `cwd`. Absolute paths and
/// scheme-qualified units are returned unchanged.
fn absolutize_cli_entry(cwd: &Path, entry: &str) -> String {
    if has_scheme(entry) || Path::new(entry).is_absolute() {
        return entry.to_string();
    }
    cwd.join(entry).to_string_lossy().into_owned()
}

/// One stdout line per notification.
fn report_event(event: &HmrEvent, manifest: &ManifestRuntime, reload: bool) {
    match event {
        HmrEvent::Add { unit } => println!("add     {unit}"),
        HmrEvent::Unlink { unit } => println!("unlink  {unit}"),
        HmrEvent::Change {
            unit,
            eviction: None,
        } => println!("change  {unit} (not loaded)"),
        HmrEvent::Change {
            unit,
            eviction: Some(report),
        } => {
            println!("change  {unit} -> evicted {} unit(s)", report.evicted.len());
            for evicted in &report.evicted {
                println!("          - {evicted}");
            }
            for failure in &report.failures {
                println!("          ! {failure}");
            }
            if reload {
                let loaded = manifest.reload(&report.evicted);
                println!("          reloaded {loaded} unit(s)");
            }
        }
        HmrEvent::Failed { path, error } => {
            println!("skipped {} ({})", path.display(), error.reason)
        }
    }
}

/// Print the effective config and, for each manifest unit, what a change to
/// it would evict.
async fn print_dry_run(cfg: &ConfigFile, manifest: &ManifestRuntime, options: &CoordinatorOptions) {
    println!("hmr dry-run");
    println!("  root = {}", manifest.root().display());
    println!("  watch.paths = {:?}", cfg.watch.paths);
    if !cfg.watch.ignored.is_empty() {
        println!("  watch.ignored = {:?}", cfg.watch.ignored);
    }
    println!("  watch.ignore_hidden = {}", cfg.watch.ignore_hidden);
    if !options.exclude.is_empty() {
        let exclude: Vec<&str> = options.exclude.iter().map(UnitId::as_str).collect();
        println!("  exclude = {exclude:?}");
    }
    println!();

    let resolver = DependencyResolver::new(options.exclude.iter().cloned(), options.namespaces.clone());
    println!("units ({}):", cfg.unit.len());
    for unit in manifest.units() {
        let plan = resolver.plan(unit, manifest.cache()).await;
        println!("  - {unit}");
        for dependent in plan.dependents() {
            println!("      evicts: {dependent}");
        }
    }

    debug!("dry-run complete (nothing watched)");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn command_line_entries_are_anchored_at_cwd() {
        let cwd = Path::new("/work");
        assert_eq!(absolutize_cli_entry(cwd, "src"), "/work/src");
        assert_eq!(absolutize_cli_entry(cwd, "lib/**/*.rs"), "/work/lib/**/*.rs");
        assert_eq!(absolutize_cli_entry(cwd, "/abs/a.rs"), "/abs/a.rs");
        assert_eq!(absolutize_cli_entry(cwd, "builtin:fs"), "builtin:fs");
    }
}
