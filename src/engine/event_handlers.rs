// src/engine/event_handlers.rs

//! Event handling logic for the invalidation core.

use tracing::{debug, info};

use crate::cache::ModuleCache;
use crate::engine::HmrEvent;
use crate::resolve::DependencyResolver;
use crate::unit::UnitId;
use crate::watch::FsEventKind;

/// A path appeared.
///
/// If the unit is already loaded the file was replaced in place (editors
/// save by renaming a temp file over the original), so it is handled as a
/// change. Otherwise it is passed through; nothing can be stale yet.
pub async fn handle_add<C>(cache: &C, resolver: &DependencyResolver, unit: UnitId) -> HmrEvent
where
    C: ModuleCache + ?Sized,
{
    if cache.contains(&unit) {
        debug!(%unit, "loaded unit replaced on disk; treating as change");
        return handle_change_or_unlink(cache, resolver, FsEventKind::Change, unit).await;
    }
    debug!(%unit, "unit added");
    HmrEvent::Add { unit }
}

/// A file changed or disappeared.
///
/// - Not loaded: nothing to evict; the original event kind is reported with
///   no eviction.
/// - Loaded: resolve its dependents, evict the unit and then its dependents
///   in discovery order, and report a `Change` with the outcome.
pub async fn handle_change_or_unlink<C>(
    cache: &C,
    resolver: &DependencyResolver,
    kind: FsEventKind,
    unit: UnitId,
) -> HmrEvent
where
    C: ModuleCache + ?Sized,
{
    let plan = resolver.plan(&unit, cache).await;

    if plan.is_empty() {
        debug!(%unit, ?kind, "unit not cached; nothing to evict");
        return match kind {
            FsEventKind::Unlink => HmrEvent::Unlink { unit },
            _ => HmrEvent::Change {
                unit,
                eviction: None,
            },
        };
    }

    let report = plan.evict(cache);
    info!(
        %unit,
        dependents = plan.dependents().len(),
        evicted = report.evicted.len(),
        failed = report.failures.len(),
        "invalidated unit"
    );

    HmrEvent::Change {
        unit,
        eviction: Some(report),
    }
}
