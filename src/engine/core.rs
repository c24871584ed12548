// src/engine/core.rs

//! Per-event core of the coordinator.
//!
//! [`InvalidationCore`] turns one [`FsEvent`] into one [`HmrEvent`], evicting
//! from the cache along the way. It has no channels and no watcher; the
//! async shell in [`super::runtime`] feeds it events one at a time.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::cache::ModuleCache;
use crate::engine::event_handlers::{handle_add, handle_change_or_unlink};
use crate::engine::HmrEvent;
use crate::resolve::DependencyResolver;
use crate::unit::UnitId;
use crate::watch::{FsEvent, FsEventKind};

pub struct InvalidationCore {
    cache: Arc<dyn ModuleCache>,
    resolver: DependencyResolver,
}

impl fmt::Debug for InvalidationCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvalidationCore")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl InvalidationCore {
    pub fn new(cache: Arc<dyn ModuleCache>, resolver: DependencyResolver) -> Self {
        Self { cache, resolver }
    }

    pub fn resolver(&self) -> &DependencyResolver {
        &self.resolver
    }

    /// Handle a single filesystem event.
    ///
    /// Never fails: a path that cannot be mapped becomes
    /// [`HmrEvent::Failed`], eviction failures are carried in the report.
    pub async fn step(&self, event: FsEvent) -> HmrEvent {
        let unit = match UnitId::from_path(&event.path) {
            Ok(unit) => unit,
            Err(error) => {
                warn!(path = ?event.path, %error, "dropping event: cannot map path to a unit");
                return HmrEvent::Failed {
                    path: event.path,
                    error,
                };
            }
        };

        match event.kind {
            FsEventKind::Add => handle_add(self.cache.as_ref(), &self.resolver, unit).await,
            FsEventKind::Change | FsEventKind::Unlink => {
                handle_change_or_unlink(self.cache.as_ref(), &self.resolver, event.kind, unit).await
            }
        }
    }
}
