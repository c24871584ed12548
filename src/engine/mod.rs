// src/engine/mod.rs

//! Watch/invalidate coordination.
//!
//! This module ties together:
//! - the filesystem event stream (from [`crate::watch`])
//! - the dependency resolver and eviction plan (from [`crate::resolve`])
//! - the outbound notification channel seen by callers
//!
//! The per-event semantics live in [`core`] and [`event_handlers`]; the async
//! loop is implemented in [`runtime`]; [`coordinator`] is the public handle
//! that owns the watcher and the loop.

use std::path::PathBuf;

use crate::errors::IdentifierMappingError;
use crate::resolve::{EvictionReport, NamespaceFilter};
use crate::unit::UnitId;

/// Notifications delivered to the caller, in filesystem delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HmrEvent {
    /// A new file matched the watch set. Never triggers eviction.
    Add { unit: UnitId },
    /// A file that was never loaded has been deleted.
    Unlink { unit: UnitId },
    /// A file changed (or a loaded file was deleted).
    ///
    /// `eviction` is `None` if the unit was never loaded and nothing was
    /// touched; otherwise it reports what was evicted, including any partial
    /// failures.
    Change {
        unit: UnitId,
        eviction: Option<EvictionReport>,
    },
    /// A path could not be mapped to a unit; the event was dropped.
    Failed {
        path: PathBuf,
        error: IdentifierMappingError,
    },
}

impl HmrEvent {
    pub fn unit(&self) -> Option<&UnitId> {
        match self {
            HmrEvent::Add { unit } | HmrEvent::Unlink { unit } | HmrEvent::Change { unit, .. } => {
                Some(unit)
            }
            HmrEvent::Failed { .. } => None,
        }
    }

    /// True for a `Change` that evicted the unit and its dependents.
    pub fn was_evicted(&self) -> bool {
        matches!(self, HmrEvent::Change { eviction: Some(_), .. })
    }
}

/// Lifecycle of a [`Coordinator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Watching,
    Evaluating,
    Closed,
}

/// Invalidation policy handed to the coordinator at construction.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorOptions {
    /// Units never treated as dependents.
    pub exclude: Vec<UnitId>,
    /// Namespace categories never treated as dependents.
    pub namespaces: NamespaceFilter,
}

pub mod coordinator;
pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use coordinator::Coordinator;
pub use self::core::InvalidationCore;
pub use runtime::Runtime;
