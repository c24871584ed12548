// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

use crate::watch::FsEvent;

use super::core::InvalidationCore;
use super::{CoordinatorState, HmrEvent};

/// Drives the invalidation core in response to filesystem events and
/// forwards one notification per event to the caller.
///
/// This is a pure IO shell around `InvalidationCore`, which contains all the
/// invalidation semantics. Events are handled strictly one at a time, in
/// delivery order.
pub struct Runtime {
    core: InvalidationCore,
    event_rx: mpsc::Receiver<FsEvent>,
    notify_tx: mpsc::UnboundedSender<HmrEvent>,
    shutdown_rx: oneshot::Receiver<()>,
    state: Arc<watch::Sender<CoordinatorState>>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(
        core: InvalidationCore,
        event_rx: mpsc::Receiver<FsEvent>,
        notify_tx: mpsc::UnboundedSender<HmrEvent>,
        shutdown_rx: oneshot::Receiver<()>,
        state: Arc<watch::Sender<CoordinatorState>>,
    ) -> Self {
        Self {
            core,
            event_rx,
            notify_tx,
            shutdown_rx,
            state,
        }
    }

    /// Main event loop.
    ///
    /// - Stops as soon as shutdown is requested (or the handle is dropped);
    ///   an event already being handled runs to completion first.
    /// - Stops when the event source closes.
    /// - Otherwise feeds each event into the core and forwards the result.
    pub async fn run(mut self) {
        info!("invalidation runtime started");

        loop {
            let event = tokio::select! {
                biased;
                _ = &mut self.shutdown_rx => {
                    info!("shutdown requested; exiting");
                    break;
                }
                event = self.event_rx.recv() => match event {
                    Some(e) => e,
                    None => {
                        info!("filesystem event channel closed; exiting");
                        break;
                    }
                },
            };

            debug!(?event, "runtime received event");

            self.state.send_replace(CoordinatorState::Evaluating);
            let notification = self.core.step(event).await;
            self.state.send_replace(CoordinatorState::Watching);

            if self.notify_tx.send(notification).is_err() {
                debug!("notification receiver dropped; discarding");
            }
        }

        info!("runtime exiting");
    }
}
