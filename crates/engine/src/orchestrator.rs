// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The top-level state machine: event loop and shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use gut_core::config::{
    COMMIT_DEBOUNCE, EVENT_CHANNEL_CAPACITY, RECONNECT_MIN_DELAY, SHUTDOWN_GRACE,
};
use gut_core::{FileEvent, PendingChanges, FULL_SYNC_CHECK};
use gut_host::{kill_all_via_pidfiles, Host};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::event::SyncEvent;
use crate::node::NodeHandle;
use crate::watch::Watcher;

/// Session timing knobs. Defaults come from the shared constants; tests
/// shrink them.
#[derive(Debug, Clone)]
pub struct SyncOpts {
    /// Quiescent window after the last event before a flush.
    pub debounce: Duration,
    /// Minimum spacing between tunnel reconnect attempts.
    pub reconnect_min_delay: Duration,
    /// Per-node cleanup allowance during shutdown.
    pub shutdown_grace: Duration,
}

impl Default for SyncOpts {
    fn default() -> Self {
        Self {
            debounce: COMMIT_DEBOUNCE,
            reconnect_min_delay: RECONNECT_MIN_DELAY,
            shutdown_grace: SHUTDOWN_GRACE,
        }
    }
}

/// Drives one sync session across a set of nodes.
///
/// Node 0 is the local node: it runs the repository daemon and owns
/// `master`. All shared mutable state (the pending batch, per-node push
/// bookkeeping) lives inside the event-loop task; everything else
/// communicates through the event channel or the cancellation token.
pub struct Orchestrator<W> {
    pub(crate) nodes: Vec<Arc<NodeHandle>>,
    pub(crate) watcher: W,
    pub(crate) repo_name: String,
    pub(crate) opts: SyncOpts,
    pub(crate) cancel: CancellationToken,
    shutdown_entered: AtomicBool,
}

impl<W: Watcher> Orchestrator<W> {
    pub fn new(
        nodes: Vec<Arc<NodeHandle>>,
        watcher: W,
        repo_name: String,
        opts: SyncOpts,
    ) -> Result<Self, SyncError> {
        let Some(first) = nodes.first() else {
            return Err(SyncError::FatalConfig("no nodes to sync".to_string()));
        };
        if !first.is_local() {
            return Err(SyncError::FatalConfig("the first node must be local".to_string()));
        }
        if nodes.len() < 2 {
            return Err(SyncError::FatalConfig("need at least one peer to sync with".to_string()));
        }
        Ok(Self {
            nodes,
            watcher,
            repo_name,
            opts,
            cancel: CancellationToken::new(),
            shutdown_entered: AtomicBool::new(false),
        })
    }

    pub fn nodes(&self) -> &[Arc<NodeHandle>] {
        &self.nodes
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub(crate) fn local(&self) -> &Arc<NodeHandle> {
        &self.nodes[0]
    }

    /// Bootstrap the session and run the event loop until cancelled.
    pub async fn run(&self) -> Result<(), SyncError> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let port = self.bootstrap(&tx).await?;
        info!(port, repo = %self.repo_name, "sync session running");
        self.event_loop(rx, tx).await;
        Ok(())
    }

    async fn event_loop(&self, mut rx: mpsc::Receiver<SyncEvent>, tx: mpsc::Sender<SyncEvent>) {
        let mut pending = PendingChanges::new(self.nodes.len());
        let mut force_sync = false;
        let mut last_pushed: Vec<Option<String>> = vec![None; self.nodes.len()];

        loop {
            let next = if pending.is_empty() {
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    event = rx.recv() => event,
                }
            } else {
                // Dirty: wait out the debounce window, flushing if nothing
                // else arrives. Each event restarts the window.
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    event = rx.recv() => event,
                    _ = tokio::time::sleep(self.opts.debounce) => {
                        self.flush(&pending, &mut last_pushed, force_sync, &tx).await;
                        pending.clear();
                        force_sync = false;
                        continue;
                    }
                }
            };
            let Some(event) = next else {
                break;
            };
            match event {
                SyncEvent::File(event) => {
                    if event.rel_path == FULL_SYNC_CHECK {
                        force_sync = true;
                    }
                    if pending.observe(&event) {
                        debug!(node = %self.nodes[event.node.0].label(), path = %event.rel_path, "changed");
                    }
                }
                SyncEvent::Reconnected(id) => {
                    info!(node = %self.nodes[id.0].label(), "tunnel recovered, scheduling full sync check");
                    force_sync = true;
                    pending.observe(&FileEvent::full_sync_check(id));
                }
            }
        }
    }

    /// Stop the session: idempotent, tolerant of every cleanup failure.
    pub async fn shutdown(&self, reason: &str) {
        if self.shutdown_entered.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(reason, "stopping all subprocesses");
        self.cancel.cancel();

        let grace = self.opts.shutdown_grace;
        let cleanups = self.nodes.iter().cloned().map(|node| async move {
            let cleanup = async {
                node.host.kill_all_sessions().await;
                // Usually a no-op: the kills above already happened. This
                // sweeps anything that detached from its session.
                if let Err(e) = kill_all_via_pidfiles(node.host.as_ref()).await {
                    debug!(node = %node.label(), error = %e, "pidfile cleanup failed");
                }
                node.host.close().await;
            };
            if tokio::time::timeout(grace, cleanup).await.is_err() {
                warn!(node = %node.label(), "cleanup timed out");
            }
        });
        join_all(cleanups).await;
        info!("shutdown complete");
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
