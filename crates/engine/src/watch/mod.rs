// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-node filesystem watching.
//!
//! Local nodes use the platform backend behind the `notify` crate; remote
//! nodes stream a watcher subprocess (`inotifywait` or `fswatch`) over the
//! SSH session. Both normalize to canonical-syncdir-relative paths and
//! feed the shared event channel. Backends are restarted after a bounded
//! delay when they die; the initial full-sync-check seeded by bootstrap
//! covers whatever happened before a watcher attached.

mod local;
mod remote;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gut_core::config::{REPO_DIR_NAME, WATCHER_RESTART_DELAY};
use gut_host::HostError;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::event::SyncEvent;
use crate::node::NodeHandle;

/// Errors from attaching a filesystem watcher.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error(transparent)]
    Notify(#[from] notify::Error),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("no watcher backend on {host}: install inotify-tools or fswatch")]
    MissingBackend { host: String },
}

/// Attaches change watchers; the seam the orchestrator is tested through.
#[async_trait]
pub trait Watcher: Send + Sync {
    /// Attach a watcher for `node` and return once it is live. Emitted
    /// events carry paths relative to the node's canonical sync directory.
    async fn watch(
        &self,
        node: Arc<NodeHandle>,
        tx: mpsc::Sender<SyncEvent>,
        cancel: CancellationToken,
    ) -> Result<(), WatchError>;
}

/// The real watcher: notify backend locally, streamed subprocess remotely.
pub struct FsWatcher {
    restart_delay: Duration,
}

impl FsWatcher {
    pub fn new(restart_delay: Duration) -> Self {
        Self { restart_delay }
    }
}

impl Default for FsWatcher {
    fn default() -> Self {
        Self::new(WATCHER_RESTART_DELAY)
    }
}

#[async_trait]
impl Watcher for FsWatcher {
    async fn watch(
        &self,
        node: Arc<NodeHandle>,
        tx: mpsc::Sender<SyncEvent>,
        cancel: CancellationToken,
    ) -> Result<(), WatchError> {
        if node.host.is_local() {
            local::watch(node, tx, cancel, self.restart_delay).await
        } else {
            remote::watch(node, tx, cancel, self.restart_delay).await
        }
    }
}

/// True when any path component is the repository directory.
fn in_repo_dir(rel_path: &str) -> bool {
    rel_path.split('/').any(|part| part == REPO_DIR_NAME)
}

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeWatcher;
