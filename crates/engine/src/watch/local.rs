// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watcher for the invoking machine, on the `notify` recommended backend.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use gut_core::FileEvent;
use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{in_repo_dir, WatchError};
use crate::event::SyncEvent;
use crate::node::NodeHandle;

pub(super) async fn watch(
    node: Arc<NodeHandle>,
    tx: mpsc::Sender<SyncEvent>,
    cancel: CancellationToken,
    restart_delay: Duration,
) -> Result<(), WatchError> {
    // Resolve symlinks up front (`pwd -P`): backends report resolved
    // paths, and relative paths must be computed against the same base.
    let canon = tokio::fs::canonicalize(&node.sync_dir)
        .await
        .map_err(|e| WatchError::Host(e.into()))?;

    // Attach synchronously so bootstrap fails loudly on a broken backend.
    let first = attach(&node, &canon, &tx)?;
    tokio::spawn(supervise(node, canon, tx, cancel, restart_delay, first));
    Ok(())
}

async fn supervise(
    node: Arc<NodeHandle>,
    canon: PathBuf,
    tx: mpsc::Sender<SyncEvent>,
    cancel: CancellationToken,
    restart_delay: Duration,
    mut attached: Attached,
) {
    loop {
        let (watcher, mut err_rx) = attached;
        tokio::select! {
            _ = cancel.cancelled() => return,
            err = &mut err_rx => {
                match err {
                    Ok(e) => warn!(node = %node.label(), error = %e, "watcher backend died"),
                    Err(_) => warn!(node = %node.label(), "watcher backend died"),
                }
            }
        }
        drop(watcher);
        attached = loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(restart_delay) => {}
            }
            match attach(&node, &canon, &tx) {
                Ok(next) => break next,
                Err(e) => warn!(node = %node.label(), error = %e, "watcher restart failed"),
            }
        };
        info!(node = %node.label(), "watcher backend restarted");
    }
}

type Attached = (RecommendedWatcher, oneshot::Receiver<notify::Error>);

fn attach(
    node: &NodeHandle,
    canon: &Path,
    tx: &mpsc::Sender<SyncEvent>,
) -> Result<Attached, WatchError> {
    let id = node.id;
    let base = canon.to_path_buf();
    let tx = tx.clone();
    let (err_tx, err_rx) = oneshot::channel();
    let err_tx = Mutex::new(Some(err_tx));

    let mut watcher = notify::recommended_watcher(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                for path in &event.paths {
                    let Some(rel) = relative_to(&base, path) else {
                        continue;
                    };
                    if rel.is_empty() || in_repo_dir(&rel) {
                        continue;
                    }
                    // The callback runs on the backend's own thread.
                    let _ = tx.blocking_send(SyncEvent::File(FileEvent::new(id, rel)));
                }
            }
            Err(e) => {
                if let Some(err_tx) = err_tx.lock().take() {
                    let _ = err_tx.send(e);
                }
            }
        },
    )?;
    watcher.watch(canon, RecursiveMode::Recursive)?;
    Ok((watcher, err_rx))
}

fn relative_to(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let s = rel.to_string_lossy().replace('\\', "/");
    Some(s)
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
