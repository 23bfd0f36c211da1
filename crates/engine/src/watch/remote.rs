// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watcher for SSH-reachable nodes: a streamed watcher subprocess.
//!
//! The backend is probed per platform (`inotifywait` on Linux, `fswatch`
//! on Darwin), launched over the node's session with one changed path per
//! stdout line, and restarted when it exits. The child's remote pid goes
//! to a pidfile so a later run can clean up leftovers.

use std::sync::Arc;
use std::time::Duration;

use gut_core::FileEvent;
use gut_host::{save_daemon_pid, Host, HostExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{in_repo_dir, WatchError};
use crate::event::SyncEvent;
use crate::node::NodeHandle;

pub(super) async fn watch(
    node: Arc<NodeHandle>,
    tx: mpsc::Sender<SyncEvent>,
    cancel: CancellationToken,
    restart_delay: Duration,
) -> Result<(), WatchError> {
    // `pwd -P`: event paths from the backend are symlink-resolved.
    let canon = node
        .host
        .run_in(Some(&node.sync_dir), &["pwd".to_string(), "-P".to_string()])
        .await?
        .require_success(&["pwd".to_string(), "-P".to_string()])?
        .stdout
        .trim()
        .to_string();
    let argv = probe_backend(&node, &canon).await?;

    tokio::spawn(supervise(node, canon, argv, tx, cancel, restart_delay));
    Ok(())
}

/// Pick the watcher tool installed on the node.
async fn probe_backend(node: &NodeHandle, canon: &str) -> Result<Vec<String>, WatchError> {
    let candidates: &[(&str, fn(&str) -> Vec<String>)] = if node.host.is_darwin() {
        &[("fswatch", fswatch_argv), ("inotifywait", inotifywait_argv)]
    } else {
        &[("inotifywait", inotifywait_argv), ("fswatch", fswatch_argv)]
    };
    for (tool, argv) in candidates {
        let found = node
            .host
            .run(&["which".to_string(), tool.to_string()])
            .await
            .map(|r| r.success())
            .unwrap_or(false);
        if found {
            return Ok(argv(canon));
        }
    }
    Err(WatchError::MissingBackend { host: node.label() })
}

fn inotifywait_argv(dir: &str) -> Vec<String> {
    vec![
        "inotifywait".to_string(),
        "-m".to_string(),
        "-r".to_string(),
        "-q".to_string(),
        "-e".to_string(),
        "modify,attrib,close_write,move,create,delete".to_string(),
        "--format".to_string(),
        "%w%f".to_string(),
        dir.to_string(),
    ]
}

fn fswatch_argv(dir: &str) -> Vec<String> {
    vec!["fswatch".to_string(), "-r".to_string(), dir.to_string()]
}

async fn supervise(
    node: Arc<NodeHandle>,
    canon: String,
    argv: Vec<String>,
    tx: mpsc::Sender<SyncEvent>,
    cancel: CancellationToken,
    restart_delay: Duration,
) {
    let prefix = format!("{}/", canon.trim_end_matches('/'));
    loop {
        let (line_tx, mut line_rx) = mpsc::channel::<String>(256);
        match node.host.spawn_daemon("watcher", None, &argv, Some(line_tx)).await {
            Ok(handle) => {
                let pidfile = format!("watcher-{}", node.label());
                if let Err(e) = save_daemon_pid(node.host.as_ref(), &pidfile, handle.pid).await {
                    debug!(node = %node.label(), error = %e, "watcher pidfile write failed");
                }
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        line = line_rx.recv() => match line {
                            Some(line) => {
                                if let Some(rel) = line.trim().strip_prefix(&prefix) {
                                    if !rel.is_empty() && !in_repo_dir(rel) {
                                        let event = FileEvent::new(node.id, rel);
                                        if tx.send(SyncEvent::File(event)).await.is_err() {
                                            return;
                                        }
                                    }
                                }
                            }
                            // Stdout closed: the backend exited.
                            None => break,
                        }
                    }
                }
                warn!(node = %node.label(), "watcher backend exited");
            }
            Err(e) => warn!(node = %node.label(), error = %e, "watcher spawn failed"),
        }
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(restart_delay) => {}
        }
        info!(node = %node.label(), "restarting watcher backend");
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
