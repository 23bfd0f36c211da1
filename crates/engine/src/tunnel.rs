// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reverse tunnel supervision.
//!
//! One long-running task per remote keeps `remote:localhost:P` forwarded
//! back to `local:localhost:P`. The first attempt surfaces its error
//! synchronously so bootstrap can abort; afterwards the supervisor
//! reconnects on its own, rate-limited, and announces each recovery on
//! the event channel so the node gets a full sync check.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use gut_host::{Host, HostError, TunnelHandle};

use crate::error::SyncError;
use crate::event::SyncEvent;
use crate::node::NodeHandle;

/// Open the initial tunnel for `node` and leave a supervisor task running
/// for the rest of the session.
pub(crate) async fn start(
    node: Arc<NodeHandle>,
    port: u16,
    tx: mpsc::Sender<SyncEvent>,
    cancel: CancellationToken,
    min_delay: Duration,
) -> Result<(), SyncError> {
    // Bind and target are the same address string on both ends.
    let addr = format!("localhost:{}", port);
    let handle = node.host.reverse_tunnel(&addr, &addr).await?;
    node.set_connected(true);
    info!(node = %node.label(), %addr, "reverse tunnel up");

    tokio::spawn(supervise(node, addr, handle, tx, cancel, min_delay));
    Ok(())
}

async fn supervise(
    node: Arc<NodeHandle>,
    addr: String,
    mut handle: TunnelHandle,
    tx: mpsc::Sender<SyncEvent>,
    cancel: CancellationToken,
    min_delay: Duration,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            err = handle.closed() => {
                log_tunnel_error(&node, &err);
                node.set_connected(false);
                drop(handle);

                handle = loop {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = sleep(min_delay) => {}
                    }
                    match reconnect(&node, &addr).await {
                        Ok(handle) => break handle,
                        Err(err) => log_tunnel_error(&node, &err),
                    }
                };
                node.set_connected(true);
                info!(node = %node.label(), %addr, "reverse tunnel restored");
                if tx.send(SyncEvent::Reconnected(node.id)).await.is_err() {
                    return;
                }
            }
        }
    }
}

async fn reconnect(node: &NodeHandle, addr: &str) -> Result<TunnelHandle, HostError> {
    // The SSH session is usually dead too; rebuild it before the tunnel.
    node.host.close().await;
    node.host.connect().await?;
    node.host.reverse_tunnel(addr, addr).await
}

/// Expected while a peer is down; anything else deserves a warning.
fn log_tunnel_error(node: &NodeHandle, err: &HostError) {
    if err.is_transient() {
        debug!(node = %node.label(), error = %err, "tunnel down");
    } else {
        warn!(node = %node.label(), error = %err, "tunnel down");
    }
}

#[cfg(test)]
#[path = "tunnel_tests.rs"]
mod tests;
