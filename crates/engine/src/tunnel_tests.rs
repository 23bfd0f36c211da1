// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gut_core::{NodeId, SyncNode};
use gut_host::FakeHost;
use gut_vcs::{FakeHub, FakeVcs};

fn remote_node(host: &FakeHost) -> Arc<NodeHandle> {
    let node = SyncNode::parse("beta:/home/beta/sync").unwrap();
    let dir = host.home().join("sync");
    let vcs = Arc::new(FakeVcs::new(host.clone(), dir.clone(), FakeHub::new(), false));
    NodeHandle::new(NodeId(1), node, Arc::new(host.clone()), vcs, dir)
}

#[tokio::test]
async fn first_failure_surfaces_synchronously() {
    let host = FakeHost::new("beta", false);
    host.set_fail_tunnels(true);
    let node = remote_node(&host);
    let (tx, _rx) = mpsc::channel(8);

    let err = start(node, 34001, tx, CancellationToken::new(), Duration::from_millis(5)).await;
    assert!(err.is_err());
}

#[tokio::test]
async fn recovery_emits_one_reconnect_signal() {
    let host = FakeHost::new("beta", false);
    let node = remote_node(&host);
    let (tx, mut rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();

    start(node.clone(), 34001, tx, cancel.clone(), Duration::from_millis(5)).await.unwrap();
    assert!(node.is_connected());

    // Drop the tunnel while reconnects are refused: the node goes dark.
    host.set_fail_tunnels(true);
    host.break_tunnels();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!node.is_connected());

    // Allow reconnection: exactly one signal for this outage.
    host.set_fail_tunnels(false);
    let event = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
    assert_eq!(event, Some(SyncEvent::Reconnected(NodeId(1))));
    assert!(node.is_connected());
    assert!(rx.try_recv().is_err());

    cancel.cancel();
}

#[tokio::test]
async fn cancellation_stops_reconnect_attempts() {
    let host = FakeHost::new("beta", false);
    let node = remote_node(&host);
    let (tx, mut rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();

    start(node.clone(), 34001, tx, cancel.clone(), Duration::from_millis(5)).await.unwrap();
    host.set_fail_tunnels(true);
    host.break_tunnels();
    cancel.cancel();
    tokio::time::sleep(Duration::from_millis(30)).await;

    // Supervisor is gone: the channel closes without a reconnect signal.
    assert_eq!(rx.recv().await, None);
}
