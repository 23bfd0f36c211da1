// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outage and recovery scenarios.

use serial_test::serial;

use super::helpers::{cluster, wait_until};

// A change made on a remote while its tunnel is down reaches every node
// once the tunnel recovers: the supervisor's reconnect signal forces a
// full sync check on the returning node.
#[tokio::test]
#[serial]
async fn tunnel_loss_catches_up_on_reconnect() {
    let c = cluster(3);
    let handle = c.start().await;

    // Kill beta's tunnel and refuse reconnects.
    c.hosts[1].set_fail_tunnels(true);
    c.hosts[1].break_tunnels();
    wait_until("beta marked disconnected", || !c.orch.nodes()[1].is_connected()).await;

    // Change a file on beta during the outage. The flush commits it
    // locally but cannot push.
    c.touch(1, "offline-edit", b"made-in-the-dark").await;
    tokio::time::sleep(std::time::Duration::from_millis(150)).await;
    assert!(!c.files(0).contains_key("offline-edit"));

    // Recovery: the synthesized full sync check pushes the stranded
    // commit through, and everyone converges.
    c.hosts[1].set_fail_tunnels(false);
    wait_until("beta reconnected", || c.orch.nodes()[1].is_connected()).await;
    wait_until("offline edit reached every node", || {
        (0..3).all(|i| c.files(i).contains_key("offline-edit"))
    })
    .await;
    assert_eq!(
        c.files(0).get("offline-edit").map(Vec::as_slice),
        Some(&b"made-in-the-dark"[..])
    );

    c.stop(handle).await;
}

// While a remote is down, the other nodes keep syncing; the returning
// node picks up what it missed.
#[tokio::test]
#[serial]
async fn outage_does_not_block_other_nodes() {
    let c = cluster(3);
    let handle = c.start().await;

    c.hosts[1].set_fail_tunnels(true);
    c.hosts[1].break_tunnels();
    wait_until("beta marked disconnected", || !c.orch.nodes()[1].is_connected()).await;

    c.touch(0, "meanwhile", b"kept-flowing").await;
    wait_until("gamma stayed in sync", || c.files(2).contains_key("meanwhile")).await;
    assert!(!c.files(1).contains_key("meanwhile"));

    c.hosts[1].set_fail_tunnels(false);
    wait_until("beta caught up after reconnect", || c.files(1).contains_key("meanwhile")).await;

    c.stop(handle).await;
}
