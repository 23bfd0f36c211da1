// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Steady-state convergence scenarios.

use serial_test::serial;

use super::helpers::{cluster, wait_until};

// Concurrent non-conflicting edits inside one debounce window land on
// both nodes after the next flush.
#[tokio::test]
#[serial]
async fn concurrent_edits_converge() {
    let c = cluster(2);
    let handle = c.start().await;

    c.touch(0, "x", b"written-on-local").await;
    c.touch(1, "y", b"written-on-remote").await;

    wait_until("both nodes hold both files", || {
        let local = c.files(0);
        let remote = c.files(1);
        local.contains_key("x")
            && local.contains_key("y")
            && remote.contains_key("x")
            && remote.contains_key("y")
    })
    .await;
    assert_eq!(c.files(0), c.files(1));

    c.stop(handle).await;
}

// Conflicting edits to one file: the merge takes the incoming side on
// the local node, and the remote converges to local on its next pull.
#[tokio::test]
#[serial]
async fn conflicting_edits_resolve_to_merged_side() {
    let c = cluster(2);
    let handle = c.start().await;

    c.touch(0, "shared", b"local-version").await;
    c.touch(1, "shared", b"remote-version").await;

    wait_until("conflict resolved identically on both nodes", || {
        let local = c.files(0);
        let remote = c.files(1);
        local.get("shared") == Some(&b"remote-version".to_vec())
            && remote.get("shared") == Some(&b"remote-version".to_vec())
    })
    .await;

    c.stop(handle).await;
}

// A third peer receives changes made on another remote, funneled
// through the local master.
#[tokio::test]
#[serial]
async fn three_nodes_fan_out_through_local() {
    let c = cluster(3);
    let handle = c.start().await;

    c.touch(1, "from-beta", b"payload").await;

    wait_until("all three nodes hold the file", || {
        (0..3).all(|i| c.files(i).contains_key("from-beta"))
    })
    .await;
    assert_eq!(c.files(0), c.files(2));

    c.stop(handle).await;
}
