// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cold-start scenarios.

use serial_test::serial;

use super::helpers::{cluster, wait_until};
use gut_host::Host;

// Two empty directories: local initializes with the default ignore file,
// the remote is bootstrapped from it, and both end up with only the
// repository directory and the ignore file.
#[tokio::test]
#[serial]
async fn cold_start_two_empty_dirs() {
    let c = cluster(2);
    let handle = c.start().await;

    let tail = c.tail(0).await;
    assert!(tail.is_some());
    assert_eq!(c.tail(1).await, tail);

    for i in 0..2 {
        let entries = c.hosts[i].list_dir(&c.dirs[i]).await.unwrap();
        assert_eq!(entries, vec![".gut".to_string(), ".gutignore".to_string()], "node {i}");
        let files = c.files(i);
        let ignore = files.get(".gutignore").unwrap();
        assert!(String::from_utf8_lossy(ignore).contains("*.lock"));
    }

    c.stop(handle).await;
}

// One-sided content: everything already in the local directory reaches
// the empty remote, along with the ignore file.
#[tokio::test]
#[serial]
async fn one_sided_content_reaches_remote() {
    let c = cluster(2);
    c.hosts[0].write_file(&c.dirs[0].join("a"), b"alpha-data").await.unwrap();
    c.hosts[0].write_file(&c.dirs[0].join("b/c"), b"nested").await.unwrap();

    let handle = c.start().await;

    wait_until("remote caught up", || {
        let remote = c.files(1);
        remote.contains_key("a") && remote.contains_key("b/c") && remote.contains_key(".gutignore")
    })
    .await;

    assert_eq!(c.files(1).get("a").map(Vec::as_slice), Some(&b"alpha-data"[..]));
    assert_eq!(c.tail(0).await, c.tail(1).await);
    assert!(c.tail(0).await.is_some());

    c.stop(handle).await;
}

// Incompatible repositories abort the session; the error names both
// tail hashes so the operator can see what disagreed.
#[tokio::test]
#[serial]
async fn incompatible_repos_are_fatal() {
    let c = cluster(2);
    c.hosts[0].write_file(&c.dirs[0].join("x"), b"1").await.unwrap();
    c.vcs[0].seed_repo("aaaa000011112222");
    c.hosts[1].write_file(&c.dirs[1].join("y"), b"2").await.unwrap();
    c.vcs[1].seed_repo("bbbb333344445555");

    let err = c.orch.run().await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("aaaa000011112222"), "missing local tail: {message}");
    assert!(message.contains("bbbb333344445555"), "missing remote tail: {message}");
}
