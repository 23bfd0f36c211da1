// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_fixtures::fixture;
use crate::SyncError;
use tokio::sync::mpsc;

#[tokio::test]
async fn fresh_nodes_share_one_tail_hash() {
    let f = fixture(3);
    let (tx, mut rx) = mpsc::channel(64);

    let port = f.orch.bootstrap(&tx).await.unwrap();
    assert!(port >= 34000);

    let session_tail = f.hub.tail_hash().unwrap();
    for vcs in &f.vcs {
        assert_eq!(vcs.tail_hash().await.unwrap().as_deref(), Some(session_tail.as_str()));
    }

    // Remotes received the initial commit's ignore file via their
    // bootstrap pull.
    for (host, dir) in f.hosts.iter().zip(&f.dirs).skip(1) {
        assert!(host.path_exists(&dir.join(".gutignore")).await.unwrap());
    }

    // Every node is watched and seeded with one full sync check.
    assert_eq!(f.watcher.watched_nodes().len(), 3);
    let mut sentinels = 0;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, SyncEvent::File(ref ev) if ev.rel_path == gut_core::FULL_SYNC_CHECK) {
            sentinels += 1;
        }
    }
    assert_eq!(sentinels, 3);
}

#[tokio::test]
async fn local_content_seeds_fresh_repository() {
    let f = fixture(2);
    f.hosts[0].write_file(&f.dirs[0].join("a"), b"1").await.unwrap();
    let (tx, _rx) = mpsc::channel(64);

    f.orch.bootstrap(&tx).await.unwrap();
    assert!(f.hub.tail_hash().is_some());
}

#[tokio::test]
async fn incompatible_tails_are_fatal() {
    let f = fixture(2);
    f.vcs[0].seed_repo("aaaa0000");
    f.hosts[1].write_file(&f.dirs[1].join("x"), b"1").await.unwrap();
    f.vcs[1].seed_repo("bbbb1111");
    let (tx, _rx) = mpsc::channel(64);

    let err = f.orch.bootstrap(&tx).await.unwrap_err();
    match err {
        SyncError::IncompatibleRepos { local, remote, .. } => {
            assert_eq!(local, "aaaa0000");
            assert_eq!(remote, "bbbb1111");
        }
        other => panic!("expected IncompatibleRepos, got {other}"),
    }
}

#[tokio::test]
async fn nonempty_remote_without_repo_is_fatal() {
    let f = fixture(2);
    f.vcs[0].seed_repo("aaaa0000");
    f.hosts[1].write_file(&f.dirs[1].join("stray"), b"1").await.unwrap();
    let (tx, _rx) = mpsc::channel(64);

    let err = f.orch.bootstrap(&tx).await.unwrap_err();
    assert!(matches!(err, SyncError::SyncFolderNotEmpty { .. }), "got {err}");
}

#[tokio::test]
async fn adopts_single_remote_repository() {
    let f = fixture(3);
    // Only beta has a repository (with content); alpha and gamma are empty.
    f.hosts[1].write_file(&f.dirs[1].join("kept.txt"), b"payload").await.unwrap();
    f.vcs[1].seed_repo("cccc2222");
    let (tx, _rx) = mpsc::channel(64);

    f.orch.bootstrap(&tx).await.unwrap();

    assert_eq!(f.hub.tail_hash().as_deref(), Some("cccc2222"));
    assert_eq!(f.vcs[0].tail_hash().await.unwrap().as_deref(), Some("cccc2222"));
    assert_eq!(f.vcs[2].tail_hash().await.unwrap().as_deref(), Some("cccc2222"));

    // The adopted content landed on the local node and the empty peer.
    let local = f.hosts[0].files_under(&f.dirs[0]);
    assert_eq!(local.get("kept.txt").map(Vec::as_slice), Some(&b"payload"[..]));
    let gamma = f.hosts[2].files_under(&f.dirs[2]);
    assert_eq!(gamma.get("kept.txt").map(Vec::as_slice), Some(&b"payload"[..]));
}

#[tokio::test]
async fn differing_remote_tails_without_local_are_fatal() {
    let f = fixture(3);
    f.hosts[1].write_file(&f.dirs[1].join("x"), b"1").await.unwrap();
    f.vcs[1].seed_repo("cccc2222");
    f.hosts[2].write_file(&f.dirs[2].join("y"), b"2").await.unwrap();
    f.vcs[2].seed_repo("dddd3333");
    let (tx, _rx) = mpsc::channel(64);

    let err = f.orch.bootstrap(&tx).await.unwrap_err();
    assert!(matches!(err, SyncError::IncompatibleRepos { .. }), "got {err}");
}

#[tokio::test]
async fn origin_is_wired_on_every_node() {
    let f = fixture(2);
    let (tx, _rx) = mpsc::channel(64);
    let port = f.orch.bootstrap(&tx).await.unwrap();

    let expected = format!("gut://localhost:{}/testrepoa/", port);
    for vcs in &f.vcs {
        assert_eq!(vcs.origin().as_deref(), Some(expected.as_str()));
    }
    assert_eq!(f.hub.daemon_port(), Some(port));
}
