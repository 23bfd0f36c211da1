// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gut_core::{NodeId, SyncNode};
use gut_host::LocalHost;
use gut_vcs::{FakeHub, FakeVcs};
use gut_host::FakeHost;

fn local_node(dir: &Path) -> Arc<NodeHandle> {
    let node = SyncNode::local(dir.to_string_lossy());
    // The watcher only touches host.is_local() and the sync_dir; the fake
    // vcs is inert here.
    let fake = FakeHost::new("alpha", true);
    let vcs = Arc::new(FakeVcs::new(fake, dir.to_path_buf(), FakeHub::new(), true));
    NodeHandle::new(NodeId(0), node, Arc::new(LocalHost::new()), vcs, dir.to_path_buf())
}

async fn recv_paths(rx: &mut mpsc::Receiver<SyncEvent>, want: usize) -> Vec<String> {
    let mut paths = Vec::new();
    while paths.len() < want {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for watcher events")
            .expect("event channel closed");
        if let SyncEvent::File(ev) = event {
            if !paths.contains(&ev.rel_path) {
                paths.push(ev.rel_path);
            }
        }
    }
    paths
}

#[tokio::test]
async fn emits_relative_paths_for_changes() {
    let dir = tempfile::tempdir().unwrap();
    let node = local_node(dir.path());
    let (tx, mut rx) = mpsc::channel(64);
    let cancel = CancellationToken::new();

    watch(node, tx, cancel.clone(), Duration::from_millis(50)).await.unwrap();

    tokio::fs::create_dir_all(dir.path().join("sub")).await.unwrap();
    tokio::fs::write(dir.path().join("sub/file.txt"), b"x").await.unwrap();

    let paths = recv_paths(&mut rx, 1).await;
    assert!(
        paths.iter().any(|p| p.starts_with("sub")),
        "expected a sub/ path, got {:?}",
        paths
    );
    cancel.cancel();
}

#[tokio::test]
async fn repo_dir_changes_are_filtered() {
    let dir = tempfile::tempdir().unwrap();
    let node = local_node(dir.path());
    let (tx, mut rx) = mpsc::channel(64);
    let cancel = CancellationToken::new();

    watch(node, tx, cancel.clone(), Duration::from_millis(50)).await.unwrap();

    tokio::fs::create_dir_all(dir.path().join(".gut")).await.unwrap();
    tokio::fs::write(dir.path().join(".gut/index"), b"x").await.unwrap();
    tokio::fs::write(dir.path().join("real.txt"), b"x").await.unwrap();

    let paths = recv_paths(&mut rx, 1).await;
    assert!(paths.iter().all(|p| !p.contains(".gut")), "leaked {:?}", paths);
    assert!(paths.iter().any(|p| p.contains("real.txt")));
    cancel.cancel();
}

#[test]
fn in_repo_dir_matches_components_only() {
    assert!(in_repo_dir(".gut"));
    assert!(in_repo_dir("a/.gut/b"));
    assert!(!in_repo_dir(".gutignore"));
    assert!(!in_repo_dir("a/gut"));
}
