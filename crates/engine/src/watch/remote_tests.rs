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
async fn streams_backend_and_records_pidfile() {
    let host = FakeHost::new("beta", false);
    host.set_command_output("pwd", "/home/beta/sync\n");
    let node = remote_node(&host);
    let (tx, _rx) = mpsc::channel(64);
    let cancel = CancellationToken::new();

    watch(node, tx, cancel.clone(), Duration::from_millis(5)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();

    let commands = host.commands();
    let backend = commands
        .iter()
        .find(|argv| argv.first().map(String::as_str) == Some("inotifywait"))
        .expect("no watcher backend spawned");
    assert!(backend.contains(&"-m".to_string()));
    assert!(backend.contains(&"/home/beta/sync".to_string()));

    let pidfiles = host.home().join(".guts/pidfiles");
    let names = host.list_dir(&pidfiles).await.unwrap();
    assert!(names.contains(&"watcher-beta.pid".to_string()));
}

#[test]
fn backend_argv_shapes() {
    let inotify = inotifywait_argv("/srv/d");
    assert_eq!(inotify[0], "inotifywait");
    assert!(inotify.contains(&"--format".to_string()));
    let fswatch = fswatch_argv("/srv/d");
    assert_eq!(fswatch, vec!["fswatch", "-r", "/srv/d"]);
}
