// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn fake_fs_round_trip() {
    let host = FakeHost::new("alpha", true);
    let file = host.home().join("sync/a/b.txt");
    host.write_file(&file, b"data").await.unwrap();

    assert!(host.path_exists(&file).await.unwrap());
    assert_eq!(host.read_file(&file).await.unwrap(), b"data");
    // Parents are implied directories.
    assert_eq!(
        host.stat(&host.home().join("sync")).await.unwrap(),
        Some(FileStat { is_dir: true })
    );
    assert_eq!(host.list_dir(&host.home().join("sync")).await.unwrap(), vec!["a".to_string()]);

    let under = host.files_under(&host.home().join("sync"));
    assert_eq!(under.get("a/b.txt").map(Vec::as_slice), Some(&b"data"[..]));
}

#[tokio::test]
async fn netstat_is_scriptable() {
    let host = FakeHost::new("alpha", true);
    host.set_netstat("tcp 0 0 127.0.0.1:34001 LISTEN");
    let out = host.run_in(None, &["netstat".to_string(), "-anl".to_string()]).await.unwrap();
    assert!(out.stdout.contains("34001"));
    assert_eq!(host.commands().len(), 1);
}

#[tokio::test]
async fn tunnels_fail_when_disconnected_and_break_on_demand() {
    let host = FakeHost::new("beta", false);
    let mut tunnel = host.reverse_tunnel("localhost:34001", "localhost:34001").await.unwrap();

    host.set_connected(false);
    host.break_tunnels();
    let err = tunnel.closed().await;
    assert!(err.is_transient(), "expected a transient tunnel error, got {err}");

    let refused = host.reverse_tunnel("localhost:34001", "localhost:34001").await;
    assert!(refused.is_err());
}
