// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::host::HostExt;

#[tokio::test]
async fn run_captures_stdout_and_exit_code() {
    let host = LocalHost::new();
    let result = host
        .run(&["sh".to_string(), "-c".to_string(), "echo hi; exit 3".to_string()])
        .await
        .unwrap();
    assert_eq!(result.stdout.trim(), "hi");
    assert_eq!(result.exit_code, 3);
    assert!(!result.success());
}

#[tokio::test]
async fn output_fails_on_nonzero_exit() {
    let host = LocalHost::new();
    let err = host.output(&["sh".to_string(), "-c".to_string(), "exit 1".to_string()]).await;
    assert!(matches!(err, Err(HostError::CommandFailed { exit_code: 1, .. })));
}

#[tokio::test]
async fn run_in_respects_cwd() {
    let dir = tempfile::tempdir().unwrap();
    let host = LocalHost::new();
    let out = host
        .run_in(Some(dir.path()), &["pwd".to_string()])
        .await
        .unwrap();
    let reported = PathBuf::from(out.stdout.trim());
    assert_eq!(
        reported.canonicalize().unwrap(),
        dir.path().canonicalize().unwrap()
    );
}

#[tokio::test]
async fn file_ops_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let host = LocalHost::new();
    let path = dir.path().join("sub/file.txt");

    host.mkdirp(path.parent().unwrap()).await.unwrap();
    host.write_file(&path, b"hello").await.unwrap();
    assert!(host.path_exists(&path).await.unwrap());
    assert_eq!(host.read_file(&path).await.unwrap(), b"hello");
    assert_eq!(
        host.stat(&path).await.unwrap(),
        Some(FileStat { is_dir: false })
    );
    assert_eq!(host.list_dir(dir.path()).await.unwrap(), vec!["sub".to_string()]);

    host.delete_file(&path).await.unwrap();
    assert!(host.stat(&path).await.unwrap().is_none());
}

#[tokio::test]
async fn spawn_daemon_streams_stdout_and_reports_exit() {
    let host = LocalHost::new();
    let (tx, mut rx) = mpsc::channel(8);
    let handle = host
        .spawn_daemon(
            "test",
            None,
            &["sh".to_string(), "-c".to_string(), "echo one; echo two".to_string()],
            Some(tx),
        )
        .await
        .unwrap();
    assert!(handle.pid > 0);
    assert_eq!(rx.recv().await.unwrap(), "one");
    assert_eq!(rx.recv().await.unwrap(), "two");
    assert_eq!(handle.exit.await.unwrap(), 0);
}

#[tokio::test]
async fn abs_path_resolves_tilde() {
    let host = LocalHost::new();
    let home = host.home_dir().await.unwrap();
    assert_eq!(host.abs_path("~/work").await.unwrap(), home.join("work"));
    assert_eq!(host.abs_path("/srv/work").await.unwrap(), PathBuf::from("/srv/work"));
}
