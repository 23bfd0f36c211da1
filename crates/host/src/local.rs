// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The invoking machine as a [`Host`].

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::HostError;
use crate::host::{DaemonHandle, ExecResult, FileStat, Host, TunnelHandle};

/// Local filesystem + subprocess implementation of [`Host`].
#[derive(Default)]
pub struct LocalHost {
    /// Pids of daemons spawned this session, for kill_all_sessions.
    children: Mutex<Vec<u32>>,
}

impl LocalHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn command(cwd: Option<&Path>, argv: &[String]) -> Result<tokio::process::Command, HostError> {
        let (program, args) = argv.split_first().ok_or(HostError::Spawn {
            argv: String::new(),
            reason: "empty argv".to_string(),
        })?;
        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args);
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }
        Ok(cmd)
    }
}

#[async_trait]
impl Host for LocalHost {
    fn label(&self) -> String {
        "local".to_string()
    }

    fn is_local(&self) -> bool {
        true
    }

    fn is_windows(&self) -> bool {
        cfg!(windows)
    }

    fn is_darwin(&self) -> bool {
        cfg!(target_os = "macos")
    }

    fn is_linux(&self) -> bool {
        cfg!(target_os = "linux")
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn connect(&self) -> Result<(), HostError> {
        Ok(())
    }

    async fn close(&self) {}

    async fn kill_all_sessions(&self) {
        let pids = std::mem::take(&mut *self.children.lock());
        for pid in pids {
            if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                debug!(pid, error = %e, "child already gone");
            }
        }
    }

    async fn run_in(&self, cwd: Option<&Path>, argv: &[String]) -> Result<ExecResult, HostError> {
        let output = Self::command(cwd, argv)?
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| HostError::Spawn { argv: argv.join(" "), reason: e.to_string() })?;
        Ok(ExecResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    async fn spawn_daemon(
        &self,
        tag: &str,
        cwd: Option<&Path>,
        argv: &[String],
        stdout_tx: Option<mpsc::Sender<String>>,
    ) -> Result<DaemonHandle, HostError> {
        let mut cmd = Self::command(cwd, argv)?;
        cmd.stdin(Stdio::null()).stderr(Stdio::null()).kill_on_drop(false);
        cmd.stdout(if stdout_tx.is_some() { Stdio::piped() } else { Stdio::null() });

        let mut child = cmd
            .spawn()
            .map_err(|e| HostError::Spawn { argv: argv.join(" "), reason: e.to_string() })?;
        let pid = child.id().ok_or(HostError::Spawn {
            argv: argv.join(" "),
            reason: "child exited before reporting a pid".to_string(),
        })?;
        self.children.lock().push(pid);

        let stdout = child.stdout.take();
        let (exit_tx, exit_rx) = oneshot::channel();
        let tag = tag.to_string();
        tokio::spawn(async move {
            if let (Some(stdout), Some(tx)) = (stdout, stdout_tx) {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
            }
            let code = match child.wait().await {
                Ok(status) => status.code().unwrap_or(-1),
                Err(e) => {
                    warn!(tag, error = %e, "failed to reap daemon child");
                    -1
                }
            };
            let _ = exit_tx.send(code);
        });

        Ok(DaemonHandle { pid, exit: exit_rx })
    }

    async fn reverse_tunnel(
        &self,
        _src_addr: &str,
        _dest_addr: &str,
    ) -> Result<TunnelHandle, HostError> {
        Err(HostError::Unsupported("reverse tunnel to the local node"))
    }

    async fn home_dir(&self) -> Result<PathBuf, HostError> {
        dirs::home_dir().ok_or(HostError::NoHome)
    }

    async fn state_root(&self) -> Result<PathBuf, HostError> {
        match std::env::var_os("GUT_SYNC_HOME") {
            Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
            _ => self.home_dir().await,
        }
    }

    async fn path_exists(&self, path: &Path) -> Result<bool, HostError> {
        Ok(tokio::fs::try_exists(path).await?)
    }

    async fn stat(&self, path: &Path) -> Result<Option<FileStat>, HostError> {
        match tokio::fs::metadata(path).await {
            Ok(meta) => Ok(Some(FileStat { is_dir: meta.is_dir() })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn mkdirp(&self, path: &Path) -> Result<(), HostError> {
        Ok(tokio::fs::create_dir_all(path).await?)
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), HostError> {
        Ok(tokio::fs::write(path, contents).await?)
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, HostError> {
        Ok(tokio::fs::read(path).await?)
    }

    async fn delete_file(&self, path: &Path) -> Result<(), HostError> {
        Ok(tokio::fs::remove_file(path).await?)
    }

    async fn list_dir(&self, path: &Path) -> Result<Vec<String>, HostError> {
        let mut entries = tokio::fs::read_dir(path).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    async fn symlink(&self, target: &Path, link: &Path) -> Result<(), HostError> {
        #[cfg(unix)]
        {
            Ok(tokio::fs::symlink(target, link).await?)
        }
        #[cfg(not(unix))]
        {
            let _ = (target, link);
            Err(HostError::Unsupported("symlink"))
        }
    }

    async fn delete_link(&self, link: &Path) -> Result<(), HostError> {
        match tokio::fs::remove_file(link).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
