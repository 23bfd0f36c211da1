// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The machine capability contract.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::error::HostError;

/// Collected output of a finished command.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Promote a nonzero exit to a [`HostError::CommandFailed`].
    pub fn require_success(self, argv: &[String]) -> Result<ExecResult, HostError> {
        if self.success() {
            Ok(self)
        } else {
            Err(HostError::CommandFailed {
                argv: argv.join(" "),
                exit_code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Basic metadata for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub is_dir: bool,
}

/// A long-running child launched detached from the caller.
///
/// `exit` fires once with the process exit code (or -1 when unknown).
#[derive(Debug)]
pub struct DaemonHandle {
    pub pid: u32,
    pub exit: oneshot::Receiver<i32>,
}

/// A live reverse tunnel.
///
/// Dropping the handle tears the tunnel down. `closed` resolves when the
/// tunnel dies for any reason.
#[derive(Debug)]
pub struct TunnelHandle {
    pub(crate) errors: mpsc::Receiver<HostError>,
    pub(crate) cancel: CancellationToken,
}

impl TunnelHandle {
    pub(crate) fn new(errors: mpsc::Receiver<HostError>, cancel: CancellationToken) -> Self {
        Self { errors, cancel }
    }

    /// Wait for the tunnel to fail or be torn down.
    pub async fn closed(&mut self) -> HostError {
        self.errors.recv().await.unwrap_or(HostError::Disconnected)
    }
}

impl Drop for TunnelHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Capability interface over a single machine, local or remote.
///
/// Implementations hide the transport entirely: the engine calls the same
/// methods whether the target is the invoking machine or an SSH peer.
#[async_trait]
pub trait Host: Send + Sync {
    /// Short name for log lines (hostname, or `local`).
    fn label(&self) -> String;

    fn is_local(&self) -> bool;
    fn is_windows(&self) -> bool;
    fn is_darwin(&self) -> bool;
    fn is_linux(&self) -> bool;

    fn is_connected(&self) -> bool;
    async fn connect(&self) -> Result<(), HostError>;
    async fn close(&self);

    /// Terminate every process this host has started in this session.
    async fn kill_all_sessions(&self);

    /// Run `argv` to completion, optionally in `cwd`, and collect output.
    async fn run_in(&self, cwd: Option<&Path>, argv: &[String]) -> Result<ExecResult, HostError>;

    /// Launch `argv` as a long-running child. Stdout lines are forwarded to
    /// `stdout_tx` when given; the handle reports the pid and eventual exit.
    async fn spawn_daemon(
        &self,
        tag: &str,
        cwd: Option<&Path>,
        argv: &[String],
        stdout_tx: Option<mpsc::Sender<String>>,
    ) -> Result<DaemonHandle, HostError>;

    /// Open a reverse tunnel: connections to `src_addr` on this host are
    /// forwarded to `dest_addr` on the invoking machine.
    async fn reverse_tunnel(
        &self,
        src_addr: &str,
        dest_addr: &str,
    ) -> Result<TunnelHandle, HostError>;

    async fn home_dir(&self) -> Result<PathBuf, HostError>;

    /// Root for gut-sync state (`.guts/...`) on this host. Defaults to the
    /// home directory.
    async fn state_root(&self) -> Result<PathBuf, HostError> {
        self.home_dir().await
    }

    async fn path_exists(&self, path: &Path) -> Result<bool, HostError>;
    async fn stat(&self, path: &Path) -> Result<Option<FileStat>, HostError>;
    async fn mkdirp(&self, path: &Path) -> Result<(), HostError>;
    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), HostError>;
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, HostError>;
    async fn delete_file(&self, path: &Path) -> Result<(), HostError>;
    /// Entry names (dotfiles included) of a directory.
    async fn list_dir(&self, path: &Path) -> Result<Vec<String>, HostError>;
    async fn symlink(&self, target: &Path, link: &Path) -> Result<(), HostError>;
    async fn delete_link(&self, link: &Path) -> Result<(), HostError>;
}

/// Conveniences layered over the raw capability surface.
#[async_trait]
pub trait HostExt: Host {
    async fn run(&self, argv: &[String]) -> Result<ExecResult, HostError> {
        self.run_in(None, argv).await
    }

    /// Run and return trimmed stdout, failing on nonzero exit.
    async fn output(&self, argv: &[String]) -> Result<String, HostError> {
        let result = self.run(argv).await?.require_success(argv)?;
        Ok(result.stdout.trim().to_string())
    }

    /// Run and mirror the command's output into the log under `tag`.
    async fn quote(
        &self,
        tag: &str,
        cwd: Option<&Path>,
        argv: &[String],
    ) -> Result<ExecResult, HostError> {
        let result = self.run_in(cwd, argv).await?;
        for line in result.stdout.lines().chain(result.stderr.lines()) {
            tracing::debug!(host = %self.label(), tag, "{}", line);
        }
        Ok(result)
    }

    /// Resolve a possibly `~`-relative or bare-relative path against the
    /// host's home directory.
    async fn abs_path(&self, path: &str) -> Result<PathBuf, HostError> {
        if path.starts_with('/') {
            return Ok(PathBuf::from(path));
        }
        let home = self.home_dir().await?;
        let rest = path.strip_prefix("~/").or_else(|| path.strip_prefix("~")).unwrap_or(path);
        if rest.is_empty() {
            Ok(home)
        } else {
            Ok(home.join(rest))
        }
    }

    /// Resolve a gut-sync state path (e.g. `.guts/pidfiles`) against the
    /// host's state root.
    async fn state_path(&self, rel: &str) -> Result<PathBuf, HostError> {
        Ok(self.state_root().await?.join(rel))
    }
}

#[async_trait]
impl<H: Host + ?Sized> HostExt for H {}
