// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`Host`] for tests: a fake filesystem, recorded commands,
//! and tunnels that fail on demand.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::error::HostError;
use crate::host::{DaemonHandle, ExecResult, FileStat, Host, TunnelHandle};

#[derive(Debug, Clone)]
enum Entry {
    File(Vec<u8>),
    Dir,
    Link(PathBuf),
}

struct FakeState {
    files: BTreeMap<PathBuf, Entry>,
    connected: bool,
    fail_tunnels: bool,
    netstat: String,
    outputs: BTreeMap<String, String>,
    commands: Vec<Vec<String>>,
    breakers: Vec<mpsc::Sender<HostError>>,
    next_pid: u32,
    // Held so daemon exit channels stay open for the session's lifetime.
    daemon_exits: Vec<oneshot::Sender<i32>>,
}

/// Scriptable in-process host with an in-memory filesystem.
#[derive(Clone)]
pub struct FakeHost {
    label: String,
    local: bool,
    home: PathBuf,
    inner: Arc<Mutex<FakeState>>,
}

impl FakeHost {
    pub fn new(label: &str, local: bool) -> Self {
        let home = PathBuf::from(format!("/home/{}", label));
        let mut files = BTreeMap::new();
        files.insert(home.clone(), Entry::Dir);
        Self {
            label: label.to_string(),
            local,
            home,
            inner: Arc::new(Mutex::new(FakeState {
                files,
                connected: true,
                fail_tunnels: false,
                netstat: String::new(),
                outputs: BTreeMap::new(),
                commands: Vec::new(),
                breakers: Vec::new(),
                next_pid: 4000,
                daemon_exits: Vec::new(),
            })),
        }
    }

    pub fn home(&self) -> PathBuf {
        self.home.clone()
    }

    /// What the fake `netstat` prints on this host.
    pub fn set_netstat(&self, listing: impl Into<String>) {
        self.inner.lock().netstat = listing.into();
    }

    /// Script stdout for a program name.
    pub fn set_command_output(&self, program: &str, stdout: impl Into<String>) {
        self.inner.lock().outputs.insert(program.to_string(), stdout.into());
    }

    pub fn set_connected(&self, connected: bool) {
        self.inner.lock().connected = connected;
    }

    /// Make every subsequent reverse_tunnel attempt fail.
    pub fn set_fail_tunnels(&self, fail: bool) {
        self.inner.lock().fail_tunnels = fail;
    }

    /// Kill every live tunnel, as a dropped connection would.
    pub fn break_tunnels(&self) {
        let breakers = std::mem::take(&mut self.inner.lock().breakers);
        for tx in breakers {
            let _ = tx.try_send(HostError::Tunnel { reason: "connection reset".to_string() });
        }
    }

    /// All argv vectors run against this host, in order.
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.inner.lock().commands.clone()
    }

    /// Contents of every regular file under `dir`, keyed by relative path.
    pub fn files_under(&self, dir: &Path) -> BTreeMap<String, Vec<u8>> {
        let state = self.inner.lock();
        let mut out = BTreeMap::new();
        for (path, entry) in &state.files {
            if let (Entry::File(bytes), Ok(rel)) = (entry, path.strip_prefix(dir)) {
                out.insert(rel.to_string_lossy().into_owned(), bytes.clone());
            }
        }
        out
    }

    fn ensure_parents(state: &mut FakeState, path: &Path) {
        let mut current = path.to_path_buf();
        while let Some(parent) = current.parent() {
            state.files.entry(parent.to_path_buf()).or_insert(Entry::Dir);
            current = parent.to_path_buf();
        }
    }
}

#[async_trait]
impl Host for FakeHost {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn is_local(&self) -> bool {
        self.local
    }

    fn is_windows(&self) -> bool {
        false
    }

    fn is_darwin(&self) -> bool {
        false
    }

    fn is_linux(&self) -> bool {
        true
    }

    fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }

    async fn connect(&self) -> Result<(), HostError> {
        self.inner.lock().connected = true;
        Ok(())
    }

    async fn close(&self) {
        self.inner.lock().connected = false;
    }

    async fn kill_all_sessions(&self) {}

    async fn run_in(&self, _cwd: Option<&Path>, argv: &[String]) -> Result<ExecResult, HostError> {
        let mut state = self.inner.lock();
        state.commands.push(argv.to_vec());
        let stdout = match argv.first().map(String::as_str) {
            Some("netstat") => state.netstat.clone(),
            Some(program) => state.outputs.get(program).cloned().unwrap_or_default(),
            None => String::new(),
        };
        Ok(ExecResult { stdout, stderr: String::new(), exit_code: 0 })
    }

    async fn spawn_daemon(
        &self,
        _tag: &str,
        _cwd: Option<&Path>,
        argv: &[String],
        _stdout_tx: Option<mpsc::Sender<String>>,
    ) -> Result<DaemonHandle, HostError> {
        let mut state = self.inner.lock();
        state.commands.push(argv.to_vec());
        state.next_pid += 1;
        let pid = state.next_pid;
        let (exit_tx, exit_rx) = oneshot::channel();
        state.daemon_exits.push(exit_tx);
        Ok(DaemonHandle { pid, exit: exit_rx })
    }

    async fn reverse_tunnel(
        &self,
        _src_addr: &str,
        _dest_addr: &str,
    ) -> Result<TunnelHandle, HostError> {
        let mut state = self.inner.lock();
        if !state.connected || state.fail_tunnels {
            return Err(HostError::Tunnel { reason: "connection refused".to_string() });
        }
        let (err_tx, err_rx) = mpsc::channel(1);
        state.breakers.push(err_tx);
        Ok(TunnelHandle::new(err_rx, CancellationToken::new()))
    }

    async fn home_dir(&self) -> Result<PathBuf, HostError> {
        Ok(self.home.clone())
    }

    async fn path_exists(&self, path: &Path) -> Result<bool, HostError> {
        Ok(self.inner.lock().files.contains_key(path))
    }

    async fn stat(&self, path: &Path) -> Result<Option<FileStat>, HostError> {
        Ok(self.inner.lock().files.get(path).map(|entry| FileStat {
            is_dir: matches!(entry, Entry::Dir),
        }))
    }

    async fn mkdirp(&self, path: &Path) -> Result<(), HostError> {
        let mut state = self.inner.lock();
        Self::ensure_parents(&mut state, path);
        state.files.insert(path.to_path_buf(), Entry::Dir);
        Ok(())
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), HostError> {
        let mut state = self.inner.lock();
        Self::ensure_parents(&mut state, path);
        state.files.insert(path.to_path_buf(), Entry::File(contents.to_vec()));
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, HostError> {
        match self.inner.lock().files.get(path) {
            Some(Entry::File(bytes)) => Ok(bytes.clone()),
            _ => Err(HostError::NotFound(path.to_path_buf())),
        }
    }

    async fn delete_file(&self, path: &Path) -> Result<(), HostError> {
        self.inner.lock().files.remove(path);
        Ok(())
    }

    async fn list_dir(&self, path: &Path) -> Result<Vec<String>, HostError> {
        let state = self.inner.lock();
        if !matches!(state.files.get(path), Some(Entry::Dir)) {
            return Err(HostError::NotFound(path.to_path_buf()));
        }
        let mut names: Vec<String> = state
            .files
            .keys()
            .filter_map(|p| {
                let rel = p.strip_prefix(path).ok()?;
                let mut parts = rel.components();
                let first = parts.next()?;
                if parts.next().is_none() {
                    Some(first.as_os_str().to_string_lossy().into_owned())
                } else {
                    None
                }
            })
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn symlink(&self, target: &Path, link: &Path) -> Result<(), HostError> {
        let mut state = self.inner.lock();
        Self::ensure_parents(&mut state, link);
        state.files.insert(link.to_path_buf(), Entry::Link(target.to_path_buf()));
        Ok(())
    }

    async fn delete_link(&self, link: &Path) -> Result<(), HostError> {
        self.inner.lock().files.remove(link);
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
