// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process repository simulation for integration tests.
//!
//! [`FakeHub`] stands in for the repository daemon on the local node:
//! a tail hash, a `master` head, and one head per node branch. Each
//! [`FakeVcs`] keeps its node's committed tree and reads/writes working
//! files through its [`FakeHost`]'s in-memory filesystem, so tests can
//! assert on what "appears on disk" after a sync round.
//!
//! Merge semantics mirror the engine's strategy: the incoming side wins
//! conflicts, and a merge or pull refuses with `NeedsCommit` while the
//! working tree differs from the last committed tree.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use gut_core::config::{DEFAULT_GUTIGNORE, IGNORE_FILE_NAME, REPO_DIR_NAME};
use gut_host::{FakeHost, Host, HostError};
use parking_lot::Mutex;

use crate::error::VcsError;
use crate::vcs::Vcs;

type Tree = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct FakeCommit {
    id: String,
    tree: Tree,
}

fn commit_id(tree: &Tree) -> String {
    let mut buf = Vec::new();
    for (path, bytes) in tree {
        buf.extend_from_slice(path.as_bytes());
        buf.push(0);
        buf.extend_from_slice(bytes);
        buf.push(0);
    }
    format!("{:x}", md5::compute(&buf))
}

#[derive(Default)]
struct HubState {
    tail: Option<String>,
    master: Option<FakeCommit>,
    branches: BTreeMap<String, FakeCommit>,
    daemon_port: Option<u16>,
}

/// The central repository every node's origin points at.
#[derive(Clone, Default)]
pub struct FakeHub {
    inner: Arc<Mutex<HubState>>,
}

impl FakeHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tail_hash(&self) -> Option<String> {
        self.inner.lock().tail.clone()
    }

    pub fn daemon_port(&self) -> Option<u16> {
        self.inner.lock().daemon_port
    }

    pub fn master_head(&self) -> Option<String> {
        self.inner.lock().master.as_ref().map(|c| c.id.clone())
    }
}

#[derive(Default)]
struct RepoState {
    initialized: bool,
    tail: Option<String>,
    head: Option<FakeCommit>,
    origin: Option<String>,
}

/// One node's repository, simulated.
pub struct FakeVcs {
    host: FakeHost,
    sync_dir: PathBuf,
    hub: FakeHub,
    /// The local node's master is what the hub serves.
    is_local: bool,
    state: Mutex<RepoState>,
    commit_calls: AtomicUsize,
    pull_calls: AtomicUsize,
}

impl FakeVcs {
    pub fn new(host: FakeHost, sync_dir: PathBuf, hub: FakeHub, is_local: bool) -> Self {
        Self {
            host,
            sync_dir,
            hub,
            is_local,
            state: Mutex::new(RepoState::default()),
            commit_calls: AtomicUsize::new(0),
            pull_calls: AtomicUsize::new(0),
        }
    }

    /// How many times `commit` ran (one per flush phase 1 entry).
    pub fn commit_calls(&self) -> usize {
        self.commit_calls.load(Ordering::SeqCst)
    }

    pub fn pull_calls(&self) -> usize {
        self.pull_calls.load(Ordering::SeqCst)
    }

    /// Pre-seed an existing repository with the given tail hash and one
    /// committed tree matching the current working files.
    pub fn seed_repo(&self, tail: &str) {
        let tree = self.scan();
        let mut state = self.state.lock();
        state.initialized = true;
        state.tail = Some(tail.to_string());
        state.head = Some(FakeCommit { id: commit_id(&tree), tree });
    }

    pub fn head(&self) -> Option<String> {
        self.state.lock().head.as_ref().map(|c| c.id.clone())
    }

    pub fn origin(&self) -> Option<String> {
        self.state.lock().origin.clone()
    }

    /// Current working files, repository directory excluded.
    fn scan(&self) -> Tree {
        self.host
            .files_under(&self.sync_dir)
            .into_iter()
            .filter(|(path, _)| {
                !path.split('/').any(|part| part == REPO_DIR_NAME)
            })
            .collect()
    }

    async fn apply_tree(&self, tree: &Tree) -> Result<(), VcsError> {
        for (path, bytes) in tree {
            self.host.write_file(&self.sync_dir.join(path), bytes).await?;
        }
        Ok(())
    }

    fn require_connected(&self) -> Result<(), VcsError> {
        if self.host.is_connected() {
            Ok(())
        } else {
            Err(VcsError::Host(HostError::Disconnected))
        }
    }

    fn publish_master(&self, commit: &FakeCommit) {
        let mut hub = self.hub.inner.lock();
        hub.master = Some(commit.clone());
    }
}

#[async_trait]
impl Vcs for FakeVcs {
    async fn ensure_built(&self) -> Result<(), VcsError> {
        Ok(())
    }

    async fn init(&self) -> Result<(), VcsError> {
        self.host.mkdirp(&self.sync_dir.join(REPO_DIR_NAME)).await?;
        self.state.lock().initialized = true;
        Ok(())
    }

    async fn ensure_initial_commit(&self) -> Result<(), VcsError> {
        if self.state.lock().head.is_some() {
            return Ok(());
        }
        let ignore_path = self.sync_dir.join(IGNORE_FILE_NAME);
        if !self.host.path_exists(&ignore_path).await? {
            self.host.write_file(&ignore_path, DEFAULT_GUTIGNORE.as_bytes()).await?;
        }
        let tree = self.scan();
        let commit = FakeCommit { id: commit_id(&tree), tree };
        let mut state = self.state.lock();
        state.tail = Some(commit.id.clone());
        state.head = Some(commit.clone());
        drop(state);
        if self.is_local {
            let mut hub = self.hub.inner.lock();
            hub.tail = Some(commit.id.clone());
            hub.master = Some(commit);
        }
        Ok(())
    }

    async fn tail_hash(&self) -> Result<Option<String>, VcsError> {
        let state = self.state.lock();
        Ok(if state.initialized { state.tail.clone() } else { None })
    }

    async fn rev_parse_head(&self) -> Result<String, VcsError> {
        self.state.lock().head.as_ref().map(|c| c.id.clone()).ok_or(VcsError::Failed {
            op: "rev-parse",
            exit_code: 128,
            stderr: "unknown revision HEAD".to_string(),
        })
    }

    async fn commit(&self, _prefix: &str, _update_untracked: bool) -> Result<bool, VcsError> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);
        let tree = self.scan();
        let mut state = self.state.lock();
        if state.head.as_ref().is_some_and(|head| head.tree == tree) {
            return Ok(false);
        }
        let commit = FakeCommit { id: commit_id(&tree), tree };
        if state.tail.is_none() {
            state.tail = Some(commit.id.clone());
        }
        state.head = Some(commit.clone());
        drop(state);
        if self.is_local {
            self.publish_master(&commit);
        }
        Ok(true)
    }

    async fn push(&self, branch: &str) -> Result<(), VcsError> {
        self.require_connected()?;
        let state = self.state.lock();
        let head = state.head.clone().ok_or(VcsError::Failed {
            op: "push",
            exit_code: 1,
            stderr: "no commits yet".to_string(),
        })?;
        let tail = state.tail.clone();
        drop(state);
        let mut hub = self.hub.inner.lock();
        if hub.tail.is_none() {
            hub.tail = tail;
        }
        hub.branches.insert(branch.to_string(), head);
        Ok(())
    }

    async fn merge(&self, branch: &str) -> Result<(), VcsError> {
        let incoming = self.hub.inner.lock().branches.get(branch).cloned();
        let Some(incoming) = incoming else {
            return Ok(());
        };
        let working = self.scan();
        let head = self.state.lock().head.clone();
        let Some(head) = head else {
            return Err(VcsError::Failed {
                op: "merge",
                exit_code: 128,
                stderr: "unknown revision HEAD".to_string(),
            });
        };
        if working != head.tree {
            return Err(VcsError::NeedsCommit);
        }
        let mut merged = head.tree.clone();
        for (path, bytes) in &incoming.tree {
            merged.insert(path.clone(), bytes.clone());
        }
        let commit = if merged == incoming.tree {
            incoming
        } else if merged == head.tree {
            head
        } else {
            FakeCommit { id: commit_id(&merged), tree: merged.clone() }
        };
        self.apply_tree(&commit.tree).await?;
        self.state.lock().head = Some(commit.clone());
        if self.is_local {
            self.publish_master(&commit);
        }
        Ok(())
    }

    async fn pull(&self) -> Result<(), VcsError> {
        self.pull_calls.fetch_add(1, Ordering::SeqCst);
        self.require_connected()?;
        let master = self.hub.inner.lock().master.clone();
        let Some(master) = master else {
            return Ok(());
        };
        let working = self.scan();
        let head = self.state.lock().head.clone();
        if let Some(head) = &head {
            if *head == master {
                return Ok(());
            }
            if working != head.tree {
                return Err(VcsError::NeedsCommit);
            }
        }
        let mut merged = head.as_ref().map(|h| h.tree.clone()).unwrap_or_default();
        for (path, bytes) in &master.tree {
            merged.insert(path.clone(), bytes.clone());
        }
        let commit = if merged == master.tree {
            master
        } else {
            FakeCommit { id: commit_id(&merged), tree: merged.clone() }
        };
        self.apply_tree(&commit.tree).await?;
        let mut state = self.state.lock();
        if state.tail.is_none() {
            state.tail = self.hub.inner.lock().tail.clone();
        }
        state.head = Some(commit);
        Ok(())
    }

    async fn checkout_as_master(&self, branch: &str) -> Result<(), VcsError> {
        let commit = self.hub.inner.lock().branches.get(branch).cloned().ok_or(
            VcsError::Failed {
                op: "checkout",
                exit_code: 1,
                stderr: format!("no such branch {}", branch),
            },
        )?;
        self.apply_tree(&commit.tree).await?;
        {
            let mut state = self.state.lock();
            state.tail = self.hub.tail_hash();
            state.head = Some(commit.clone());
        }
        if self.is_local {
            self.publish_master(&commit);
        }
        Ok(())
    }

    async fn start_daemon(&self, _repo_name: &str, port: u16) -> Result<(), VcsError> {
        let tail = self.state.lock().tail.clone();
        let head = self.state.lock().head.clone();
        let mut hub = self.hub.inner.lock();
        hub.daemon_port = Some(port);
        if hub.tail.is_none() {
            hub.tail = tail;
        }
        if self.is_local && hub.master.is_none() {
            hub.master = head;
        }
        Ok(())
    }

    async fn setup_origin(&self, repo_name: &str, port: u16) -> Result<(), VcsError> {
        self.state.lock().origin =
            Some(format!("gut://localhost:{}/{}/", port, repo_name));
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
