// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process cluster fixture: one fake hub, N fake nodes, a driveable
//! watcher, and a running orchestrator.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gut_core::{NodeId, SyncNode};
use gut_engine::{FakeWatcher, NodeHandle, Orchestrator, SyncError, SyncOpts};
use gut_host::{FakeHost, Host};
use gut_vcs::{FakeHub, FakeVcs, Vcs};

const NAMES: &[&str] = &["alpha", "beta", "gamma", "delta"];

pub struct Cluster {
    pub hub: FakeHub,
    pub watcher: FakeWatcher,
    pub hosts: Vec<FakeHost>,
    pub vcs: Vec<Arc<FakeVcs>>,
    pub dirs: Vec<PathBuf>,
    pub orch: Arc<Orchestrator<FakeWatcher>>,
}

/// Node 0 is local; the rest are remote peers.
pub fn cluster(node_count: usize) -> Cluster {
    let hub = FakeHub::new();
    let watcher = FakeWatcher::new();
    let mut hosts = Vec::new();
    let mut vcs = Vec::new();
    let mut dirs = Vec::new();
    let mut nodes = Vec::new();

    for (i, name) in NAMES.iter().take(node_count).enumerate() {
        let local = i == 0;
        let host = FakeHost::new(name, local);
        let dir = host.home().join("sync");
        let sync_node = if local {
            SyncNode::local(dir.to_string_lossy())
        } else {
            SyncNode {
                username: None,
                hostname: Some((*name).to_string()),
                sync_path: dir.to_string_lossy().into_owned(),
            }
        };
        let node_vcs = Arc::new(FakeVcs::new(host.clone(), dir.clone(), hub.clone(), local));
        nodes.push(NodeHandle::new(
            NodeId(i),
            sync_node,
            Arc::new(host.clone()),
            node_vcs.clone(),
            dir.clone(),
        ));
        hosts.push(host);
        vcs.push(node_vcs);
        dirs.push(dir);
    }

    let opts = SyncOpts {
        debounce: Duration::from_millis(40),
        reconnect_min_delay: Duration::from_millis(10),
        shutdown_grace: Duration::from_millis(500),
    };
    let orch = match Orchestrator::new(nodes, watcher.clone(), "abcdwxyz".to_string(), opts) {
        Ok(orch) => Arc::new(orch),
        Err(e) => panic!("cluster orchestrator: {e}"),
    };
    Cluster { hub, watcher, hosts, vcs, dirs, orch }
}

impl Cluster {
    /// Run the session in the background and wait for bootstrap plus the
    /// seeded first flush to settle.
    pub async fn start(&self) -> tokio::task::JoinHandle<Result<(), SyncError>> {
        let orch = self.orch.clone();
        let handle = tokio::spawn(async move { orch.run().await });
        let watcher = self.watcher.clone();
        let nodes = self.orch.nodes().len();
        wait_until("watchers attached", move || watcher.watched_nodes().len() == nodes).await;
        let vcs = self.vcs.clone();
        wait_until("first flush settled", move || {
            vcs.iter().all(|v| v.commit_calls() >= 1)
        })
        .await;
        handle
    }

    pub async fn stop(&self, handle: tokio::task::JoinHandle<Result<(), SyncError>>) {
        self.orch.shutdown("spec finished").await;
        match handle.await {
            Ok(result) => {
                if let Err(e) = result {
                    panic!("session ended with error: {e}");
                }
            }
            Err(e) => panic!("session task panicked: {e}"),
        }
    }

    /// Write a file on node `i` and emit the watcher event for it.
    pub async fn touch(&self, i: usize, rel: &str, contents: &[u8]) {
        self.hosts[i].write_file(&self.dirs[i].join(rel), contents).await.unwrap();
        self.watcher.emit(NodeId(i), rel).await;
    }

    /// Regular files on node `i`, keyed by relative path.
    pub fn files(&self, i: usize) -> BTreeMap<String, Vec<u8>> {
        self.hosts[i].files_under(&self.dirs[i])
    }

    pub async fn tail(&self, i: usize) -> Option<String> {
        self.vcs[i].tail_hash().await.unwrap()
    }
}

pub async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    for _ in 0..600 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for: {what}");
}
