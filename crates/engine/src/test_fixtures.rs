// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests: N fake nodes around one fake hub.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gut_core::{NodeId, SyncNode};
use gut_host::FakeHost;
use gut_vcs::{FakeHub, FakeVcs};

use crate::node::NodeHandle;
use crate::orchestrator::{Orchestrator, SyncOpts};
use crate::watch::FakeWatcher;

const NAMES: &[&str] = &["alpha", "beta", "gamma", "delta"];

pub(crate) struct Fixture {
    pub hub: FakeHub,
    pub watcher: FakeWatcher,
    pub hosts: Vec<FakeHost>,
    pub vcs: Vec<Arc<FakeVcs>>,
    pub dirs: Vec<PathBuf>,
    pub orch: Arc<Orchestrator<FakeWatcher>>,
}

pub(crate) fn quick_opts() -> SyncOpts {
    SyncOpts {
        debounce: Duration::from_millis(40),
        reconnect_min_delay: Duration::from_millis(10),
        shutdown_grace: Duration::from_millis(500),
    }
}

/// Node 0 is local; the rest are remote peers sharing the hub.
pub(crate) fn fixture(node_count: usize) -> Fixture {
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

    let orch = Orchestrator::new(nodes, watcher.clone(), "testrepoa".to_string(), quick_opts())
        .unwrap_or_else(|e| panic!("fixture orchestrator: {e}"));
    Fixture { hub, watcher, hosts, vcs, dirs, orch: Arc::new(orch) }
}
