// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gut_core::{NodeId, SyncNode};
use gut_host::Host;
use gut_vcs::Vcs;

/// One node wired into a running session: identity plus its capabilities.
///
/// The handle owns the capability objects; nothing here points back at the
/// orchestrator. Connectivity is flipped by the node's tunnel supervisor
/// and read by the flush pipeline.
pub struct NodeHandle {
    pub id: NodeId,
    pub node: SyncNode,
    pub host: Arc<dyn Host>,
    pub vcs: Arc<dyn Vcs>,
    /// Absolute path of the synced directory on the node's host.
    pub sync_dir: PathBuf,
    /// Branch this node pushes to; derived from its identity.
    pub branch: String,
    connected: AtomicBool,
}

impl NodeHandle {
    pub fn new(
        id: NodeId,
        node: SyncNode,
        host: Arc<dyn Host>,
        vcs: Arc<dyn Vcs>,
        sync_dir: PathBuf,
    ) -> Arc<Self> {
        let branch = node.branch_name();
        Arc::new(Self { id, node, host, vcs, sync_dir, branch, connected: AtomicBool::new(true) })
    }

    pub fn is_local(&self) -> bool {
        self.node.is_local()
    }

    pub fn label(&self) -> String {
        self.host.label()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}
