// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem change events and the batch accumulated between flushes.

use std::collections::BTreeSet;

use crate::config::{IGNORE_FILE_NAME, REPO_DIR_NAME};

/// Sentinel path forcing a full untracked-file rescan on a node.
pub const FULL_SYNC_CHECK: &str = "full-sync-check";

/// Index of a node in the session's node list. Node 0 is always local.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node{}", self.0)
    }
}

/// One observed change: a path relative to a node's synced directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub node: NodeId,
    pub rel_path: String,
}

impl FileEvent {
    pub fn new(node: NodeId, rel_path: impl Into<String>) -> Self {
        Self { node, rel_path: rel_path.into() }
    }

    pub fn full_sync_check(node: NodeId) -> Self {
        Self { node, rel_path: FULL_SYNC_CHECK.to_string() }
    }
}

/// Changes accumulated by the event loop between flushes.
///
/// Confined to the event-loop task; no locking.
#[derive(Debug, Default)]
pub struct PendingChanges {
    paths: Vec<BTreeSet<String>>,
    rescan: Vec<bool>,
}

impl PendingChanges {
    pub fn new(node_count: usize) -> Self {
        Self { paths: vec![BTreeSet::new(); node_count], rescan: vec![false; node_count] }
    }

    /// Record one event. Returns false when the event was dropped because
    /// its path enters the repository directory.
    ///
    /// An event touching the ignore file, or the full-sync sentinel, sets
    /// the node's untracked-rescan flag.
    pub fn observe(&mut self, event: &FileEvent) -> bool {
        let mut rescan = event.rel_path == FULL_SYNC_CHECK;
        for part in event.rel_path.split('/') {
            if part == REPO_DIR_NAME {
                return false;
            }
            if part == IGNORE_FILE_NAME {
                rescan = true;
            }
        }
        if rescan {
            self.rescan[event.node.0] = true;
        }
        self.paths[event.node.0].insert(event.rel_path.clone());
        true
    }

    pub fn is_empty(&self) -> bool {
        self.paths.iter().all(BTreeSet::is_empty)
    }

    /// Nodes that have at least one recorded path.
    pub fn dirty_nodes(&self) -> Vec<NodeId> {
        self.paths
            .iter()
            .enumerate()
            .filter(|(_, set)| !set.is_empty())
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    /// Recorded paths for a node, sentinel excluded.
    pub fn paths_for(&self, node: NodeId) -> Vec<String> {
        self.paths[node.0].iter().filter(|p| *p != FULL_SYNC_CHECK).cloned().collect()
    }

    pub fn wants_rescan(&self, node: NodeId) -> bool {
        self.rescan[node.0]
    }

    pub fn clear(&mut self) {
        for set in &mut self.paths {
            set.clear();
        }
        self.rescan.fill(false);
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
