// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use gut_core::{FileEvent, NodeId};

/// Everything that reaches the single event channel.
///
/// Producers are the per-node watchers and the tunnel supervisors; the
/// only consumer is the orchestrator's event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A path changed on a node.
    File(FileEvent),
    /// A reverse tunnel recovered; the node needs a full sync check to
    /// capture anything missed during the outage.
    Reconnected(NodeId),
}
