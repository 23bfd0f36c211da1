// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watcher fake: tests drive the event channel by hand.

use std::sync::Arc;

use async_trait::async_trait;
use gut_core::{FileEvent, NodeId};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{WatchError, Watcher};
use crate::event::SyncEvent;
use crate::node::NodeHandle;

/// Records watch attachments and lets tests emit events for a node.
#[derive(Clone, Default)]
pub struct FakeWatcher {
    senders: Arc<Mutex<Vec<(NodeId, mpsc::Sender<SyncEvent>)>>>,
}

impl FakeWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watched_nodes(&self) -> Vec<NodeId> {
        self.senders.lock().iter().map(|(id, _)| *id).collect()
    }

    /// Emit a change event as the node's watcher would.
    pub async fn emit(&self, node: NodeId, rel_path: &str) {
        let sender = self
            .senders
            .lock()
            .iter()
            .find(|(id, _)| *id == node)
            .map(|(_, tx)| tx.clone());
        if let Some(tx) = sender {
            let _ = tx.send(SyncEvent::File(FileEvent::new(node, rel_path))).await;
        }
    }
}

#[async_trait]
impl Watcher for FakeWatcher {
    async fn watch(
        &self,
        node: Arc<NodeHandle>,
        tx: mpsc::Sender<SyncEvent>,
        _cancel: CancellationToken,
    ) -> Result<(), WatchError> {
        self.senders.lock().push((node.id, tx));
        Ok(())
    }
}
