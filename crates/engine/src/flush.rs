// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The flush pipeline: commit fan-out, converge on local, pull fan-out.
//!
//! Flushes are driven inline by the event loop, so no two ever overlap.
//! Failures are isolated per node: a node that fails a phase is skipped
//! for the rest of the cycle and stays live for the next one.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use gut_core::{commit_prefix, FileEvent, NodeId, PendingChanges};
use gut_vcs::Vcs;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::event::SyncEvent;
use crate::node::NodeHandle;
use crate::orchestrator::Orchestrator;
use crate::watch::Watcher;

impl<W: Watcher> Orchestrator<W> {
    /// One commit → push → merge → pull cycle for the accumulated batch.
    ///
    /// `last_pushed` tracks the last head successfully pushed and merged
    /// per node; a node re-enters phase 2 whenever its head moved past
    /// that mark, which also catches commits stranded by an outage.
    pub(crate) async fn flush(
        &self,
        pending: &PendingChanges,
        last_pushed: &mut [Option<String>],
        force_sync: bool,
        tx: &mpsc::Sender<SyncEvent>,
    ) {
        let dirty = pending.dirty_nodes();
        if dirty.is_empty() && !force_sync {
            return;
        }
        debug!(nodes = dirty.len(), force_sync, "flush started");

        // Phase 1: commit fan-out across dirty nodes.
        let commits = join_all(dirty.iter().map(|id| {
            let node = self.nodes[id.0].clone();
            let paths = pending.paths_for(*id);
            let rescan = pending.wants_rescan(*id);
            async move {
                let prefix = commit_prefix(&paths);
                (node.id, node.vcs.commit(&prefix, rescan).await)
            }
        }))
        .await;

        let mut excluded: HashSet<NodeId> = HashSet::new();
        let mut any_changed = false;
        for (id, result) in commits {
            match result {
                Ok(changed) => {
                    if changed {
                        info!(node = %self.nodes[id.0].label(), "committed");
                        any_changed = true;
                    }
                }
                Err(e) => {
                    warn!(node = %self.nodes[id.0].label(), error = %e, "commit failed, node skipped this cycle");
                    excluded.insert(id);
                }
            }
        }
        if !any_changed && !force_sync {
            return;
        }

        // Phase 2: read heads in parallel, then serialize push + merge so
        // only one side at a time lands on the local master.
        let candidates: Vec<Arc<NodeHandle>> = self.nodes[1..]
            .iter()
            .filter(|node| !excluded.contains(&node.id))
            .cloned()
            .collect();
        let heads = join_all(candidates.iter().map(|node| async move {
            if !node.is_connected() {
                return None;
            }
            match node.vcs.rev_parse_head().await {
                Ok(head) => Some((node.clone(), head)),
                Err(e) => {
                    warn!(node = %node.label(), error = %e, "head read failed");
                    None
                }
            }
        }))
        .await;

        let local = self.local().clone();
        for (node, head) in heads.into_iter().flatten() {
            if last_pushed[node.id.0].as_deref() == Some(head.as_str()) {
                continue;
            }
            if let Err(e) = node.vcs.push(&node.branch).await {
                warn!(node = %node.label(), error = %e, "push failed, node skipped this cycle");
                excluded.insert(node.id);
                continue;
            }
            match local.vcs.merge(&node.branch).await {
                Ok(()) => {
                    debug!(node = %node.label(), branch = %node.branch, "merged into master");
                    last_pushed[node.id.0] = Some(head);
                }
                Err(e) if e.is_needs_commit() => {
                    // Local edits got ahead of the loop; commit them next
                    // cycle and retry this branch then. try_send: the loop
                    // is inside this flush, so a full channel must not
                    // block here.
                    warn!(node = %local.label(), "local working tree needs commit, rescheduling");
                    let _ = tx.try_send(SyncEvent::File(FileEvent::full_sync_check(local.id)));
                }
                Err(e) => {
                    warn!(node = %node.label(), error = %e, "merge failed");
                }
            }
        }

        let local_head = match local.vcs.rev_parse_head().await {
            Ok(head) => head,
            Err(e) => {
                warn!(node = %local.label(), error = %e, "local head read failed, skipping fan-out");
                return;
            }
        };

        // Phase 3: pull fan-out to every connected remote that is behind.
        join_all(self.nodes[1..].iter().filter(|node| !excluded.contains(&node.id)).map(
            |node| {
                let local_head = local_head.clone();
                let tx = tx.clone();
                async move {
                    if !node.is_connected() {
                        info!(node = %node.label(), "skipping disconnected remote");
                        return;
                    }
                    let head = match node.vcs.rev_parse_head().await {
                        Ok(head) => head,
                        Err(e) => {
                            warn!(node = %node.label(), error = %e, "head read failed");
                            return;
                        }
                    };
                    if head == local_head {
                        return;
                    }
                    match node.vcs.pull().await {
                        Ok(()) => debug!(node = %node.label(), "pulled"),
                        Err(e) if e.is_needs_commit() => {
                            warn!(node = %node.label(), "working tree needs commit, rescheduling");
                            let _ =
                                tx.try_send(SyncEvent::File(FileEvent::full_sync_check(node.id)));
                        }
                        Err(e) => warn!(node = %node.label(), error = %e, "pull failed"),
                    }
                }
            },
        ))
        .await;

        debug!("flush complete");
    }
}
