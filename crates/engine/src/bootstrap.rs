// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session bootstrap: binaries, port, daemon, tunnels, tail-hash
//! reconciliation, origin wiring, watchers, and the seed events.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::join_all;
use gut_core::{trim_commit, FileEvent, NodeId};
use gut_host::{kill_all_via_pidfiles, Host};
use gut_vcs::Vcs;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::SyncError;
use crate::event::SyncEvent;
use crate::node::NodeHandle;
use crate::orchestrator::Orchestrator;
use crate::ports::find_open_ports;
use crate::tunnel;
use crate::watch::Watcher;

impl<W: Watcher> Orchestrator<W> {
    /// Run bootstrap phases A through G. Returns the allocated port.
    pub(crate) async fn bootstrap(&self, tx: &mpsc::Sender<SyncEvent>) -> Result<u16, SyncError> {
        // Phase A: binaries must exist everywhere before any VCS command.
        // Stale children from previous runs die at the same time.
        let checks = join_all(self.nodes.iter().map(|node| async move {
            node.vcs.ensure_built().await?;
            if let Err(e) = kill_all_via_pidfiles(node.host.as_ref()).await {
                debug!(node = %node.label(), error = %e, "stale pidfile cleanup failed");
            }
            Ok::<(), SyncError>(())
        }))
        .await;
        for check in checks {
            check?;
        }

        // Phase B: one port, free on every node.
        let hosts: Vec<Arc<dyn Host>> = self.nodes.iter().map(|n| n.host.clone()).collect();
        let port = find_open_ports(1, &hosts)
            .await?
            .into_iter()
            .next()
            .ok_or(SyncError::NoPortsAvailable)?;
        info!(port, "allocated daemon port");

        // Phase C: daemon on the local node, reverse tunnel per remote.
        // A same-machine peer reaches the daemon directly.
        self.local().vcs.start_daemon(&self.repo_name, port).await?;
        for node in self.nodes[1..].iter().filter(|n| !n.host.is_local()) {
            tunnel::start(
                node.clone(),
                port,
                tx.clone(),
                self.cancel.clone(),
                self.opts.reconnect_min_delay,
            )
            .await?;
        }

        // Phase D.
        self.reconcile_tails(port).await?;

        // Phase E: origin + identity on every node (idempotent for nodes
        // wired during phase D).
        let wired = join_all(
            self.nodes
                .iter()
                .map(|node| async move { node.vcs.setup_origin(&self.repo_name, port).await }),
        )
        .await;
        for result in wired {
            result?;
        }

        // Phase F: watchers into the shared channel.
        for node in &self.nodes {
            self.watcher.watch(node.clone(), tx.clone(), self.cancel.clone()).await?;
        }

        // Phase G: one full sync check per node reconciles anything that
        // changed before the watchers attached.
        for node in &self.nodes {
            let _ = tx.send(SyncEvent::File(FileEvent::full_sync_check(node.id))).await;
        }

        Ok(port)
    }

    /// Phase D: the tail-hash decision table.
    async fn reconcile_tails(&self, port: u16) -> Result<(), SyncError> {
        let tails = join_all(self.nodes.iter().map(|node| async move {
            node.vcs.tail_hash().await.map_err(SyncError::from)
        }))
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

        for (node, tail) in self.nodes.iter().zip(&tails) {
            info!(
                node = %node.label(),
                tail = tail.as_deref().map(trim_commit).unwrap_or("<none>"),
                "repo base commit"
            );
        }

        match tails[0].clone() {
            // Local is canonical: peers must match or be empty.
            Some(local_tail) => {
                for (node, tail) in self.nodes.iter().zip(&tails).skip(1) {
                    if let Some(tail) = tail {
                        if *tail != local_tail {
                            return Err(SyncError::IncompatibleRepos {
                                node: node.label(),
                                local: local_tail,
                                remote: tail.clone(),
                            });
                        }
                    }
                }
                self.bootstrap_empty_remotes(&tails, port).await
            }
            None => {
                // First node per distinct remote tail hash.
                let mut sources: BTreeMap<String, usize> = BTreeMap::new();
                for (i, tail) in tails.iter().enumerate().skip(1) {
                    if let Some(tail) = tail {
                        sources.entry(tail.clone()).or_insert(i);
                    }
                }
                match sources.len() {
                    0 => self.init_fresh(&tails, port).await,
                    1 => {
                        let (_, source) = sources.into_iter().next().unwrap_or_default();
                        self.adopt_source(source, &tails, port).await
                    }
                    _ => {
                        let mut iter = sources.into_iter();
                        let (first, _) = iter.next().unwrap_or_default();
                        let (second, i) = iter.next().unwrap_or_default();
                        Err(SyncError::IncompatibleRepos {
                            node: self.nodes[i].label(),
                            local: first,
                            remote: second,
                        })
                    }
                }
            }
        }
    }

    /// No repository anywhere: create it on the local node. Local content
    /// (if any) seeds the repository; receiving remotes must be empty.
    async fn init_fresh(&self, tails: &[Option<String>], port: u16) -> Result<(), SyncError> {
        let local = self.local();
        info!(node = %local.label(), "initializing fresh repository");
        local.vcs.init().await?;
        local.vcs.ensure_initial_commit().await?;
        let tail = local.vcs.tail_hash().await?.ok_or_else(|| {
            SyncError::FatalConfig(format!(
                "failed to initialize new repo in {}",
                local.sync_dir.display()
            ))
        })?;
        info!(tail = trim_commit(&tail), "session compatibility key established");
        self.bootstrap_empty_remotes(tails, port).await
    }

    /// Exactly one tail hash exists, on a remote: adopt it as canonical by
    /// pushing the source's branch through the local daemon and checking
    /// it out as the local master.
    async fn adopt_source(
        &self,
        source: usize,
        tails: &[Option<String>],
        port: u16,
    ) -> Result<(), SyncError> {
        let local = self.local();
        let src = &self.nodes[source];
        info!(node = %src.label(), "adopting existing repository");
        self.assert_sync_folder_is_empty(local).await?;
        local.vcs.init().await?;
        src.vcs.setup_origin(&self.repo_name, port).await?;
        src.vcs.push(&src.branch).await?;
        local.vcs.checkout_as_master(&src.branch).await?;
        self.bootstrap_empty_remotes(tails, port).await
    }

    /// Init + origin + pull for every remote that has no repository yet,
    /// in parallel. Each must be an empty directory.
    async fn bootstrap_empty_remotes(
        &self,
        tails: &[Option<String>],
        port: u16,
    ) -> Result<(), SyncError> {
        let empties: Vec<NodeId> = self
            .nodes
            .iter()
            .zip(tails)
            .skip(1)
            .filter(|(_, tail)| tail.is_none())
            .map(|(node, _)| node.id)
            .collect();
        let results = join_all(empties.iter().map(|id| self.bootstrap_remote(*id, port))).await;
        for result in results {
            result?;
        }
        Ok(())
    }

    async fn bootstrap_remote(&self, id: NodeId, port: u16) -> Result<(), SyncError> {
        let node = &self.nodes[id.0];
        self.assert_sync_folder_is_empty(node).await?;
        node.host.mkdirp(&node.sync_dir).await?;
        node.vcs.init().await?;
        node.vcs.setup_origin(&self.repo_name, port).await?;
        node.vcs.pull().await?;
        info!(node = %node.label(), "bootstrapped from local repository");
        Ok(())
    }

    /// Empty means: missing, or a directory with no entries at all.
    async fn assert_sync_folder_is_empty(&self, node: &NodeHandle) -> Result<(), SyncError> {
        let not_empty = || SyncError::SyncFolderNotEmpty {
            node: node.label(),
            path: node.sync_dir.display().to_string(),
        };
        match node.host.stat(&node.sync_dir).await? {
            None => Ok(()),
            Some(stat) if !stat.is_dir => Err(not_empty()),
            Some(_) => {
                if node.host.list_dir(&node.sync_dir).await?.is_empty() {
                    Ok(())
                } else {
                    Err(not_empty())
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
