// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The sync command: wire up nodes, hand off to the engine.

use std::sync::Arc;

use gut_core::{random_repo_name, NodeId, SyncNode};
use gut_engine::{FsWatcher, NodeHandle, Orchestrator, SyncOpts};
use gut_host::{Host, HostExt, LocalHost, SshHost};
use gut_vcs::GutVcs;
use tracing::info;

use crate::cli::SyncArgs;
use crate::fatal::FatalError;

pub async fn run(args: SyncArgs) -> Result<(), FatalError> {
    let local = SyncNode::parse(&args.local_path)?;
    if !local.is_local() {
        return Err(FatalError::new(format!(
            "the first path must be on this machine, got {}",
            args.local_path
        )));
    }

    let mut specs = vec![local];
    for peer in &args.peers {
        specs.push(SyncNode::parse(peer)?);
    }

    let mut nodes = Vec::with_capacity(specs.len());
    for (i, spec) in specs.into_iter().enumerate() {
        let host: Arc<dyn Host> = match spec.ssh_destination() {
            Some(destination) => Arc::new(SshHost::new(destination, args.identity.clone())),
            None => Arc::new(LocalHost::new()),
        };
        host.connect()
            .await
            .map_err(|e| FatalError::new(format!("cannot reach {}: {}", spec, e)))?;
        let sync_dir = host.abs_path(&spec.sync_path).await?;
        let vcs = Arc::new(GutVcs::new(
            host.clone(),
            sync_dir.clone(),
            spec.hostname_or_localhost(),
        ));
        nodes.push(NodeHandle::new(NodeId(i), spec, host, vcs, sync_dir));
    }

    for node in &nodes {
        info!(node = %node.node, branch = %node.branch, "syncing");
    }

    let orchestrator = Arc::new(Orchestrator::new(
        nodes,
        FsWatcher::default(),
        random_repo_name(),
        SyncOpts::default(),
    )?);

    // SIGINT is the expected way out of a sync session; exit code 1 by
    // design.
    let on_signal = orchestrator.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.shutdown("Received SIGINT.").await;
            std::process::exit(1);
        }
    });

    match orchestrator.run().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let message = e.to_string();
            orchestrator.shutdown(&message).await;
            Err(FatalError::new(message))
        }
    }
}
