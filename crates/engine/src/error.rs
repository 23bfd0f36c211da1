// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use gut_host::HostError;
use gut_vcs::VcsError;
use thiserror::Error;

use crate::watch::WatchError;

/// Top-level sync failures.
///
/// Everything here is fatal to the session; recoverable conditions
/// (tunnel loss, per-node command failures, `NeedsCommit`) are handled
/// inside the event loop and never surface as a `SyncError`.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{0}")]
    FatalConfig(String),

    #[error("not enough available ports found")]
    NoPortsAvailable,

    #[error("cannot sync incompatible repos: local tail {local}, {node} tail {remote}")]
    IncompatibleRepos { node: String, local: String, remote: String },

    #[error("refusing to initialize {path} on {node}: not an empty directory")]
    SyncFolderNotEmpty { node: String, path: String },

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Watch(#[from] WatchError),
}
