// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use gut_host::HostError;
use thiserror::Error;

/// Errors from VCS operations.
#[derive(Debug, Error)]
pub enum VcsError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error("gut {op} failed with exit code {exit_code}: {stderr}")]
    Failed { op: &'static str, exit_code: i32, stderr: String },

    /// The working tree has local edits that must be committed before the
    /// attempted merge/pull can proceed. Soft: resolved by a full-sync-check
    /// on the same node.
    #[error("working tree has uncommitted changes")]
    NeedsCommit,

    #[error("refusing to run against unexpected origin: expected {expected}, found {actual}")]
    OriginMismatch { expected: String, actual: String },

    #[error("gut is not built on {host}; run `gut build` there first")]
    NotBuilt { host: String },

    #[error("gut on {host} is {found}, expected {expected}; rebuild with `gut build`")]
    WrongVersion { host: String, found: String, expected: String },
}

impl VcsError {
    pub fn is_needs_commit(&self) -> bool {
        matches!(self, VcsError::NeedsCommit)
    }
}
