// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use thiserror::Error;

/// Errors from host operations.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not connect to {host}: {reason}")]
    Connect { host: String, reason: String },

    #[error("host is not connected")]
    Disconnected,

    #[error("command failed with exit code {exit_code}: {argv}: {stderr}")]
    CommandFailed { argv: String, exit_code: i32, stderr: String },

    #[error("failed to spawn {argv}: {reason}")]
    Spawn { argv: String, reason: String },

    #[error("reverse tunnel failed: {reason}")]
    Tunnel { reason: String },

    #[error("could not determine home directory")]
    NoHome,

    #[error("no such path: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{0} is not supported on this host")]
    Unsupported(&'static str),
}

impl HostError {
    /// Expected while a peer is unreachable; logged quietly by supervisors.
    pub fn is_transient(&self) -> bool {
        match self {
            HostError::Connect { reason, .. } | HostError::Tunnel { reason } => {
                let reason = reason.to_ascii_lowercase();
                reason.contains("timed out")
                    || reason.contains("timeout")
                    || reason.contains("no route to host")
                    || reason.contains("connection refused")
                    || reason.contains("connection reset")
            }
            HostError::Disconnected => true,
            _ => false,
        }
    }
}
