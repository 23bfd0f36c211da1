// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sync node identity and per-node branch naming.

use thiserror::Error;

/// Errors from parsing a sync-path argument.
#[derive(Debug, Error)]
pub enum ParsePathError {
    #[error("could not parse sync path: [{0}]")]
    Invalid(String),
}

/// One participating host plus its synced directory.
///
/// Identity is `(username, hostname, sync_path)`; an absent hostname means
/// the node is the invoking machine. The path may be absolute or
/// `~`-relative until the owning `Host` resolves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncNode {
    pub username: Option<String>,
    pub hostname: Option<String>,
    pub sync_path: String,
}

impl SyncNode {
    /// Parse a `([user@]host:)?absoluteOrTildePath` argument.
    pub fn parse(spec: &str) -> Result<Self, ParsePathError> {
        if spec.is_empty() {
            return Err(ParsePathError::Invalid(spec.to_string()));
        }
        match spec.split_once(':') {
            Some((head, path)) if !head.is_empty() && !path.is_empty() => {
                let (username, hostname) = match head.split_once('@') {
                    Some((user, host)) if !user.is_empty() && !host.is_empty() => {
                        (Some(user.to_string()), host.to_string())
                    }
                    None => (None, head.to_string()),
                    Some(_) => return Err(ParsePathError::Invalid(spec.to_string())),
                };
                Ok(Self { username, hostname: Some(hostname), sync_path: path.to_string() })
            }
            Some(_) => Err(ParsePathError::Invalid(spec.to_string())),
            None => Ok(Self { username: None, hostname: None, sync_path: spec.to_string() }),
        }
    }

    pub fn local(sync_path: impl Into<String>) -> Self {
        Self { username: None, hostname: None, sync_path: sync_path.into() }
    }

    pub fn is_local(&self) -> bool {
        self.hostname.is_none()
    }

    /// Hostname for display and VCS author fields; `localhost` for the
    /// invoking machine.
    pub fn hostname_or_localhost(&self) -> &str {
        self.hostname.as_deref().unwrap_or("localhost")
    }

    /// The `user@host` destination handed to SSH. None for the local node.
    pub fn ssh_destination(&self) -> Option<String> {
        let hostname = self.hostname.as_deref()?;
        Some(match &self.username {
            Some(user) => format!("{}@{}", user, hostname),
            None => hostname.to_string(),
        })
    }

    /// Canonical identity string the branch fingerprint is derived from.
    fn canonical_identity(&self) -> String {
        format!(
            "{}@{}:{}",
            self.username.as_deref().unwrap_or(""),
            self.hostname_or_localhost(),
            self.sync_path
        )
    }

    /// Per-node branch name: `<hostname>-<first-8-hex-of-md5(identity)>`.
    ///
    /// Each node pushes to its own branch; the local node also owns
    /// `master`. Deterministic in the node identity.
    pub fn branch_name(&self) -> String {
        let digest = md5::compute(self.canonical_identity().as_bytes());
        let hex = format!("{:x}", digest);
        format!("{}-{}", self.hostname_or_localhost(), &hex[..8])
    }
}

impl std::fmt::Display for SyncNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.hostname {
            Some(host) => match &self.username {
                Some(user) => write!(f, "{}@{}:{}", user, host, self.sync_path),
                None => write!(f, "{}:{}", host, self.sync_path),
            },
            None => write!(f, "{}", self.sync_path),
        }
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
