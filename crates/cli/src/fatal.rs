// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fatal errors surfaced by the binary.
//!
//! The CLI knows exactly two exit codes: 0 for a clean shutdown and 1
//! for SIGINT or any fatal error, so a fatal carries only the message
//! that reaches the operator. `main()` owns process termination.

use std::fmt;

#[derive(Debug)]
pub struct FatalError(pub String);

impl FatalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for FatalError {}

impl From<gut_core::ParsePathError> for FatalError {
    fn from(e: gut_core::ParsePathError) -> Self {
        Self(e.to_string())
    }
}

impl From<gut_host::HostError> for FatalError {
    fn from(e: gut_host::HostError) -> Self {
        Self(e.to_string())
    }
}

impl From<gut_vcs::VcsError> for FatalError {
    fn from(e: gut_vcs::VcsError) -> Self {
        Self(e.to_string())
    }
}

impl From<gut_engine::SyncError> for FatalError {
    fn from(e: gut_engine::SyncError) -> Self {
        Self(e.to_string())
    }
}
