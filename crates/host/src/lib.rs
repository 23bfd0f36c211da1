// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gut-host: the per-machine capability layer.
//!
//! Everything the sync engine does to a machine (running commands,
//! touching files, opening reverse tunnels) goes through the [`Host`]
//! trait so local and SSH-reachable nodes look identical from above.

mod error;
mod host;
mod local;
mod pidfile;
mod ssh;

pub use error::HostError;
pub use host::{DaemonHandle, ExecResult, FileStat, Host, HostExt, TunnelHandle};
pub use local::LocalHost;
pub use pidfile::{kill_all_via_pidfiles, save_daemon_pid};
pub use ssh::SshHost;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeHost;
