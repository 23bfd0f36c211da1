// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed paths, ports, and timing constants shared across the workspace.
//!
//! Everything here is relative to the user's home directory on the host it
//! applies to; `Host::abs_path` resolves them per node.

use std::time::Duration;

/// Root of all gut-sync state in the user's home directory.
pub const GUT_PATH: &str = ".guts";
/// Where the build pipeline installs the renamed VCS binary.
pub const GUT_EXE_PATH: &str = ".guts/gut-build/bin/gut";
/// Directory of per-session symlinks served by the repository daemon.
pub const GUT_DAEMON_PATH: &str = ".guts/repos";
/// One pidfile per long-running child, for cleanup across runs.
pub const PIDFILE_PATH: &str = ".guts/pidfiles";

/// Name of the repository directory inside every synced directory.
pub const REPO_DIR_NAME: &str = ".gut";
/// Name of the ignore file at the root of every synced directory.
pub const IGNORE_FILE_NAME: &str = ".gutignore";

// Ignore files that are probably transient or machine-specific by default.
// Users can add globs to the root .gutignore or any nested one.
pub const DEFAULT_GUTIGNORE: &str = "# Added by `gut sync` during repo init:
*.lock
.#*
*.pyc
";

/// Candidate range for the daemon/tunnel port scan, inclusive.
pub const MIN_RANDOM_PORT: u16 = 34000;
pub const MAX_RANDOM_PORT: u16 = 34999;

/// Quiescent window after the last filesystem event before a flush.
pub const COMMIT_DEBOUNCE: Duration = Duration::from_millis(100);
/// Minimum spacing between reverse-tunnel reconnect attempts.
pub const RECONNECT_MIN_DELAY: Duration = Duration::from_secs(2);
/// How long shutdown waits for each node's cleanup before giving up.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);
/// Delay before restarting a crashed watcher backend.
pub const WATCHER_RESTART_DELAY: Duration = Duration::from_secs(2);

/// Capacity of the shared event channel fed by watchers and tunnels.
pub const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Commit hashes are trimmed to this many characters for display.
pub const HASH_DISPLAY_CHARS: usize = 10;

/// Version of the renamed VCS the build pipeline is expected to install.
pub const GUT_VERSION: &str = "v2.4.4";
