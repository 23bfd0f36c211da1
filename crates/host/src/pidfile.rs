// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pidfile bookkeeping for long-running children.
//!
//! Each daemon gets `<state-root>/.guts/pidfiles/<name>.pid` holding one
//! decimal pid, so a later run can clean up children that outlived their
//! session.

use std::path::Path;

use gut_core::config::PIDFILE_PATH;
use tracing::{debug, info};

use crate::error::HostError;
use crate::host::{Host, HostExt};

/// Record the pid of a named daemon on `host`.
pub async fn save_daemon_pid(host: &dyn Host, name: &str, pid: u32) -> Result<(), HostError> {
    let dir = host.state_path(PIDFILE_PATH).await?;
    host.mkdirp(&dir).await?;
    host.write_file(&dir.join(format!("{}.pid", name)), format!("{}\n", pid).as_bytes()).await
}

/// Kill every process recorded in the host's pidfile directory and remove
/// the files. Dead pids and unreadable files are skipped quietly.
pub async fn kill_all_via_pidfiles(host: &dyn Host) -> Result<(), HostError> {
    let dir = host.state_path(PIDFILE_PATH).await?;
    if !host.path_exists(&dir).await? {
        return Ok(());
    }
    for name in host.list_dir(&dir).await? {
        if !name.ends_with(".pid") {
            continue;
        }
        let path = dir.join(&name);
        match read_pid(host, &path).await {
            Some(pid) => {
                info!(host = %host.label(), pid, pidfile = %name, "killing stale daemon");
                let argv =
                    vec!["kill".to_string(), "-9".to_string(), pid.to_string()];
                if let Err(e) = host.run(&argv).await {
                    debug!(host = %host.label(), pid, error = %e, "stale pid kill failed");
                }
            }
            None => debug!(host = %host.label(), pidfile = %name, "unreadable pidfile"),
        }
        if let Err(e) = host.delete_file(&path).await {
            debug!(host = %host.label(), pidfile = %name, error = %e, "pidfile removal failed");
        }
    }
    Ok(())
}

async fn read_pid(host: &dyn Host, path: &Path) -> Option<u32> {
    let bytes = host.read_file(path).await.ok()?;
    String::from_utf8_lossy(&bytes).trim().parse().ok()
}

#[cfg(test)]
#[path = "pidfile_tests.rs"]
mod tests;
