// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Probe for the renamed VCS binary installed by the build pipeline.
//!
//! Building the binary itself is the build pipeline's job; the sync engine
//! only verifies that each node has a usable installation before any
//! repository command runs.

use gut_core::config::{GUT_EXE_PATH, GUT_VERSION};
use gut_host::{Host, HostExt};

use crate::error::VcsError;

/// Verify `~/.guts/gut-build/bin/gut` exists on `host` and reports the
/// version the pipeline is expected to install.
pub async fn ensure_built(host: &dyn Host) -> Result<(), VcsError> {
    let exe = host.state_path(GUT_EXE_PATH).await?;
    if !host.path_exists(&exe).await? {
        return Err(VcsError::NotBuilt { host: host.label() });
    }
    let argv = vec![exe.to_string_lossy().into_owned(), "--version".to_string()];
    let found = host.output(&argv).await?;
    let expected = GUT_VERSION.trim_start_matches('v');
    if found.contains(expected) {
        Ok(())
    } else {
        Err(VcsError::WrongVersion {
            host: host.label(),
            found,
            expected: GUT_VERSION.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gut_host::FakeHost;

    #[tokio::test]
    async fn missing_binary_is_not_built() {
        let host = FakeHost::new("alpha", true);
        let err = ensure_built(&host).await.unwrap_err();
        assert!(matches!(err, VcsError::NotBuilt { .. }));
    }

    #[tokio::test]
    async fn present_binary_passes_probe() {
        let host = FakeHost::new("alpha", true);
        let exe = host.home().join(GUT_EXE_PATH);
        host.write_file(&exe, b"").await.unwrap();
        // The fake host answers every command with exit 0 and no output,
        // which does not contain the version string.
        let err = ensure_built(&host).await.unwrap_err();
        assert!(matches!(err, VcsError::WrongVersion { .. }));
    }
}
