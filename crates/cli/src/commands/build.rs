// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The build command: verify this user's gut installation.

use gut_core::config::GUT_VERSION;
use gut_host::LocalHost;
use tracing::info;

use crate::fatal::FatalError;

pub async fn run() -> Result<(), FatalError> {
    let host = LocalHost::new();
    gut_vcs::ensure_built(&host).await?;
    info!("gut {} is already built", GUT_VERSION);
    Ok(())
}
