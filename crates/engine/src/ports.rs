// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port allocation by scanning `netstat` across all participating hosts.

use std::sync::Arc;

use gut_core::config::{MAX_RANDOM_PORT, MIN_RANDOM_PORT};
use gut_host::{Host, HostExt};
use rand::seq::SliceRandom;

use crate::error::SyncError;

/// Pick `count` ports from the candidate range that appear in no host's
/// `netstat` listing.
///
/// The match is a plain substring check against the concatenated
/// listings, so a port is also skipped when its digits merely show up
/// elsewhere; the range is large enough that false positives only cost
/// candidates.
pub async fn find_open_ports(
    count: usize,
    hosts: &[Arc<dyn Host>],
) -> Result<Vec<u16>, SyncError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let mut listings = String::new();
    for host in hosts {
        let opt = if host.is_windows() { "-an" } else { "-anl" };
        let output = host.output(&["netstat".to_string(), opt.to_string()]).await?;
        listings.push_str(&output);
        listings.push(' ');
    }

    let mut candidates: Vec<u16> = (MIN_RANDOM_PORT..=MAX_RANDOM_PORT).collect();
    candidates.shuffle(&mut rand::thread_rng());

    let mut ports = Vec::with_capacity(count);
    for port in candidates {
        if !listings.contains(&port.to_string()) {
            ports.push(port);
            if ports.len() == count {
                return Ok(ports);
            }
        }
    }
    Err(SyncError::NoPortsAvailable)
}

#[cfg(test)]
#[path = "ports_tests.rs"]
mod tests;
