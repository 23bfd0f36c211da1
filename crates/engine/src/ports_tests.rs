// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gut_core::config::{MAX_RANDOM_PORT, MIN_RANDOM_PORT};
use gut_host::FakeHost;

fn hosts_with_listings(listings: &[&str]) -> Vec<Arc<dyn Host>> {
    listings
        .iter()
        .enumerate()
        .map(|(i, listing)| {
            let host = FakeHost::new(&format!("h{}", i), i == 0);
            host.set_netstat(*listing);
            Arc::new(host) as Arc<dyn Host>
        })
        .collect()
}

#[tokio::test]
async fn zero_ports_is_trivially_satisfied() {
    let hosts = hosts_with_listings(&[""]);
    assert!(find_open_ports(0, &hosts).await.unwrap().is_empty());
}

#[tokio::test]
async fn picks_ports_absent_from_every_listing() {
    let used_on_a = format!("tcp 0 0 127.0.0.1:{} LISTEN", MIN_RANDOM_PORT);
    let used_on_b = format!("tcp 0 0 127.0.0.1:{} LISTEN", MIN_RANDOM_PORT + 1);
    let hosts = hosts_with_listings(&[&used_on_a, &used_on_b]);

    let ports = find_open_ports(3, &hosts).await.unwrap();
    assert_eq!(ports.len(), 3);
    for port in &ports {
        assert!(*port >= MIN_RANDOM_PORT && *port <= MAX_RANDOM_PORT);
        assert_ne!(*port, MIN_RANDOM_PORT);
        assert_ne!(*port, MIN_RANDOM_PORT + 1);
    }
    let mut unique = ports.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), 3);
}

#[tokio::test]
async fn exhausted_range_reports_no_ports() {
    let everything: String = (MIN_RANDOM_PORT..=MAX_RANDOM_PORT)
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    let hosts = hosts_with_listings(&[&everything]);
    let err = find_open_ports(1, &hosts).await.unwrap_err();
    assert!(matches!(err, SyncError::NoPortsAvailable));
}

proptest::proptest! {
    #![proptest_config(proptest::prelude::ProptestConfig::with_cases(16))]

    // With at most M - N ports in use, a request for N ports succeeds with
    // N distinct ports outside every listing.
    #[test]
    fn allocator_liveness(
        used in proptest::collection::btree_set(
            MIN_RANDOM_PORT..=MAX_RANDOM_PORT, 0..50),
        count in 1usize..4,
    ) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let listing = used
                .iter()
                .map(|p| format!("127.0.0.1:{}", p))
                .collect::<Vec<_>>()
                .join("\n");
            let hosts = hosts_with_listings(&[&listing]);
            let ports = find_open_ports(count, &hosts).await.unwrap();
            assert_eq!(ports.len(), count);
            for port in &ports {
                assert!(!used.contains(port));
            }
        });
    }
}
