// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use clap::Parser;

#[test]
fn sync_parses_local_and_peers() {
    let cli = Cli::parse_from(["gut", "sync", "~/work", "bob@example.com:~/work"]);
    match cli.command {
        Command::Sync(args) => {
            assert_eq!(args.local_path, "~/work");
            assert_eq!(args.peers, vec!["bob@example.com:~/work".to_string()]);
            assert!(args.identity.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn sync_accepts_identity_and_flags() {
    let cli = Cli::parse_from([
        "gut", "sync", "--no-color", "-v", "-i", "/home/bob/.ssh/id", "~/work",
        "example.com:~/work", "other.com:~/work",
    ]);
    assert!(cli.verbose);
    assert!(cli.no_color);
    match cli.command {
        Command::Sync(args) => {
            assert_eq!(args.identity.as_deref(), Some(std::path::Path::new("/home/bob/.ssh/id")));
            assert_eq!(args.peers.len(), 2);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn sync_requires_a_peer() {
    assert!(Cli::try_parse_from(["gut", "sync", "~/work"]).is_err());
}
