// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log setup and color policy for the binary.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Whether the sync log gets ANSI colors. `--no-color` wins, then
/// `NO_COLOR=1` disables and `COLOR=1` forces; otherwise stderr being a
/// terminal decides (the log writes to stderr, not stdout).
fn colorize(no_color_flag: bool) -> bool {
    if no_color_flag {
        return false;
    }
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    std::io::stderr().is_terminal()
}

/// Install the global subscriber. `RUST_LOG` wins over the flags.
pub fn init(verbose: bool, no_color: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(colorize(no_color))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
