// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Argument surface.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Style, Styles};
use clap::{Parser, Subcommand};

/// Help palette: the basic ANSI pair the sync log also leans on (green
/// for things the user types or gut commits, red for errors). Plain
/// whenever stdout is not a terminal or NO_COLOR is set; the
/// `--no-color` flag only governs the log, which is parsed later.
fn help_styles() -> Styles {
    if !std::io::stdout().is_terminal() || std::env::var_os("NO_COLOR").is_some() {
        return Styles::plain();
    }
    Styles::styled()
        .header(Style::new().bold())
        .literal(Style::new().fg_color(Some(AnsiColor::Green.into())))
        .placeholder(Style::new().fg_color(Some(AnsiColor::Cyan.into())))
        .error(Style::new().fg_color(Some(AnsiColor::Red.into())))
}

/// Live directory mirroring over SSH.
#[derive(Debug, Parser)]
#[command(name = "gut", version, styles = help_styles())]
pub struct Cli {
    /// Show verbose debug information
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Continuously mirror a directory across hosts
    Sync(SyncArgs),
    /// Verify the renamed VCS is installed for this user
    Build,
}

#[derive(Debug, clap::Args)]
pub struct SyncArgs {
    /// SSH identity file used for peers and tunnels
    #[arg(short = 'i', long = "identity")]
    pub identity: Option<PathBuf>,

    /// Directory on this machine
    pub local_path: String,

    /// Peers: ([user@]host:)?absoluteOrTildePath
    #[arg(required = true)]
    pub peers: Vec<String>,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
