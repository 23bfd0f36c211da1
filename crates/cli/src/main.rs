// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gut: live directory mirroring over SSH on a renamed VCS.

mod cli;
mod commands;
mod fatal;
mod logging;
mod passthrough;

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use crate::cli::{Cli, Command};
use crate::fatal::FatalError;

fn main() -> ExitCode {
    // Plain VCS subcommands never reach clap: `gut status` is the renamed
    // binary's status, not ours.
    if let Some(cmd) = std::env::args().nth(1) {
        if gut_core::is_vcs_subcommand(&cmd) {
            return passthrough::exec(&cmd, std::env::args().skip(2).collect());
        }
    }

    let cli = Cli::parse();
    logging::init(cli.verbose, cli.no_color);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to start runtime");
            return ExitCode::from(1);
        }
    };

    let result = runtime.block_on(async {
        match cli.command {
            Command::Sync(args) => commands::sync::run(args).await,
            Command::Build => commands::build::run().await,
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(FatalError(message)) => {
            error!("{}", message);
            ExitCode::from(1)
        }
    }
}
