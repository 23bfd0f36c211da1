// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Re-exec shim: plain VCS subcommands go straight to the renamed binary.

use std::process::ExitCode;

use gut_core::config::GUT_EXE_PATH;

/// Replace this process with `~/.guts/gut-build/bin/gut <cmd> <args...>`.
pub fn exec(cmd: &str, args: Vec<String>) -> ExitCode {
    let Some(home) = dirs::home_dir() else {
        eprintln!("gut: could not determine home directory");
        return ExitCode::from(1);
    };
    let exe = home.join(GUT_EXE_PATH);
    if !exe.exists() {
        eprintln!("gut: {} is not built; run `gut build` first", exe.display());
        return ExitCode::from(1);
    }

    let mut command = std::process::Command::new(&exe);
    command.arg(cmd).args(&args);

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        let err = command.exec();
        eprintln!("gut: failed to exec {}: {}", exe.display(), err);
        ExitCode::from(1)
    }
    #[cfg(not(unix))]
    {
        match command.status() {
            Ok(status) => ExitCode::from(status.code().unwrap_or(1).clamp(0, 255) as u8),
            Err(e) => {
                eprintln!("gut: failed to run {}: {}", exe.display(), e);
                ExitCode::from(1)
            }
        }
    }
}
