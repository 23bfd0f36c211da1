// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSH-reachable machines as [`Host`]s.
//!
//! Command execution rides an [`openssh`] session (which shells out to the
//! system OpenSSH binary), so the user's `~/.ssh/config`, agent, and
//! ControlMaster multiplexing all apply. File operations are implemented
//! via remote commands against a POSIX shell; no SFTP subsystem required.
//!
//! Reverse tunnels are *not* in-session forwards: each tunnel is its own
//! supervised `ssh -N -R` child process, so tunnel death is an observable
//! process exit rather than a silently wedged channel.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use openssh::{KnownHosts, Session, SessionBuilder};
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::HostError;
use crate::host::{DaemonHandle, ExecResult, FileStat, Host, TunnelHandle};

/// A remote machine reached over SSH.
pub struct SshHost {
    /// `user@host` or bare `host`, as handed to ssh.
    destination: String,
    identity: Option<PathBuf>,
    session: Mutex<Option<Arc<Session>>>,
    /// Output of `uname -s`, cached at connect time.
    uname: Mutex<Option<String>>,
    home: Mutex<Option<PathBuf>>,
    /// Remote pids of daemons spawned this session.
    children: Mutex<Vec<u32>>,
}

/// Quote a string for a POSIX shell.
fn shell_quote(s: &str) -> String {
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || "_-./=~:".contains(c)) {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn shell_join(argv: &[String]) -> String {
    argv.iter().map(|a| shell_quote(a)).collect::<Vec<_>>().join(" ")
}

impl SshHost {
    pub fn new(destination: impl Into<String>, identity: Option<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            identity,
            session: Mutex::new(None),
            uname: Mutex::new(None),
            home: Mutex::new(None),
            children: Mutex::new(Vec::new()),
        }
    }

    fn session(&self) -> Result<Arc<Session>, HostError> {
        self.session.lock().clone().ok_or(HostError::Disconnected)
    }

    fn script_for(cwd: Option<&Path>, argv: &[String]) -> String {
        let joined = shell_join(argv);
        match cwd {
            Some(dir) => format!("cd {} && {}", shell_quote(&dir.to_string_lossy()), joined),
            None => joined,
        }
    }

    /// Run a shell snippet on the remote and collect its output.
    async fn run_script(&self, script: &str) -> Result<ExecResult, HostError> {
        let session = self.session()?;
        let output = session
            .command("sh")
            .arg("-c")
            .arg(script)
            .output()
            .await
            .map_err(|e| HostError::Connect {
                host: self.destination.clone(),
                reason: e.to_string(),
            })?;
        Ok(ExecResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    async fn checked_script(&self, script: &str) -> Result<ExecResult, HostError> {
        let result = self.run_script(script).await?;
        if result.success() {
            Ok(result)
        } else {
            Err(HostError::CommandFailed {
                argv: script.to_string(),
                exit_code: result.exit_code,
                stderr: result.stderr.trim().to_string(),
            })
        }
    }

    fn ssh_base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "ExitOnForwardFailure=yes".to_string(),
            "-o".to_string(),
            "ServerAliveInterval=10".to_string(),
            "-o".to_string(),
            "ServerAliveCountMax=3".to_string(),
        ];
        if let Some(identity) = &self.identity {
            args.push("-i".to_string());
            args.push(identity.to_string_lossy().into_owned());
        }
        args
    }
}

#[async_trait]
impl Host for SshHost {
    fn label(&self) -> String {
        match self.destination.split_once('@') {
            Some((_, host)) => host.to_string(),
            None => self.destination.clone(),
        }
    }

    fn is_local(&self) -> bool {
        false
    }

    fn is_windows(&self) -> bool {
        false
    }

    fn is_darwin(&self) -> bool {
        self.uname.lock().as_deref() == Some("Darwin")
    }

    fn is_linux(&self) -> bool {
        self.uname.lock().as_deref() == Some("Linux")
    }

    fn is_connected(&self) -> bool {
        self.session.lock().is_some()
    }

    async fn connect(&self) -> Result<(), HostError> {
        if self.is_connected() {
            return Ok(());
        }
        let mut builder = SessionBuilder::default();
        builder.known_hosts_check(KnownHosts::Accept);
        if let Some(identity) = &self.identity {
            builder.keyfile(identity);
        }
        let session = builder.connect(&self.destination).await.map_err(|e| {
            HostError::Connect { host: self.destination.clone(), reason: e.to_string() }
        })?;
        *self.session.lock() = Some(Arc::new(session));

        let uname = self.run_script("uname -s").await?.stdout.trim().to_string();
        *self.uname.lock() = Some(uname);
        Ok(())
    }

    async fn close(&self) {
        let session = self.session.lock().take();
        if let Some(session) = session {
            if let Ok(session) = Arc::try_unwrap(session) {
                if let Err(e) = session.close().await {
                    debug!(host = %self.label(), error = %e, "ssh session close failed");
                }
            }
        }
    }

    async fn kill_all_sessions(&self) {
        let pids = std::mem::take(&mut *self.children.lock());
        for pid in pids {
            if let Err(e) = self.run_script(&format!("kill {} 2>/dev/null", pid)).await {
                debug!(host = %self.label(), pid, error = %e, "remote child already gone");
            }
        }
    }

    async fn run_in(&self, cwd: Option<&Path>, argv: &[String]) -> Result<ExecResult, HostError> {
        self.run_script(&Self::script_for(cwd, argv)).await
    }

    async fn spawn_daemon(
        &self,
        tag: &str,
        cwd: Option<&Path>,
        argv: &[String],
        stdout_tx: Option<mpsc::Sender<String>>,
    ) -> Result<DaemonHandle, HostError> {
        let session = self.session()?;
        // `echo $$` before exec gives us the remote pid on the first stdout
        // line; everything after belongs to the daemon itself.
        let script = match cwd {
            Some(dir) => format!(
                "cd {} && echo $$ && exec {}",
                shell_quote(&dir.to_string_lossy()),
                shell_join(argv)
            ),
            None => format!("echo $$ && exec {}", shell_join(argv)),
        };
        let mut cmd = Session::arc_command(session, "sh");
        cmd.arg("-c").arg(&script);
        cmd.stdin(openssh::Stdio::null());
        cmd.stdout(openssh::Stdio::piped());
        cmd.stderr(openssh::Stdio::null());
        let mut child = cmd
            .spawn()
            .await
            .map_err(|e| HostError::Spawn { argv: argv.join(" "), reason: e.to_string() })?;

        let stdout = child.stdout().take().ok_or(HostError::Spawn {
            argv: argv.join(" "),
            reason: "no stdout pipe".to_string(),
        })?;
        let mut lines = BufReader::new(stdout).lines();
        let first = lines.next_line().await.map_err(|e| HostError::Spawn {
            argv: argv.join(" "),
            reason: e.to_string(),
        })?;
        let pid: u32 = first
            .as_deref()
            .unwrap_or("")
            .trim()
            .parse()
            .map_err(|_| HostError::Spawn {
                argv: argv.join(" "),
                reason: format!("expected a pid line, got {:?}", first),
            })?;
        self.children.lock().push(pid);

        let (exit_tx, exit_rx) = oneshot::channel();
        let tag = tag.to_string();
        let host = self.label();
        tokio::spawn(async move {
            if let Some(tx) = stdout_tx {
                while let Ok(Some(line)) = lines.next_line().await {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
            } else {
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(host = %host, tag = %tag, "{}", line);
                }
            }
            let code = match child.wait().await {
                Ok(status) => status.code().unwrap_or(-1),
                Err(e) => {
                    warn!(host = %host, tag = %tag, error = %e, "failed to reap remote daemon");
                    -1
                }
            };
            let _ = exit_tx.send(code);
        });

        Ok(DaemonHandle { pid, exit: exit_rx })
    }

    async fn reverse_tunnel(
        &self,
        src_addr: &str,
        dest_addr: &str,
    ) -> Result<TunnelHandle, HostError> {
        let src_port = src_addr.rsplit(':').next().ok_or(HostError::Tunnel {
            reason: format!("bad source address {:?}", src_addr),
        })?;
        let forward = format!("{}:{}", src_port, dest_addr);

        let mut cmd = tokio::process::Command::new("ssh");
        cmd.arg("-N").args(self.ssh_base_args()).arg("-R").arg(&forward).arg(&self.destination);
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        let mut child = cmd
            .spawn()
            .map_err(|e| HostError::Spawn { argv: "ssh -N -R".to_string(), reason: e.to_string() })?;

        let stderr = child.stderr.take();
        let captured: Arc<Mutex<String>> = Arc::new(Mutex::new(String::new()));
        if let Some(stderr) = stderr {
            let captured = Arc::clone(&captured);
            let host = self.label();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(host = %host, tunnel = true, "{}", line);
                    let mut buf = captured.lock();
                    buf.push_str(&line);
                    buf.push('\n');
                }
            });
        }

        let (err_tx, err_rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let forward_desc = forward.clone();
        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    let stderr = captured.lock().trim().to_string();
                    let reason = match status {
                        Ok(status) => format!("{} exited ({}): {}", forward_desc, status, stderr),
                        Err(e) => format!("{}: {}", forward_desc, e),
                    };
                    let _ = err_tx.send(HostError::Tunnel { reason }).await;
                }
                _ = task_cancel.cancelled() => {
                    let _ = child.kill().await;
                }
            }
        });

        Ok(TunnelHandle::new(err_rx, cancel))
    }

    async fn home_dir(&self) -> Result<PathBuf, HostError> {
        if let Some(home) = self.home.lock().clone() {
            return Ok(home);
        }
        let out = self.checked_script(r#"printf %s "$HOME""#).await?;
        let home = PathBuf::from(out.stdout.trim());
        if home.as_os_str().is_empty() {
            return Err(HostError::NoHome);
        }
        *self.home.lock() = Some(home.clone());
        Ok(home)
    }

    async fn path_exists(&self, path: &Path) -> Result<bool, HostError> {
        let result = self
            .run_script(&format!("[ -e {} ]", shell_quote(&path.to_string_lossy())))
            .await?;
        Ok(result.success())
    }

    async fn stat(&self, path: &Path) -> Result<Option<FileStat>, HostError> {
        let quoted = shell_quote(&path.to_string_lossy());
        let script = format!(
            "if [ -d {q} ]; then echo dir; elif [ -e {q} ]; then echo file; else echo none; fi",
            q = quoted
        );
        let out = self.checked_script(&script).await?;
        match out.stdout.trim() {
            "dir" => Ok(Some(FileStat { is_dir: true })),
            "file" => Ok(Some(FileStat { is_dir: false })),
            _ => Ok(None),
        }
    }

    async fn mkdirp(&self, path: &Path) -> Result<(), HostError> {
        self.checked_script(&format!("mkdir -p {}", shell_quote(&path.to_string_lossy())))
            .await?;
        Ok(())
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), HostError> {
        let session = self.session()?;
        let script = format!("cat > {}", shell_quote(&path.to_string_lossy()));
        let mut cmd = Session::arc_command(session, "sh");
        cmd.arg("-c").arg(&script);
        cmd.stdin(openssh::Stdio::piped());
        cmd.stdout(openssh::Stdio::null());
        cmd.stderr(openssh::Stdio::null());
        let mut child = cmd.spawn().await.map_err(|e| HostError::Spawn {
            argv: script.clone(),
            reason: e.to_string(),
        })?;
        if let Some(mut stdin) = child.stdin().take() {
            stdin.write_all(contents).await.map_err(HostError::Io)?;
            stdin.shutdown().await.map_err(HostError::Io)?;
        }
        let status = child.wait().await.map_err(|e| HostError::Spawn {
            argv: script.clone(),
            reason: e.to_string(),
        })?;
        if status.code() == Some(0) {
            Ok(())
        } else {
            Err(HostError::CommandFailed {
                argv: script,
                exit_code: status.code().unwrap_or(-1),
                stderr: String::new(),
            })
        }
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, HostError> {
        let quoted = shell_quote(&path.to_string_lossy());
        let result = self.run_script(&format!("cat {}", quoted)).await?;
        if result.success() {
            Ok(result.stdout.into_bytes())
        } else if result.stderr.contains("No such file") {
            Err(HostError::NotFound(path.to_path_buf()))
        } else {
            Err(HostError::CommandFailed {
                argv: format!("cat {}", quoted),
                exit_code: result.exit_code,
                stderr: result.stderr.trim().to_string(),
            })
        }
    }

    async fn delete_file(&self, path: &Path) -> Result<(), HostError> {
        self.checked_script(&format!("rm -f {}", shell_quote(&path.to_string_lossy()))).await?;
        Ok(())
    }

    async fn list_dir(&self, path: &Path) -> Result<Vec<String>, HostError> {
        let out = self
            .checked_script(&format!("ls -A {}", shell_quote(&path.to_string_lossy())))
            .await?;
        Ok(out.stdout.lines().map(str::to_string).filter(|l| !l.is_empty()).collect())
    }

    async fn symlink(&self, target: &Path, link: &Path) -> Result<(), HostError> {
        self.checked_script(&format!(
            "ln -sfn {} {}",
            shell_quote(&target.to_string_lossy()),
            shell_quote(&link.to_string_lossy())
        ))
        .await?;
        Ok(())
    }

    async fn delete_link(&self, link: &Path) -> Result<(), HostError> {
        self.checked_script(&format!("rm -f {}", shell_quote(&link.to_string_lossy()))).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "ssh_tests.rs"]
mod tests;
