// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The real adapter: argv composition for the renamed VCS binary.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use gut_core::config::{DEFAULT_GUTIGNORE, GUT_DAEMON_PATH, GUT_EXE_PATH, IGNORE_FILE_NAME};
use gut_host::{save_daemon_pid, ExecResult, Host, HostExt};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::VcsError;
use crate::install;
use crate::vcs::Vcs;

/// Stderr marker for a merge blocked by local working-tree edits.
const NEEDS_COMMIT_MARKER: &str = "Your local changes to the following files would be overwritten";

/// Operations against one node's repository via the `gut` binary.
pub struct GutVcs {
    host: Arc<dyn Host>,
    /// Absolute path of the synced directory on the host.
    sync_dir: PathBuf,
    /// Committer identity for this node.
    hostname: String,
    exe: Mutex<Option<PathBuf>>,
    /// Origin URL the sanity gate checks before destructive operations.
    expected_origin: Mutex<Option<String>>,
}

/// Strip scheme and trailing decoration so HTTP/SSH rewrites of the same
/// origin compare equal.
fn normalize_origin_url(url: &str) -> String {
    let url = url.trim();
    let url = url
        .strip_prefix("gut://")
        .or_else(|| url.strip_prefix("http://"))
        .or_else(|| url.strip_prefix("https://"))
        .or_else(|| url.strip_prefix("ssh://"))
        .unwrap_or(url);
    url.trim_end_matches('/').trim_end_matches(".git").to_string()
}

impl GutVcs {
    pub fn new(host: Arc<dyn Host>, sync_dir: PathBuf, hostname: impl Into<String>) -> Self {
        Self {
            host,
            sync_dir,
            hostname: hostname.into(),
            exe: Mutex::new(None),
            expected_origin: Mutex::new(None),
        }
    }

    async fn exe_path(&self) -> Result<PathBuf, VcsError> {
        if let Some(exe) = self.exe.lock().clone() {
            return Ok(exe);
        }
        let exe = self.host.state_path(GUT_EXE_PATH).await?;
        *self.exe.lock() = Some(exe.clone());
        Ok(exe)
    }

    /// Run a gut subcommand in the synced directory, collecting output.
    async fn gut(&self, args: &[&str]) -> Result<ExecResult, VcsError> {
        let exe = self.exe_path().await?;
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(exe.to_string_lossy().into_owned());
        argv.extend(args.iter().map(|a| a.to_string()));
        debug!(host = %self.host.label(), cmd = %args.join(" "), "gut");
        Ok(self.host.run_in(Some(&self.sync_dir), &argv).await?)
    }

    /// Run a gut subcommand and fail on nonzero exit.
    async fn gut_ok(&self, op: &'static str, args: &[&str]) -> Result<ExecResult, VcsError> {
        let result = self.gut(args).await?;
        if result.success() {
            Ok(result)
        } else {
            Err(VcsError::Failed {
                op,
                exit_code: result.exit_code,
                stderr: result.stderr.trim().to_string(),
            })
        }
    }

    async fn head_or_empty(&self) -> Result<String, VcsError> {
        let result = self.gut(&["rev-parse", "HEAD"]).await?;
        if result.success() {
            Ok(result.stdout.trim().to_string())
        } else {
            Ok(String::new())
        }
    }

    /// Gate destructive operations on origin still pointing where this
    /// session wired it.
    async fn check_origin(&self) -> Result<(), VcsError> {
        let Some(expected) = self.expected_origin.lock().clone() else {
            return Ok(());
        };
        let remotes = self.gut_ok("remote", &["remote", "-v"]).await?;
        let expected_norm = normalize_origin_url(&expected);
        let found = remotes
            .stdout
            .split_whitespace()
            .any(|word| normalize_origin_url(word) == expected_norm);
        if found {
            Ok(())
        } else {
            Err(VcsError::OriginMismatch {
                expected,
                actual: remotes.stdout.trim().to_string(),
            })
        }
    }

    fn map_merge_failure(op: &'static str, result: ExecResult) -> VcsError {
        if result.stderr.contains(NEEDS_COMMIT_MARKER) {
            VcsError::NeedsCommit
        } else {
            VcsError::Failed {
                op,
                exit_code: result.exit_code,
                stderr: result.stderr.trim().to_string(),
            }
        }
    }
}

#[async_trait]
impl Vcs for GutVcs {
    async fn ensure_built(&self) -> Result<(), VcsError> {
        install::ensure_built(self.host.as_ref()).await
    }

    async fn init(&self) -> Result<(), VcsError> {
        self.gut_ok("init", &["init"]).await?;
        Ok(())
    }

    async fn ensure_initial_commit(&self) -> Result<(), VcsError> {
        if !self.head_or_empty().await?.is_empty() {
            return Ok(());
        }
        let ignore_path = self.sync_dir.join(IGNORE_FILE_NAME);
        if !self.host.path_exists(&ignore_path).await? {
            self.host.write_file(&ignore_path, DEFAULT_GUTIGNORE.as_bytes()).await?;
        }
        self.gut_ok("add", &["add", "--", IGNORE_FILE_NAME]).await?;
        // Identity inline: the root commit happens before origin wiring
        // configures user.name/user.email.
        let name = format!("user.name={}", self.hostname);
        let email = format!("user.email=gut-sync@{}", self.hostname);
        self.gut_ok(
            "commit",
            &["-c", &name, "-c", &email, "commit", "-m", "Initial commit"],
        )
        .await?;
        Ok(())
    }

    async fn tail_hash(&self) -> Result<Option<String>, VcsError> {
        let repo_dir = self.sync_dir.join(gut_core::config::REPO_DIR_NAME);
        if !self.host.path_exists(&repo_dir).await? {
            return Ok(None);
        }
        let result = self.gut(&["rev-list", "--max-parents=0", "HEAD"]).await?;
        if result.success() {
            let tail = result.stdout.trim().to_string();
            Ok(if tail.is_empty() { None } else { Some(tail) })
        } else if result.stderr.contains("unknown revision")
            || result.stderr.contains("ambiguous argument")
        {
            // Repository exists but has no commits yet.
            Ok(None)
        } else {
            Err(VcsError::Failed {
                op: "rev-list",
                exit_code: result.exit_code,
                stderr: result.stderr.trim().to_string(),
            })
        }
    }

    async fn rev_parse_head(&self) -> Result<String, VcsError> {
        let result = self.gut_ok("rev-parse", &["rev-parse", "HEAD"]).await?;
        Ok(result.stdout.trim().to_string())
    }

    async fn commit(&self, prefix: &str, update_untracked: bool) -> Result<bool, VcsError> {
        let before = self.head_or_empty().await?;
        if update_untracked {
            // Tracked files that became ignored are dropped from the index
            // so the ignore set takes effect retroactively.
            let listed = self
                .gut(&["ls-files", "--cached", "-i", "--exclude-standard"])
                .await?;
            if listed.success() {
                for file in listed.stdout.lines().filter(|l| !l.is_empty()) {
                    let result = self.gut(&["rm", "--cached", "--", file]).await?;
                    if !result.success() {
                        debug!(host = %self.host.label(), file, "rm --cached failed");
                    }
                }
            }
        }
        self.gut_ok("add", &["add", "--all", "--", prefix]).await?;
        let result = self.gut(&["commit", "-m", "autocommit"]).await?;
        if !result.success() {
            let text = format!("{}{}", result.stdout, result.stderr);
            if !text.contains("nothing to commit") && !text.contains("nothing added") {
                return Err(VcsError::Failed {
                    op: "commit",
                    exit_code: result.exit_code,
                    stderr: result.stderr.trim().to_string(),
                });
            }
        }
        let after = self.head_or_empty().await?;
        Ok(!after.is_empty() && before != after)
    }

    async fn push(&self, branch: &str) -> Result<(), VcsError> {
        self.check_origin().await?;
        let refspec = format!("master:{}", branch);
        self.gut_ok("push", &["push", "origin", &refspec]).await?;
        Ok(())
    }

    async fn merge(&self, branch: &str) -> Result<(), VcsError> {
        self.check_origin().await?;
        let result = self
            .gut(&[
                "merge",
                "--strategy=recursive",
                "--strategy-option=theirs",
                "--no-edit",
                branch,
            ])
            .await?;
        if result.success() {
            Ok(())
        } else {
            Err(Self::map_merge_failure("merge", result))
        }
    }

    async fn pull(&self) -> Result<(), VcsError> {
        self.check_origin().await?;
        self.gut_ok("fetch", &["fetch", "origin"]).await?;
        let result = self
            .gut(&[
                "merge",
                "--strategy=recursive",
                "--strategy-option=theirs",
                "--no-edit",
                "origin/master",
            ])
            .await?;
        if result.success() {
            Ok(())
        } else {
            Err(Self::map_merge_failure("pull", result))
        }
    }

    async fn checkout_as_master(&self, branch: &str) -> Result<(), VcsError> {
        self.check_origin().await?;
        self.gut_ok("checkout", &["checkout", "-B", "master", branch]).await?;
        Ok(())
    }

    async fn start_daemon(&self, repo_name: &str, port: u16) -> Result<(), VcsError> {
        let daemon_root = self.host.state_path(GUT_DAEMON_PATH).await?;
        self.host.mkdirp(&daemon_root).await?;
        let link = daemon_root.join(repo_name);
        self.host.delete_link(&link).await?;
        self.host.symlink(&self.sync_dir, &link).await?;

        let exe = self.exe_path().await?;
        let base_path = daemon_root.to_string_lossy().into_owned();
        let argv = vec![
            exe.to_string_lossy().into_owned(),
            "daemon".to_string(),
            "--export-all".to_string(),
            format!("--base-path={}", base_path),
            "--reuseaddr".to_string(),
            "--listen=127.0.0.1".to_string(),
            format!("--port={}", port),
            "--enable=receive-pack".to_string(),
        ];
        let handle = self
            .host
            .spawn_daemon("gut-daemon", Some(&self.sync_dir), &argv, None)
            .await?;
        save_daemon_pid(self.host.as_ref(), &format!("gut-daemon-{}", repo_name), handle.pid)
            .await?;
        info!(host = %self.host.label(), port, repo = repo_name, pid = handle.pid, "repository daemon started");
        Ok(())
    }

    async fn setup_origin(&self, repo_name: &str, port: u16) -> Result<(), VcsError> {
        let url = format!("gut://localhost:{}/{}/", port, repo_name);
        // A leftover origin from a previous session is expected.
        let _ = self.gut(&["remote", "rm", "origin"]).await?;
        self.gut_ok("remote", &["remote", "add", "origin", &url]).await?;
        self.gut_ok("config", &["config", "color.ui", "always"]).await?;
        self.gut_ok("config", &["config", "user.name", &self.hostname]).await?;
        let email = format!("gut-sync@{}", self.hostname);
        self.gut_ok("config", &["config", "user.email", &email]).await?;
        *self.expected_origin.lock() = Some(url);
        Ok(())
    }
}

#[cfg(test)]
#[path = "gut_tests.rs"]
mod tests;
