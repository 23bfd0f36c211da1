// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The repository operation contract the sync engine is written against.

use async_trait::async_trait;

use crate::error::VcsError;

/// Typed repository operations for one node's synced directory.
///
/// One instance per node; the adapter knows the node's host and directory.
/// All methods run against the synced directory as the working directory.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Verify the renamed VCS binary is installed and the right version.
    async fn ensure_built(&self) -> Result<(), VcsError>;

    /// Create an empty repository in the synced directory.
    async fn init(&self) -> Result<(), VcsError>;

    /// Commit the default ignore file as the root commit if the repository
    /// has no commits yet.
    async fn ensure_initial_commit(&self) -> Result<(), VcsError>;

    /// Hash of the repository's parent-less root commit; `None` when no
    /// repository exists. Two nodes may only sync when their tail hashes
    /// are equal.
    async fn tail_hash(&self) -> Result<Option<String>, VcsError>;

    async fn rev_parse_head(&self) -> Result<String, VcsError>;

    /// Stage everything under `prefix` and commit. With `update_untracked`,
    /// first drop tracked-but-ignored files from the index. Returns whether
    /// HEAD moved.
    async fn commit(&self, prefix: &str, update_untracked: bool) -> Result<bool, VcsError>;

    /// Push this node's `master` to the given branch on origin.
    async fn push(&self, branch: &str) -> Result<(), VcsError>;

    /// Merge the given branch into the current branch, taking the incoming
    /// side on conflicts. `NeedsCommit` when local edits block the merge.
    async fn merge(&self, branch: &str) -> Result<(), VcsError>;

    /// Fetch origin and merge `origin/master`, taking the incoming side on
    /// conflicts. `NeedsCommit` when local edits block the merge.
    async fn pull(&self) -> Result<(), VcsError>;

    /// Make `master` point at the given branch and check it out.
    async fn checkout_as_master(&self, branch: &str) -> Result<(), VcsError>;

    /// Launch the repository daemon exporting this directory as
    /// `<daemon-root>/<repo_name>` on `127.0.0.1:<port>`, receive-pack
    /// enabled.
    async fn start_daemon(&self, repo_name: &str, port: u16) -> Result<(), VcsError>;

    /// Point `origin` at `gut://localhost:<port>/<repo_name>/` and set the
    /// node's committer identity.
    async fn setup_origin(&self, repo_name: &str, port: u16) -> Result<(), VcsError>;
}
