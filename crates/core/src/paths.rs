// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path batching helpers for the commit pipeline.

use crate::config::HASH_DISPLAY_CHARS;

/// Longest prefix shared by every input path.
///
/// The prefix is only ever shortened at `/` boundaries (apart from an exact
/// common string), so `/hello/bob` and `/hello/sally` share `/hello/`, not
/// `/hello/` plus a partial component. Inputs that disagree at the root
/// share `""`.
pub fn common_path_prefix<S: AsRef<str>>(paths: &[S]) -> String {
    let Some(first) = paths.first() else {
        return String::new();
    };
    let mut common = first.as_ref().to_string();
    for path in &paths[1..] {
        let path = path.as_ref();
        while path.len() < common.len() || !path.starts_with(common.as_str()) {
            if common.ends_with('/') {
                common.pop();
            } else {
                match common.rfind('/') {
                    Some(idx) => common.truncate(idx + 1),
                    None => return String::new(),
                }
            }
        }
    }
    common
}

/// Directory prefix handed to `add --all` for a batch of changed paths.
///
/// The VCS complains when asked to add individual ignored files, so the
/// target is always the last whole folder: everything after the final `/`
/// is lopped off, and `"."` stands in when nothing is left.
pub fn commit_prefix<S: AsRef<str>>(paths: &[S]) -> String {
    let mut prefix = common_path_prefix(paths);
    if !prefix.is_empty() {
        match prefix.rfind('/') {
            Some(idx) => prefix.truncate(idx + 1),
            None => prefix.clear(),
        }
    }
    if prefix.is_empty() {
        ".".to_string()
    } else {
        prefix
    }
}

/// Trim a commit hash for display.
pub fn trim_commit(commit: &str) -> &str {
    if commit.len() > HASH_DISPLAY_CHARS {
        &commit[..HASH_DISPLAY_CHARS]
    } else {
        commit
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
