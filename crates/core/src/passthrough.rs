// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Detection of plain VCS subcommands for the passthrough shim.

/// Every executable name shipped in the renamed VCS's libexec core,
/// plus `version` as an alias for `--version`.
pub const ALL_GUT_COMMANDS: &[&str] = &[
    "add",
    "am",
    "annotate",
    "apply",
    "archimport",
    "archive",
    "bisect",
    "blame",
    "branch",
    "bundle",
    "cat-file",
    "check-attr",
    "check-ignore",
    "check-mailmap",
    "checkout",
    "checkout-index",
    "check-ref-format",
    "cherry",
    "cherry-pick",
    "citool",
    "clean",
    "clone",
    "column",
    "commit",
    "commit-tree",
    "config",
    "count-objects",
    "credential",
    "credential-cache",
    "credential-store",
    "cvsexportcommit",
    "cvsimport",
    "cvsserver",
    "daemon",
    "describe",
    "diff",
    "diff-files",
    "diff-index",
    "difftool",
    "diff-tree",
    "fast-export",
    "fast-import",
    "fetch",
    "fetch-pack",
    "filter-branch",
    "fmt-merge-msg",
    "for-each-ref",
    "format-patch",
    "fsck",
    "fsck-objects",
    "gc",
    "get-tar-commit-id",
    "grep",
    "gui",
    "hash-object",
    "help",
    "http-backend",
    "imap-send",
    "index-pack",
    "init",
    "init-db",
    "instaweb",
    "interpret-trailers",
    "log",
    "ls-files",
    "ls-remote",
    "ls-tree",
    "mailinfo",
    "mailsplit",
    "merge",
    "merge-base",
    "merge-file",
    "merge-index",
    "merge-octopus",
    "merge-one-file",
    "merge-ours",
    "merge-recursive",
    "merge-resolve",
    "merge-subtree",
    "mergetool",
    "merge-tree",
    "mktag",
    "mktree",
    "mv",
    "name-rev",
    "notes",
    "p4",
    "pack-objects",
    "pack-redundant",
    "pack-refs",
    "parse-remote",
    "patch-id",
    "prune",
    "prune-packed",
    "pull",
    "push",
    "quiltimport",
    "read-tree",
    "rebase",
    "receive-pack",
    "reflog",
    "relink",
    "remote",
    "remote-ext",
    "remote-fd",
    "remote-testsvn",
    "repack",
    "replace",
    "request-pull",
    "rerere",
    "reset",
    "revert",
    "rev-list",
    "rev-parse",
    "rm",
    "send-email",
    "send-pack",
    "shell",
    "sh-i18n",
    "shortlog",
    "show",
    "show-branch",
    "show-index",
    "show-ref",
    "sh-setup",
    "stage",
    "stash",
    "status",
    "stripspace",
    "submodule",
    "svn",
    "symbolic-ref",
    "tag",
    "unpack-file",
    "unpack-objects",
    "update-index",
    "update-ref",
    "update-server-info",
    "upload-archive",
    "upload-pack",
    "var",
    "verify-commit",
    "verify-pack",
    "verify-tag",
    "version",
    "whatchanged",
    "write-tree",
];

/// True when `cmd` should be re-execed against the renamed VCS binary
/// instead of handled by the sync CLI.
pub fn is_vcs_subcommand(cmd: &str) -> bool {
    ALL_GUT_COMMANDS.contains(&cmd)
}
