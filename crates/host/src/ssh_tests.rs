// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    plain      = { "file.txt", "file.txt" },
    path       = { "/srv/a-b/c.d", "/srv/a-b/c.d" },
    tilde      = { "~/work", "~/work" },
    space      = { "a b", "'a b'" },
    dollar     = { "$HOME", "'$HOME'" },
    quote      = { "it's", r"'it'\''s'" },
    empty      = { "", "''" },
)]
fn shell_quote_cases(input: &str, expected: &str) {
    assert_eq!(shell_quote(input), expected);
}

#[test]
fn shell_join_quotes_each_argument() {
    let argv = vec!["echo".to_string(), "two words".to_string()];
    assert_eq!(shell_join(&argv), "echo 'two words'");
}

#[test]
fn script_for_prepends_cwd() {
    let argv = vec!["ls".to_string()];
    assert_eq!(
        SshHost::script_for(Some(Path::new("/srv/my dir")), &argv),
        "cd '/srv/my dir' && ls"
    );
    assert_eq!(SshHost::script_for(None, &argv), "ls");
}

#[test]
fn label_strips_username() {
    assert_eq!(SshHost::new("bob@example.com", None).label(), "example.com");
    assert_eq!(SshHost::new("example.com", None).label(), "example.com");
}

#[test]
fn disconnected_host_reports_not_connected() {
    let host = SshHost::new("example.com", None);
    assert!(!host.is_connected());
    assert!(!host.is_darwin());
    assert!(!host.is_linux());
}
