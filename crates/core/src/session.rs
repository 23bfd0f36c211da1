// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session identifiers.

const REPO_NAME_ALPHABET: [char; 26] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r',
    's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Random 8-character lowercase name identifying one sync session.
///
/// Used as the daemon's export path so concurrent sessions on one machine
/// do not collide.
pub fn random_repo_name() -> String {
    nanoid::nanoid!(8, &REPO_NAME_ALPHABET)
}
