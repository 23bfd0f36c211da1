// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gut-vcs: typed operations against the renamed VCS binary.
//!
//! Every repository interaction in the sync engine goes through the
//! [`Vcs`] trait; [`GutVcs`] is the real adapter composing argv vectors
//! for the `gut` binary on a [`Host`](gut_host::Host).

mod error;
mod gut;
mod install;
mod vcs;

pub use error::VcsError;
pub use gut::GutVcs;
pub use install::ensure_built;
pub use vcs::Vcs;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeHub, FakeVcs};
