// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Real command execution for the zsnap daemon
//!
//! The core crate only builds structured commands; this crate runs them,
//! locally via `tokio::process` and remotely through `ssh`.

pub mod shell;
pub mod traced;

pub use shell::ShellRunner;
pub use traced::TracedRunner;
