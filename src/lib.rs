// SPDX-License-Identifier: MIT OR Apache-2.0
//! leash
//!
//! Launch child runtime processes and make sure they never outlive their
//! parent. This crate re-exports the workspace crates under one name.
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub use leash_config as config;
pub use leash_core::{context, entry, shutdown};
pub use leash_host as host;
pub use leash_runtime as runtime;

pub use leash_core::{AUTO_EXIT_PROGRAM, Program, entry_point};
pub use leash_host::{AutoProcessKiller, LaunchBuilder, ProcessHandle, ProcessKiller};
