// SPDX-License-Identifier: MIT OR Apache-2.0
//! leash-host
//!
//! The parent side of leash: configure a child runtime with a
//! [`LaunchBuilder`], start it as a [`ProcessHandle`], copy its output and
//! make sure it dies with the parent through a [`ProcessKiller`].
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod command;
pub mod copier;
pub mod error;
pub mod killer;
pub mod process;

pub use builder::LaunchBuilder;
pub use command::CommandLine;
pub use error::{HostError, LaunchError};
pub use killer::{AutoProcessKiller, ProcessKiller};
pub use process::{ChildProcess, ProcessHandle, ProcessStatus};
