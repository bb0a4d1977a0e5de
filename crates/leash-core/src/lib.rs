// SPDX-License-Identifier: MIT OR Apache-2.0
//! leash-core
//!
//! Shared plumbing for leash parents and children: the link-time
//! [entry-point registry](entry), the current process's
//! [launch context](context), and process-wide [shutdown hooks](shutdown).
#![warn(missing_docs)]

pub mod context;
pub mod entry;
pub mod shutdown;

pub use context::{LaunchContext, PATH_LIST_SEPARATOR};
pub use entry::{AUTO_EXIT_PROGRAM, EntryError, EntryPoint, MainFn, Program};
pub use shutdown::{HookId, HookRegistry, ShutdownError, ShutdownGuard, ShutdownHook};

#[doc(hidden)]
pub use inventory;
