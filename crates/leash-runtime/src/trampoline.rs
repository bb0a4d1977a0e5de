// SPDX-License-Identifier: MIT OR Apache-2.0
//! The `leash.AutoExitProgram` entry point.
//!
//! Launch builders with auto-exit enabled put this entry point in front of
//! the real one. It installs the [auto-exit probe](crate::auto_exit) and then
//! runs the entry point named by its first argument with the rest.

use crate::auto_exit;
use crate::error::RuntimeError;
use leash_core::{AUTO_EXIT_PROGRAM, entry, entry_point};
use std::io;
use tracing::debug;

/// Install the probe, then run `args[0]` with `args[1..]`.
pub fn main(args: Vec<String>) -> anyhow::Result<()> {
    run_with(args, || auto_exit::install().map(drop))
}

/// Like [`main`], with the probe installation supplied by the caller.
///
/// The probe is installed before the arguments are looked at. Errors from
/// the target entry point are returned as they are, so callers can downcast
/// them.
pub fn run_with<F>(args: Vec<String>, install: F) -> anyhow::Result<()>
where
    F: FnOnce() -> io::Result<()>,
{
    install()?;

    let mut args = args.into_iter();
    let name = args.next().ok_or(RuntimeError::MissingEntryPoint)?;
    let target =
        entry::resolve(&name).ok_or_else(|| RuntimeError::UnknownEntryPoint(name.clone()))?;
    debug!(target: "leash.runtime", entry = %name, "trampolining");
    target.invoke(args.collect())
}

entry_point!(AUTO_EXIT_PROGRAM, main);
