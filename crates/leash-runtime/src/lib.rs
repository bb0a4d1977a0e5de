// SPDX-License-Identifier: MIT OR Apache-2.0
//! leash-runtime
//!
//! The child side of leash. An executable built on this crate registers its
//! entry points with [`leash_core::entry_point!`] and calls [`main`]; it can
//! then be used as the interpreter of a [`leash_host::LaunchBuilder`].
//!
//! Linking this crate also registers the `leash.AutoExitProgram`
//! [trampoline].
#![warn(missing_docs)]

pub mod auto_exit;
pub mod error;
pub mod invocation;
pub mod trampoline;

pub use error::RuntimeError;
pub use invocation::Invocation;

use leash_core::{entry, shutdown};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the runtime's log filter.
pub const LOG_ENV: &str = "LEASH_LOG";

/// Record the launch context of `invocation` and run its entry point.
pub fn run(invocation: Invocation) -> anyhow::Result<()> {
    let interpreter = std::env::current_exe()?;
    invocation.context(interpreter).record();

    let target = entry::resolve(&invocation.entry_point)
        .ok_or_else(|| RuntimeError::UnknownEntryPoint(invocation.entry_point.clone()))?;
    debug!(target: "leash.runtime", entry = %invocation.entry_point, args = invocation.args.len(), "invoking entry point");
    target.invoke(invocation.args)
}

/// Run the entry point named on this process's command line and return the
/// process exit code.
///
/// Entry points run on the calling thread inside an entered multi-threaded
/// tokio runtime, so they may spawn tasks, start child processes and
/// `block_on` futures through [`tokio::runtime::Handle::current`].
pub fn main() -> ExitCode {
    init_tracing();

    match run_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn run_main() -> anyhow::Result<()> {
    let invocation = Invocation::parse(std::env::args().skip(1))?;
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = {
        let _enter = rt.enter();
        let _guard = shutdown::guard();
        shutdown::spawn_signal_listener();
        run(invocation)
    };
    rt.shutdown_background();
    result
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
