// SPDX-License-Identifier: MIT OR Apache-2.0
//! Self-termination when the parent process goes away.
//!
//! A parent that starts a child with auto-exit keeps the write end of the
//! child's stdin open for as long as it lives, and writes nothing to it. The
//! operating system closes that pipe however the parent ends, SIGKILL
//! included, so a blocked read on stdin returning end-of-stream means the
//! parent is gone.
//!
//! Stdin must not be used for anything else in a process with the probe
//! installed.

use leash_core::shutdown;
use std::io::{self, Read};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Why the probe stopped watching.
#[derive(Debug)]
pub enum Disconnect {
    /// The stream was closed.
    EndOfStream,
    /// Reading failed; treated like a closed stream.
    ReadError(io::Error),
}

/// Block on `reader` until it is closed or fails.
///
/// Data read from it is logged and discarded.
pub fn watch<R: Read>(mut reader: R) -> Disconnect {
    let mut buf = [0u8; 512];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Disconnect::EndOfStream,
            Ok(n) => warn!(
                target: "leash.auto_exit",
                bytes = n,
                "stdin returned data; it must not be used while auto-exit is installed"
            ),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Disconnect::ReadError(e),
        }
    }
}

/// Install the probe on this process's stdin.
///
/// When the parent disappears the process exits with status 0 through
/// [`shutdown::exit`], so its own shutdown hooks still run. Every call starts
/// another probe thread.
pub fn install() -> io::Result<JoinHandle<()>> {
    install_with(io::stdin(), |disconnect| {
        match disconnect {
            Disconnect::EndOfStream => {
                info!(target: "leash.auto_exit", "parent process gone; exiting")
            }
            Disconnect::ReadError(e) => {
                info!(target: "leash.auto_exit", error = %e, "stdin failed; exiting")
            }
        }
        shutdown::exit(0)
    })
}

/// Watch `reader` on a new thread and call `on_disconnect` once it closes or
/// fails.
///
/// The thread is detached; dropping the returned handle does not stop it and
/// it never keeps the process alive on its own.
pub fn install_with<R, F>(reader: R, on_disconnect: F) -> io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
    F: FnOnce(Disconnect) + Send + 'static,
{
    let handle = thread::Builder::new()
        .name("leash-auto-exit".into())
        .spawn(move || on_disconnect(watch(reader)))?;
    debug!(target: "leash.auto_exit", "auto-exit probe installed");
    Ok(handle)
}
