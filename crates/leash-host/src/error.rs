// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for launching and supervising child processes.

use thiserror::Error;

/// Errors raised while configuring or starting a child process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The entry point cannot be started in a child runtime.
    #[error("invalid entry point {name:?}: {reason}")]
    InvalidEntryPoint {
        /// Name that was rejected.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The operating system refused to start the process.
    #[error("failed to start process: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Errors from operations on a running or exited child.
#[derive(Debug, Error)]
pub enum HostError {
    /// Waiting for the child failed.
    #[error("failed to wait for process: {0}")]
    Wait(#[source] std::io::Error),

    /// Sending the kill signal failed.
    #[error("failed to destroy process: {0}")]
    Destroy(#[source] std::io::Error),

    /// Copying one of the child's streams failed.
    #[error("failed to copy stream: {0}")]
    Copy(#[source] std::io::Error),
}
