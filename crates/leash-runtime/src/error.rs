// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised by the runtime before an entry point runs.

use thiserror::Error;

/// Errors from parsing the runtime's command line and resolving its entry
/// point.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// No entry point was named.
    #[error("no entry point given")]
    MissingEntryPoint,

    /// The named entry point is not registered in this executable.
    #[error("unknown entry point {0:?}")]
    UnknownEntryPoint(String),

    /// An option that takes a value was the last token.
    #[error("option {0} requires a value")]
    MissingOptionValue(String),
}
