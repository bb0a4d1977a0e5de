// SPDX-License-Identifier: MIT OR Apache-2.0
//! The runtime's own command line.

use crate::error::RuntimeError;
use leash_core::LaunchContext;
use std::path::PathBuf;

const CLASSPATH_OPTIONS: [&str; 3] = ["-cp", "-classpath", "--class-path"];

/// A parsed `-cp <classpath> [<vm-arg> ...] <entry-point> [<arg> ...]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// Value of the last classpath option, if any.
    pub classpath: Option<String>,
    /// Options before the entry point, other than the classpath.
    pub vm_args: Vec<String>,
    /// Name of the entry point to run.
    pub entry_point: String,
    /// Arguments after the entry point, passed through untouched.
    pub args: Vec<String>,
}

impl Invocation {
    /// Parse the runtime's arguments, program name excluded.
    ///
    /// Options are only recognised before the entry point; everything after
    /// it belongs to the entry point, dashes included.
    pub fn parse<I, S>(argv: I) -> Result<Self, RuntimeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        let mut invocation = Self::default();

        while let Some(token) = argv.next() {
            if CLASSPATH_OPTIONS.contains(&token.as_str()) {
                let value = argv
                    .next()
                    .ok_or_else(|| RuntimeError::MissingOptionValue(token.clone()))?;
                invocation.classpath = Some(value);
            } else if token.starts_with('-') {
                invocation.vm_args.push(token);
            } else {
                invocation.entry_point = token;
                invocation.args = argv.collect();
                return Ok(invocation);
            }
        }
        Err(RuntimeError::MissingEntryPoint)
    }

    /// The launch context this invocation describes, run by `interpreter`.
    ///
    /// Without a classpath option the inherited `LEASH_CLASSPATH` applies.
    pub fn context(&self, interpreter: PathBuf) -> LaunchContext {
        let detected = LaunchContext::detect();
        LaunchContext {
            interpreter,
            classpath: self.classpath.clone().unwrap_or(detected.classpath),
            vm_args: self.vm_args.clone(),
        }
    }
}
