// SPDX-License-Identifier: MIT OR Apache-2.0
//! The current process's own launch configuration.
//!
//! A process started by the leash runtime records the interpreter, classpath
//! and VM arguments it was started with. Launch builders created inside that
//! process copy these as their defaults, so children inherit the parent's
//! setup unless told otherwise.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Environment variable consulted for the classpath of a process that was not
/// started by the runtime.
pub const CLASSPATH_ENV: &str = "LEASH_CLASSPATH";

/// Separator between classpath elements.
#[cfg(windows)]
pub const PATH_LIST_SEPARATOR: char = ';';
/// Separator between classpath elements.
#[cfg(not(windows))]
pub const PATH_LIST_SEPARATOR: char = ':';

static RECORDED: OnceLock<LaunchContext> = OnceLock::new();

/// Interpreter, classpath and VM arguments of a runtime process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchContext {
    /// Executable that runs entry points.
    pub interpreter: PathBuf,
    /// Classpath handed to the interpreter with `-cp`.
    pub classpath: String,
    /// Interpreter options placed between the classpath and the entry point.
    pub vm_args: Vec<String>,
}

impl LaunchContext {
    /// The recorded context of this process, or one detected from the
    /// environment if the runtime never recorded one.
    pub fn current() -> Self {
        RECORDED.get().cloned().unwrap_or_else(Self::detect)
    }

    /// Build a context from the environment: the current executable, the
    /// `LEASH_CLASSPATH` variable and no VM arguments.
    pub fn detect() -> Self {
        let interpreter = std::env::current_exe()
            .ok()
            .or_else(|| std::env::args_os().next().map(PathBuf::from))
            .unwrap_or_default();
        Self {
            interpreter,
            classpath: std::env::var(CLASSPATH_ENV).unwrap_or_default(),
            vm_args: Vec::new(),
        }
    }

    /// Record this context as the current process's own.
    ///
    /// Only the first call wins; returns `false` if a context was already
    /// recorded.
    pub fn record(self) -> bool {
        RECORDED.set(self).is_ok()
    }

    /// `-Dkey=value` VM arguments as a map. Later definitions win.
    pub fn properties(&self) -> BTreeMap<String, String> {
        self.vm_args
            .iter()
            .filter_map(|arg| arg.strip_prefix("-D"))
            .filter(|def| !def.is_empty())
            .map(|def| match def.split_once('=') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (def.to_string(), String::new()),
            })
            .collect()
    }

    /// Look up a single `-D` property.
    pub fn property(&self, key: &str) -> Option<String> {
        self.properties().remove(key)
    }
}

/// Append `element` to `classpath`, replacing it if it is empty.
pub fn join_classpath(classpath: &str, element: &str) -> String {
    if classpath.is_empty() {
        element.to_string()
    } else {
        format!("{classpath}{PATH_LIST_SEPARATOR}{element}")
    }
}
