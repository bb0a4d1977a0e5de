// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link-time registry of named entry points.
//!
//! An executable built on leash registers the programs it can run with
//! [`entry_point!`](crate::entry_point). The runtime resolves the name it was
//! started with against this table; nothing is loaded dynamically.

use thiserror::Error;

/// Name of the trampoline entry point that installs the auto-exit probe
/// before handing off to the real entry point.
pub const AUTO_EXIT_PROGRAM: &str = "leash.AutoExitProgram";

/// Signature shared by every entry point.
pub type MainFn = fn(Vec<String>) -> anyhow::Result<()>;

/// A program that can be started by name in a child runtime.
///
/// Implementing this trait is the typed way to name an entry point: the
/// signature is fixed by the trait, so the only thing left to check at
/// launch-configuration time is that the name is registered.
pub trait Program {
    /// Fully-qualified name used on the command line.
    const NAME: &'static str;

    /// Run the program with its command-line arguments.
    fn main(args: Vec<String>) -> anyhow::Result<()>;
}

/// A registered entry point: a name and the function it dispatches to.
#[derive(Debug, Clone, Copy)]
pub struct EntryPoint {
    name: &'static str,
    main: MainFn,
}

impl EntryPoint {
    /// Create an entry point from a name and a main function.
    pub const fn new(name: &'static str, main: MainFn) -> Self {
        Self { name, main }
    }

    /// Create the entry point for a [`Program`] type.
    pub const fn of<P: Program>() -> Self {
        Self::new(P::NAME, P::main)
    }

    /// Fully-qualified name of this entry point.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Call the entry point. Its error is returned untouched.
    pub fn invoke(&self, args: Vec<String>) -> anyhow::Result<()> {
        (self.main)(args)
    }
}

inventory::collect!(EntryPoint);

/// Errors for malformed entry-point names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntryError {
    /// The name cannot appear as an entry point on a command line.
    #[error("invalid entry point name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Check that `name` can stand in the entry-point position of a command line.
pub fn validate_name(name: &str) -> Result<(), EntryError> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.starts_with('-') {
        "name starts with '-' and would be read as a runtime option"
    } else if name.chars().any(char::is_whitespace) {
        "name contains whitespace"
    } else {
        return Ok(());
    };
    Err(EntryError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

/// Look up a registered entry point by its fully-qualified name.
pub fn resolve(name: &str) -> Option<&'static EntryPoint> {
    inventory::iter::<EntryPoint>
        .into_iter()
        .find(|entry| entry.name == name)
}

/// Names of every entry point registered in this executable, sorted.
pub fn registered() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = inventory::iter::<EntryPoint>
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    names.sort_unstable();
    names.dedup();
    names
}

/// Register an entry point in the current executable.
///
/// ```ignore
/// struct Greeter;
///
/// impl leash_core::Program for Greeter {
///     const NAME: &'static str = "demo.Greeter";
///     fn main(args: Vec<String>) -> anyhow::Result<()> {
///         println!("Hello, {}!", args.first().map_or("world", String::as_str));
///         Ok(())
///     }
/// }
///
/// leash_core::entry_point!(Greeter);
/// leash_core::entry_point!("demo.Other", other_main);
/// ```
#[macro_export]
macro_rules! entry_point {
    ($program:ty) => {
        $crate::inventory::submit! {
            $crate::entry::EntryPoint::of::<$program>()
        }
    };
    ($name:expr, $main:path) => {
        $crate::inventory::submit! {
            $crate::entry::EntryPoint::new($name, $main)
        }
    };
}
