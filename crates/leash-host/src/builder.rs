// SPDX-License-Identifier: MIT OR Apache-2.0
//! Launch configuration for child runtime processes.
//!
//! A [`LaunchBuilder`] turns an entry point plus interpreter settings into a
//! [`CommandLine`] of the shape
//!
//! ```text
//! <interpreter> -cp <classpath> [<vm-arg> ...] [leash.AutoExitProgram] <entry-point> [<arg> ...]
//! ```
//!
//! Interpreter, classpath and VM arguments default to those of the current
//! process, captured when the builder is created.

use crate::command::CommandLine;
use crate::error::LaunchError;
use crate::process::ProcessHandle;
use leash_core::context::join_classpath;
use leash_core::entry::{self, EntryError};
use leash_core::{AUTO_EXIT_PROGRAM, LaunchContext, Program};
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Builds command lines and processes for a child runtime.
///
/// The builder is a plain value: every [`command`](Self::command),
/// [`create`](Self::create) or [`start`](Self::start) call snapshots its
/// current state, and later changes to the builder do not reach commands
/// that were already built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchBuilder {
    entry_point: String,
    args: Vec<String>,
    interpreter: PathBuf,
    classpath: String,
    vm_args: Vec<String>,
    auto_exit: bool,
    current_dir: Option<PathBuf>,
}

impl LaunchBuilder {
    /// Builder for the [`Program`] `P`.
    ///
    /// Fails with [`LaunchError::InvalidEntryPoint`] unless `P` is registered
    /// in the current executable.
    pub fn new<P: Program>() -> Result<Self, LaunchError> {
        Self::for_registered(P::NAME)
    }

    /// Builder for an entry point looked up by name in the current
    /// executable's registry.
    pub fn for_registered(name: &str) -> Result<Self, LaunchError> {
        entry::validate_name(name).map_err(|e| match e {
            EntryError::InvalidName { name, reason } => LaunchError::InvalidEntryPoint {
                name,
                reason: reason.to_string(),
            },
        })?;
        if entry::resolve(name).is_none() {
            return Err(LaunchError::InvalidEntryPoint {
                name: name.to_string(),
                reason: "no entry point with this name is registered in this executable".into(),
            });
        }
        Ok(Self::for_name(name))
    }

    /// Builder for an entry point given only by name.
    ///
    /// The name is not checked. Use this for entry points that live in a
    /// different executable than the current one.
    pub fn for_name(name: impl Into<String>) -> Self {
        let context = LaunchContext::current();
        Self {
            entry_point: name.into(),
            args: Vec::new(),
            interpreter: context.interpreter,
            classpath: context.classpath,
            vm_args: context.vm_args,
            auto_exit: false,
            current_dir: None,
        }
    }

    /// Replace interpreter, classpath and VM arguments with those of `context`.
    pub fn context(&mut self, context: &LaunchContext) -> &mut Self {
        self.interpreter = context.interpreter.clone();
        self.classpath = context.classpath.clone();
        self.vm_args = context.vm_args.clone();
        self
    }

    /// Set the interpreter executable.
    pub fn interpreter(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.interpreter = path.into();
        self
    }

    /// Set the classpath.
    pub fn classpath(&mut self, classpath: impl Into<String>) -> &mut Self {
        self.classpath = classpath.into();
        self
    }

    /// Append an element to the classpath.
    pub fn add_classpath(&mut self, element: &str) -> &mut Self {
        self.classpath = join_classpath(&self.classpath, element);
        self
    }

    /// Replace the VM arguments.
    pub fn vm_args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vm_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Append VM arguments, keeping their order.
    pub fn add_vm_args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vm_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Start the child through the auto-exit trampoline, so it terminates
    /// when this process goes away.
    pub fn auto_exit(&mut self, enabled: bool) -> &mut Self {
        self.auto_exit = enabled;
        self
    }

    /// Append one argument for the entry point.
    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    /// Append arguments for the entry point.
    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Mutable access to the entry point's arguments.
    pub fn args_mut(&mut self) -> &mut Vec<String> {
        &mut self.args
    }

    /// Working directory for started processes.
    pub fn current_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Entry point the child will run.
    pub fn get_entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Arguments for the entry point.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Interpreter executable.
    pub fn get_interpreter(&self) -> &Path {
        &self.interpreter
    }

    /// Classpath passed with `-cp`.
    pub fn get_classpath(&self) -> &str {
        &self.classpath
    }

    /// VM arguments.
    pub fn get_vm_args(&self) -> &[String] {
        &self.vm_args
    }

    /// Whether the auto-exit trampoline is used.
    pub fn get_auto_exit(&self) -> bool {
        self.auto_exit
    }

    /// Working directory, if one was set.
    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// The command line for the current configuration.
    pub fn command(&self) -> CommandLine {
        let mut tokens = Vec::with_capacity(5 + self.vm_args.len() + self.args.len());
        tokens.push(self.interpreter.to_string_lossy().into_owned());
        tokens.push("-cp".to_string());
        tokens.push(self.classpath.clone());
        tokens.extend(self.vm_args.iter().cloned());
        if self.auto_exit {
            tokens.push(AUTO_EXIT_PROGRAM.to_string());
        }
        tokens.push(self.entry_point.clone());
        tokens.extend(self.args.iter().cloned());
        CommandLine::new(tokens)
    }

    /// A tokio command for the current configuration, with stdin, stdout and
    /// stderr piped.
    ///
    /// The piped stdin is what the auto-exit probe in the child watches; do
    /// not replace it with a null or inherited stream when
    /// [`auto_exit`](Self::auto_exit) is enabled.
    pub fn create(&self) -> tokio::process::Command {
        let mut cmd = self.command().to_command();
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// [`create`](Self::create) a command and start it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<ProcessHandle, LaunchError> {
        ProcessHandle::spawn(&mut self.create())
    }
}
