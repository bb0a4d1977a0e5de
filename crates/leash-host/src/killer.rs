// SPDX-License-Identifier: MIT OR Apache-2.0
//! Killing child processes when the parent shuts down.
//!
//! A [`ProcessKiller`] holds weak references to child processes and destroys
//! the ones still reachable when it runs. [`AutoProcessKiller`] registers a
//! killer as a shutdown hook, so children die when this process exits
//! through [`leash_core::shutdown::exit`], a termination signal or the end of
//! `main`. A SIGKILL to the parent runs no hooks; children started with
//! auto-exit enabled notice that on their own.

use crate::process::{ChildProcess, ProcessHandle};
use leash_core::shutdown::{self, HookId, HookRegistry, ShutdownError, ShutdownHook};
use std::ops::Deref;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, warn};

/// Destroys registered child processes when run.
///
/// Only weak references are held: a process whose handles were all dropped
/// is skipped. The killer itself never starts a process.
#[derive(Default)]
pub struct ProcessKiller {
    children: Mutex<Vec<Weak<dyn ChildProcess>>>,
}

impl ProcessKiller {
    /// Create an empty killer.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Weak<dyn ChildProcess>>> {
        self.children.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Track `handle` without keeping it alive.
    ///
    /// Only a weak reference is kept. Hold on to a [`ProcessHandle`] clone
    /// for as long as the child should be killed on shutdown; once every
    /// clone is dropped the child is skipped, even if it is still running.
    pub fn add(&self, handle: &ProcessHandle) {
        self.add_child(handle.downgrade());
    }

    /// Track any child process through a weak reference.
    pub fn add_child(&self, child: Weak<dyn ChildProcess>) {
        let mut children = self.lock();
        children.retain(|c| c.strong_count() > 0);
        children.push(child);
    }

    /// Number of tracked processes whose handles are still alive.
    pub fn len(&self) -> usize {
        self.lock().iter().filter(|c| c.strong_count() > 0).count()
    }

    /// Returns `true` if no live handle is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pids of the tracked processes that still have a live handle.
    pub fn pids(&self) -> Vec<u32> {
        self.lock()
            .iter()
            .filter_map(Weak::upgrade)
            .filter_map(|c| c.pid())
            .collect()
    }

    /// Destroy every tracked process, in the order they were added, and stop
    /// tracking them. Returns how many were reached.
    ///
    /// Failures and panics from one process are logged and do not stop the
    /// others from being destroyed.
    pub fn kill_all(&self) -> usize {
        let children = std::mem::take(&mut *self.lock());
        let mut reached = 0;
        for child in children.iter().filter_map(Weak::upgrade) {
            reached += 1;
            let pid = child.pid();
            match catch_unwind(AssertUnwindSafe(|| child.destroy())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    debug!(target: "leash.killer", pid, error = %e, "failed to destroy child")
                }
                Err(_) => warn!(target: "leash.killer", pid, "destroying child panicked"),
            }
        }
        debug!(target: "leash.killer", reached, "killed child processes");
        reached
    }
}

impl ShutdownHook for ProcessKiller {
    fn run(&self) {
        self.kill_all();
    }

    fn name(&self) -> &str {
        "process-killer"
    }
}

/// A [`ProcessKiller`] that is registered as a shutdown hook on creation.
pub struct AutoProcessKiller {
    killer: Arc<ProcessKiller>,
    hook: HookId,
}

impl AutoProcessKiller {
    /// Create a killer and register it with the process-wide hooks.
    pub fn new() -> Result<Self, ShutdownError> {
        Self::register_with(shutdown::global())
    }

    /// Create a killer and register it with `registry`.
    pub fn register_with(registry: &HookRegistry) -> Result<Self, ShutdownError> {
        let killer = Arc::new(ProcessKiller::new());
        let hook = registry.register(killer.clone())?;
        Ok(Self { killer, hook })
    }

    /// Id of the registered hook.
    ///
    /// Dropping the killer does not unregister the hook; the registry keeps
    /// it until shutdown. Pass this id to [`HookRegistry::remove`] to stop
    /// the killer from running.
    pub fn hook_id(&self) -> HookId {
        self.hook
    }
}

impl Deref for AutoProcessKiller {
    type Target = ProcessKiller;

    fn deref(&self) -> &ProcessKiller {
        &self.killer
    }
}
