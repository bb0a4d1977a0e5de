// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process-wide shutdown hooks.
//!
//! Hooks are registered with a [`HookRegistry`] and run at most once, each on
//! its own thread, when the registry is run. The process-wide registry is run
//! by [`exit`], by dropping the [`ShutdownGuard`] returned from [`guard`] at
//! the end of `main`, and by the listener from [`spawn_signal_listener`] on
//! SIGINT or SIGTERM.
//!
//! A process killed with SIGKILL runs no hooks at all. Hooks must not call
//! [`exit`] themselves; that would wait on the run already in progress.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Once, PoisonError};
use std::thread;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A callback run while the process shuts down.
pub trait ShutdownHook: Send + Sync {
    /// Do the cleanup work.
    fn run(&self);

    /// Name used in diagnostics.
    fn name(&self) -> &str {
        "shutdown-hook"
    }
}

/// Adapter turning a closure into a [`ShutdownHook`].
pub struct FnHook<F> {
    name: String,
    f: F,
}

impl<F> ShutdownHook for FnHook<F>
where
    F: Fn() + Send + Sync,
{
    fn run(&self) {
        (self.f)()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wrap a closure as a shareable shutdown hook.
pub fn hook_fn<F>(name: impl Into<String>, f: F) -> Arc<dyn ShutdownHook>
where
    F: Fn() + Send + Sync + 'static,
{
    Arc::new(FnHook {
        name: name.into(),
        f,
    })
}

/// Handle for a registered hook, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HookId(u64);

/// Errors from hook registration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShutdownError {
    /// Hooks are already running; no new ones are accepted.
    #[error("shutdown already in progress")]
    ShutdownInProgress,
}

struct State {
    hooks: Vec<(HookId, Arc<dyn ShutdownHook>)>,
    running: bool,
}

/// A set of shutdown hooks with a register / remove / run-once lifecycle.
pub struct HookRegistry {
    state: Mutex<State>,
    next_id: AtomicU64,
    once: Once,
}

impl HookRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(State {
                hooks: Vec::new(),
                running: false,
            }),
            next_id: AtomicU64::new(1),
            once: Once::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a hook. Fails once the registry has started running.
    pub fn register(&self, hook: Arc<dyn ShutdownHook>) -> Result<HookId, ShutdownError> {
        let mut state = self.lock();
        if state.running {
            return Err(ShutdownError::ShutdownInProgress);
        }
        let id = HookId(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(target: "leash.shutdown", hook = hook.name(), id = id.0, "registered shutdown hook");
        state.hooks.push((id, hook));
        Ok(id)
    }

    /// Remove a hook that has not run yet. Returns `false` if it is unknown
    /// or the registry is already running.
    pub fn remove(&self, id: HookId) -> bool {
        let mut state = self.lock();
        if state.running {
            return false;
        }
        let before = state.hooks.len();
        state.hooks.retain(|(hook_id, _)| *hook_id != id);
        state.hooks.len() != before
    }

    /// Number of hooks waiting to run.
    pub fn len(&self) -> usize {
        self.lock().hooks.len()
    }

    /// Returns `true` if no hooks are waiting to run.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` once [`run`](Self::run) has been called.
    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// Run every registered hook exactly once.
    ///
    /// Hooks run concurrently, one thread each, in no particular order. A
    /// panicking hook does not affect the others. Later calls return
    /// immediately; concurrent calls wait for the first to finish.
    pub fn run(&self) {
        self.once.call_once(|| {
            let hooks = {
                let mut state = self.lock();
                state.running = true;
                std::mem::take(&mut state.hooks)
            };
            debug!(target: "leash.shutdown", count = hooks.len(), "running shutdown hooks");

            let mut pending = Vec::with_capacity(hooks.len());
            for (id, hook) in hooks {
                let worker = Arc::clone(&hook);
                let spawned = thread::Builder::new()
                    .name(format!("leash-shutdown-{}", id.0))
                    .spawn(move || worker.run());
                match spawned {
                    Ok(handle) => pending.push((hook, handle)),
                    Err(e) => {
                        warn!(target: "leash.shutdown", hook = hook.name(), error = %e, "running hook inline");
                        if catch_unwind(AssertUnwindSafe(|| hook.run())).is_err() {
                            warn!(target: "leash.shutdown", hook = hook.name(), "shutdown hook panicked");
                        }
                    }
                }
            }

            for (hook, handle) in pending {
                if handle.join().is_err() {
                    warn!(target: "leash.shutdown", hook = hook.name(), "shutdown hook panicked");
                }
            }
        });
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: HookRegistry = HookRegistry::new();

/// The process-wide registry.
pub fn global() -> &'static HookRegistry {
    &GLOBAL
}

/// Register a hook with the process-wide registry.
pub fn register(hook: Arc<dyn ShutdownHook>) -> Result<HookId, ShutdownError> {
    GLOBAL.register(hook)
}

/// Remove a hook from the process-wide registry.
pub fn remove(id: HookId) -> bool {
    GLOBAL.remove(id)
}

/// Run the process-wide hooks (once).
pub fn run_hooks() {
    GLOBAL.run();
}

/// Run the process-wide hooks, then terminate the process with `code`.
pub fn exit(code: i32) -> ! {
    info!(target: "leash.shutdown", code, "exiting");
    run_hooks();
    std::process::exit(code)
}

/// Runs the process-wide hooks when dropped.
#[must_use = "hooks run when the guard is dropped"]
#[derive(Debug)]
pub struct ShutdownGuard {
    _priv: (),
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        run_hooks();
    }
}

/// Create a guard that runs the process-wide hooks when `main` returns.
pub fn guard() -> ShutdownGuard {
    ShutdownGuard { _priv: () }
}

/// Spawn a task that exits through [`exit`] on SIGINT (status 130) or
/// SIGTERM (status 143).
///
/// Must be called from within a tokio runtime.
pub fn spawn_signal_listener() -> tokio::task::JoinHandle<()> {
    tokio::spawn(async {
        let code = wait_for_signal().await;
        info!(target: "leash.shutdown", code, "termination signal received");
        exit(code);
    })
}

#[cfg(unix)]
async fn wait_for_signal() -> i32 {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(target: "leash.shutdown", error = %e, "cannot listen for SIGTERM");
            return wait_for_ctrl_c().await;
        }
    };
    tokio::select! {
        code = wait_for_ctrl_c() => code,
        _ = terminate.recv() => 143,
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> i32 {
    wait_for_ctrl_c().await
}

async fn wait_for_ctrl_c() -> i32 {
    match tokio::signal::ctrl_c().await {
        Ok(()) => 130,
        Err(e) => {
            warn!(target: "leash.shutdown", error = %e, "cannot listen for ctrl-c");
            std::future::pending::<i32>().await
        }
    }
}
