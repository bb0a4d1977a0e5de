// SPDX-License-Identifier: MIT OR Apache-2.0
//! Handles to started child processes.

use crate::error::{HostError, LaunchError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::process::ExitStatus;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::debug;

/// What a supervisor needs from a child process.
pub trait ChildProcess: Send + Sync {
    /// OS process identifier.
    fn pid(&self) -> Option<u32>;

    /// Returns `true` until the process has exited.
    fn is_alive(&self) -> bool;

    /// Exit code, once the process has exited normally.
    fn exit_code(&self) -> Option<i32>;

    /// Forcibly terminate the process. A no-op once it has exited.
    fn destroy(&self) -> Result<(), HostError>;
}

/// Observed state of a child process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProcessStatus {
    /// The process is running.
    Running {
        /// OS process identifier.
        pid: u32,
    },
    /// The process exited with a code.
    Exited {
        /// Exit code returned by the process.
        code: i32,
    },
    /// The process was terminated by a signal.
    Terminated {
        /// Signal number, where the platform reports one.
        signal: Option<i32>,
    },
}

impl ProcessStatus {
    /// Status for an exited process.
    pub fn from_exit(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => Self::Exited { code },
            None => Self::Terminated {
                signal: exit_signal(&status),
            },
        }
    }

    /// Returns `true` if the process is still running.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Inner {
    pid: Option<u32>,
    child: Mutex<Child>,
    stdin: Mutex<Option<ChildStdin>>,
    stdout: Mutex<Option<ChildStdout>>,
    stderr: Mutex<Option<ChildStderr>>,
}

impl Inner {
    fn try_wait(&self) -> Result<Option<ExitStatus>, HostError> {
        lock(&self.child).try_wait().map_err(HostError::Wait)
    }
}

impl ChildProcess for Inner {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn is_alive(&self) -> bool {
        !matches!(self.try_wait(), Ok(Some(_)))
    }

    fn exit_code(&self) -> Option<i32> {
        self.try_wait().ok().flatten().and_then(|s| s.code())
    }

    fn destroy(&self) -> Result<(), HostError> {
        let mut child = lock(&self.child);
        match child.try_wait() {
            Ok(Some(_)) => return Ok(()),
            Ok(None) => {}
            Err(e) => debug!(target: "leash.host", pid = self.pid, error = %e, "status unknown before kill"),
        }
        debug!(target: "leash.host", pid = self.pid, "destroying child process");
        child.start_kill().map_err(HostError::Destroy)
    }
}

/// A started child process.
///
/// Cloning is cheap and every clone refers to the same process. The child's
/// stdin is held here, not in the underlying [`Child`], so the pipe the
/// auto-exit probe watches stays open until it is explicitly taken and
/// dropped, or every clone of the handle is gone.
#[derive(Clone)]
pub struct ProcessHandle {
    inner: Arc<Inner>,
}

impl ProcessHandle {
    /// Spawn `cmd` and take ownership of its stdio pipes.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(cmd: &mut Command) -> Result<Self, LaunchError> {
        let mut child = cmd.spawn().map_err(LaunchError::Spawn)?;
        let pid = child.id();
        debug!(target: "leash.host", pid, "started child process");
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        Ok(Self {
            inner: Arc::new(Inner {
                pid,
                child: Mutex::new(child),
                stdin: Mutex::new(stdin),
                stdout: Mutex::new(stdout),
                stderr: Mutex::new(stderr),
            }),
        })
    }

    /// OS process identifier.
    pub fn pid(&self) -> Option<u32> {
        self.inner.pid
    }

    /// Take the child's stdin. Dropping it closes the pipe, which makes an
    /// auto-exit child terminate.
    pub fn take_stdin(&self) -> Option<ChildStdin> {
        lock(&self.inner.stdin).take()
    }

    /// Take the child's stdout.
    pub fn take_stdout(&self) -> Option<ChildStdout> {
        lock(&self.inner.stdout).take()
    }

    /// Take the child's stderr.
    pub fn take_stderr(&self) -> Option<ChildStderr> {
        lock(&self.inner.stderr).take()
    }

    /// Exit status if the process has exited, without blocking.
    pub fn try_wait(&self) -> Result<Option<ExitStatus>, HostError> {
        self.inner.try_wait()
    }

    /// Exit status if the process has exited.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.try_wait().ok().flatten()
    }

    /// Exit code if the process has exited with one.
    pub fn exit_code(&self) -> Option<i32> {
        self.inner.exit_code()
    }

    /// Returns `true` until the process has exited.
    pub fn is_alive(&self) -> bool {
        self.inner.is_alive()
    }

    /// Current status.
    pub fn status(&self) -> ProcessStatus {
        match self.exit_status() {
            Some(status) => ProcessStatus::from_exit(status),
            None => ProcessStatus::Running {
                pid: self.pid().unwrap_or_default(),
            },
        }
    }

    /// Wait for the process to exit.
    ///
    /// The child is only locked while it is polled, so [`destroy`](Self::destroy)
    /// from another thread never waits behind this call.
    pub async fn wait(&self) -> Result<ExitStatus, HostError> {
        std::future::poll_fn(|cx| {
            let mut child = lock(&self.inner.child);
            let mut wait = std::pin::pin!(child.wait());
            wait.as_mut().poll(cx)
        })
        .await
        .map_err(HostError::Wait)
    }

    /// Forcibly terminate the process. Does nothing if it already exited, so
    /// the recorded exit status is never overwritten.
    pub fn destroy(&self) -> Result<(), HostError> {
        self.inner.destroy()
    }

    /// A weak reference for supervisors that must not keep the handle alive.
    pub fn downgrade(&self) -> Weak<dyn ChildProcess> {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        weak
    }
}

impl ChildProcess for ProcessHandle {
    fn pid(&self) -> Option<u32> {
        self.inner.pid
    }

    fn is_alive(&self) -> bool {
        self.inner.is_alive()
    }

    fn exit_code(&self) -> Option<i32> {
        self.inner.exit_code()
    }

    fn destroy(&self) -> Result<(), HostError> {
        self.inner.destroy()
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.inner.pid)
            .finish_non_exhaustive()
    }
}
