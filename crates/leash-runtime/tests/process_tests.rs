// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tests that start the `leash-runtime` binary as a real child process.
#![cfg(unix)]

use leash_core::{AUTO_EXIT_PROGRAM, LaunchContext};
use leash_host::copier::copy_bytes;
use leash_host::{LaunchBuilder, ProcessHandle};
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::{Duration, Instant};
use tokio::io::AsyncBufReadExt;

const RUNTIME: &str = env!("CARGO_BIN_EXE_leash-runtime");

fn builder(entry: &str) -> LaunchBuilder {
    let mut b = LaunchBuilder::for_name(entry);
    b.context(&LaunchContext {
        interpreter: PathBuf::from(RUNTIME),
        classpath: String::new(),
        vm_args: Vec::new(),
    });
    b
}

struct Finished {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

/// Run to completion with stdin held open, collecting both output streams.
async fn finish(handle: ProcessHandle) -> Finished {
    let out = handle.take_stdout().unwrap();
    let err = handle.take_stderr().unwrap();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let (o, e, status) = tokio::time::timeout(Duration::from_secs(30), async {
        tokio::join!(
            copy_bytes(out, &mut stdout),
            copy_bytes(err, &mut stderr),
            handle.wait()
        )
    })
    .await
    .expect("runtime finishes");
    o.unwrap();
    e.unwrap();
    Finished {
        status: status.unwrap(),
        stdout: String::from_utf8(stdout).unwrap(),
        stderr: String::from_utf8(stderr).unwrap(),
    }
}

fn pid_alive(pid: i32) -> bool {
    if let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        // Zombies have exited but wait for a reaper that may never come.
        let state = stat.rsplit(')').next().and_then(|s| s.split_whitespace().next());
        return state != Some("Z");
    }
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None).is_ok()
}

// ── direct runs ─────────────────────────────────────────────────────

#[tokio::test]
async fn runs_registered_entry_point() {
    let mut b = builder("demo.Greeter");
    b.args(["Ada", "--loud"]);
    let done = finish(b.start().unwrap()).await;
    assert!(done.status.success());
    assert_eq!(done.stdout, "Hello, Ada!\narg: --loud\n");
}

#[tokio::test]
async fn failing_entry_point_exits_with_one() {
    let done = finish(builder("demo.Fail").start().unwrap()).await;
    assert_eq!(done.status.code(), Some(1));
    assert!(done.stderr.contains("boom"), "stderr: {}", done.stderr);
}

#[tokio::test]
async fn unknown_entry_point_exits_with_one() {
    let done = finish(builder("demo.Missing").start().unwrap()).await;
    assert_eq!(done.status.code(), Some(1));
    assert!(done.stderr.contains("demo.Missing"), "stderr: {}", done.stderr);
}

// ── trampoline ──────────────────────────────────────────────────────

#[tokio::test]
async fn trampoline_output_matches_direct_run() {
    let mut direct = builder("demo.Greeter");
    direct.args(["Grace", "x y"]);
    let mut bounced = direct.clone();
    bounced.auto_exit(true);
    assert!(bounced.command().tokens().iter().any(|t| t == AUTO_EXIT_PROGRAM));

    let a = finish(direct.start().unwrap()).await;
    let b = finish(bounced.start().unwrap()).await;
    assert!(a.status.success() && b.status.success());
    assert_eq!(a.stdout, b.stdout);
}

#[tokio::test]
async fn trampoline_failure_surfaces_unwrapped() {
    let mut b = builder("demo.Fail");
    b.auto_exit(true);
    let done = finish(b.start().unwrap()).await;
    assert_eq!(done.status.code(), Some(1));
    assert!(done.stderr.contains("error: boom"), "stderr: {}", done.stderr);
}

// ── auto-exit probe ─────────────────────────────────────────────────

#[tokio::test]
async fn probe_does_not_fire_while_parent_lives() {
    let mut b = builder("demo.Sleeper");
    b.auto_exit(true).arg("30");
    let handle = b.start().unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(handle.is_alive());

    handle.destroy().unwrap();
    handle.wait().await.unwrap();
}

#[tokio::test]
async fn closing_stdin_makes_child_exit_cleanly() {
    let mut b = builder("demo.Sleeper");
    b.auto_exit(true).arg("30");
    let handle = b.start().unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    drop(handle.take_stdin());
    let status = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("child exits after stdin closes")
        .unwrap();
    assert_eq!(status.code(), Some(0));
}

#[tokio::test]
async fn probe_fires_when_parent_is_killed() {
    let mut b = builder("demo.Spawner");
    b.arg("30");
    let parent = b.start().unwrap();

    let mut lines = tokio::io::BufReader::new(parent.take_stdout().unwrap()).lines();
    let line = tokio::time::timeout(Duration::from_secs(10), lines.next_line())
        .await
        .expect("spawner reports its child")
        .unwrap()
        .expect("pid line");
    let child: i32 = line.trim().parse().unwrap();
    assert!(child > 0);
    assert!(pid_alive(child));

    // SIGKILL runs no shutdown hooks; only the probe can stop the child.
    parent.destroy().unwrap();
    parent.wait().await.unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while pid_alive(child) && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let survived = pid_alive(child);
    if survived {
        let _ = nix::sys::signal::kill(
            nix::unistd::Pid::from_raw(child),
            nix::sys::signal::Signal::SIGKILL,
        );
    }
    assert!(!survived, "child {child} outlived its parent");
}
