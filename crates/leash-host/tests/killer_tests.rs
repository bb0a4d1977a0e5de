// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tests for the shutdown-time process killer.

use leash_core::HookRegistry;
use leash_host::{AutoProcessKiller, ChildProcess, HostError, ProcessKiller};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

#[derive(Clone, Copy)]
enum Behavior {
    Ok,
    Fail,
    Panic,
}

struct FakeChild {
    pid: u32,
    behavior: Behavior,
    destroyed: AtomicUsize,
    log: Arc<Mutex<Vec<u32>>>,
}

impl FakeChild {
    fn new(pid: u32, behavior: Behavior, log: &Arc<Mutex<Vec<u32>>>) -> Arc<Self> {
        Arc::new(Self {
            pid,
            behavior,
            destroyed: AtomicUsize::new(0),
            log: Arc::clone(log),
        })
    }

    fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl ChildProcess for FakeChild {
    fn pid(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn is_alive(&self) -> bool {
        self.destroyed() == 0
    }

    fn exit_code(&self) -> Option<i32> {
        None
    }

    fn destroy(&self) -> Result<(), HostError> {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(self.pid);
        match self.behavior {
            Behavior::Ok => Ok(()),
            Behavior::Fail => Err(HostError::Destroy(std::io::Error::other("refused"))),
            Behavior::Panic => panic!("destroy blew up"),
        }
    }
}

fn weak(child: &Arc<FakeChild>) -> Weak<dyn ChildProcess> {
    let child: Arc<dyn ChildProcess> = child.clone();
    Arc::downgrade(&child)
}

// ── ProcessKiller ───────────────────────────────────────────────────

#[test]
fn empty_killer_reaches_nothing() {
    let killer = ProcessKiller::new();
    assert!(killer.is_empty());
    assert_eq!(killer.kill_all(), 0);
}

#[test]
fn kills_every_child_once_in_order_despite_failures() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let a = FakeChild::new(1, Behavior::Fail, &log);
    let b = FakeChild::new(2, Behavior::Panic, &log);
    let c = FakeChild::new(3, Behavior::Ok, &log);

    let killer = ProcessKiller::new();
    for child in [&a, &b, &c] {
        killer.add_child(weak(child));
    }
    assert_eq!(killer.len(), 3);
    assert_eq!(killer.pids(), [1, 2, 3]);

    assert_eq!(killer.kill_all(), 3);
    assert_eq!(*log.lock().unwrap(), [1, 2, 3]);
    for child in [&a, &b, &c] {
        assert_eq!(child.destroyed(), 1);
    }

    assert_eq!(killer.kill_all(), 0);
    assert_eq!(c.destroyed(), 1);
}

#[test]
fn dropped_handles_are_skipped() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let kept = FakeChild::new(10, Behavior::Ok, &log);
    let dropped = FakeChild::new(11, Behavior::Ok, &log);

    let killer = ProcessKiller::new();
    killer.add_child(weak(&kept));
    killer.add_child(weak(&dropped));
    drop(dropped);

    assert_eq!(killer.len(), 1);
    assert_eq!(killer.kill_all(), 1);
    assert_eq!(*log.lock().unwrap(), [10]);
}

// ── AutoProcessKiller ───────────────────────────────────────────────

#[test]
fn auto_killer_runs_with_registry() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let child = FakeChild::new(7, Behavior::Ok, &log);

    let registry = HookRegistry::new();
    let killer = AutoProcessKiller::register_with(&registry).unwrap();
    killer.add_child(weak(&child));
    assert_eq!(registry.len(), 1);

    registry.run();
    registry.run();
    assert_eq!(child.destroyed(), 1);
    assert!(killer.is_empty());
}

#[test]
fn auto_killer_hook_can_be_removed() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let child = FakeChild::new(8, Behavior::Ok, &log);

    let registry = HookRegistry::new();
    let killer = AutoProcessKiller::register_with(&registry).unwrap();
    killer.add_child(weak(&child));

    assert!(registry.remove(killer.hook_id()));
    registry.run();
    assert_eq!(child.destroyed(), 0);
}

#[test]
fn dropped_auto_killer_stays_registered() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let child = FakeChild::new(9, Behavior::Ok, &log);

    let registry = HookRegistry::new();
    {
        let killer = AutoProcessKiller::register_with(&registry).unwrap();
        killer.add_child(weak(&child));
    }
    assert_eq!(registry.len(), 1);

    registry.run();
    assert_eq!(child.destroyed(), 1);
}

#[test]
fn auto_killer_rejected_after_shutdown_started() {
    let registry = HookRegistry::new();
    registry.run();
    assert!(AutoProcessKiller::register_with(&registry).is_err());
}
