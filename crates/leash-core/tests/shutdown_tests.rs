// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tests for the process-wide shutdown registry.
//!
//! The global registry runs once per process, so everything touching it
//! lives in a single test.

use leash_core::shutdown::{self, ShutdownError, hook_fn};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn guard_runs_global_hooks_once() {
    let count = Arc::new(AtomicUsize::new(0));
    let removed = Arc::new(AtomicUsize::new(0));

    let c = Arc::clone(&count);
    shutdown::register(hook_fn("counter", move || {
        c.fetch_add(1, Ordering::SeqCst);
    }))
    .unwrap();
    let r = Arc::clone(&removed);
    let id = shutdown::register(hook_fn("removed", move || {
        r.fetch_add(1, Ordering::SeqCst);
    }))
    .unwrap();
    assert!(shutdown::remove(id));

    {
        let _guard = shutdown::guard();
    }
    shutdown::run_hooks();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(removed.load(Ordering::SeqCst), 0);
    assert!(shutdown::global().is_running());
    assert_eq!(
        shutdown::register(hook_fn("late", || {})).unwrap_err(),
        ShutdownError::ShutdownInProgress
    );
}
