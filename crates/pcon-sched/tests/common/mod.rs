//! Shared helpers for the threaded integration tests.
#![allow(dead_code)]

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use pcon_sched::{GroupId, MemberId, RegistrySnapshot, Scheduler};

/// Upper bound for any scenario; a liveness bug fails instead of hanging.
pub const SCENARIO_TIMEOUT: Duration = Duration::from_secs(10);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .try_init();
}

/// Run `f` on its own thread and fail the test if it does not finish in time.
pub fn within<T, F>(f: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx.recv_timeout(SCENARIO_TIMEOUT)
        .expect("scenario did not finish (deadlock or lost wake-up)")
}

/// Poll the registry until `pred` holds.
pub fn wait_until(sched: &Scheduler, pred: impl Fn(&RegistrySnapshot) -> bool) {
    let deadline = Instant::now() + SCENARIO_TIMEOUT;
    loop {
        if pred(&sched.snapshot()) {
            return;
        }
        assert!(Instant::now() < deadline, "registry never reached expected state");
        thread::sleep(Duration::from_millis(1));
    }
}

/// Members of `group_id` in ring order (empty if the group does not exist).
pub fn members_of(snap: &RegistrySnapshot, group_id: GroupId) -> Vec<MemberId> {
    snap.group(group_id)
        .map(|g| g.member_ids())
        .unwrap_or_default()
}
