//! Integration tests: real threads taking turns inside groups.
//!
//! Each scenario runs under a watchdog so a lost wake-up fails the test
//! instead of hanging it.
mod common;

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use common::{init_tracing, members_of, wait_until, within};
use pcon_sched::{GroupId, MemberState, SchedError, Scheduler, SchedulerConfig, ThreadCaller};

const G1: GroupId = GroupId(1);
const G2: GroupId = GroupId(2);

fn handoff_scheduler() -> Arc<Scheduler> {
    Arc::new(Scheduler::with_config(
        SchedulerConfig::default().wake_on_leave(true),
    ))
}

/// Join, take `rounds` turns, take a final turn and leave.
fn take_turns(
    sched: &Scheduler,
    me: &ThreadCaller,
    name: &'static str,
    rounds: usize,
    log: &Mutex<Vec<&'static str>>,
) {
    for _ in 0..rounds {
        log.lock().unwrap().push(name);
        sched.switch(G1, me).unwrap();
    }
    log.lock().unwrap().push(name);
    sched.leave(G1, me).unwrap();
}

#[test]
fn solo_join_never_blocks() {
    init_tracing();
    within(|| {
        let sched = Scheduler::with_config(SchedulerConfig::default());
        let me = ThreadCaller::new();
        sched.join(GroupId(77), &me).unwrap();
        assert_eq!(sched.stats().parks.get(), 0);
    });
}

#[test]
fn three_members_rotate_in_join_order() {
    init_tracing();
    let order = within(|| {
        let sched = handoff_scheduler();
        let log = Arc::new(Mutex::new(Vec::<&'static str>::new()));
        let (a, b, c) = (ThreadCaller::new(), ThreadCaller::new(), ThreadCaller::new());

        sched.join(G1, &a).unwrap();

        let mut workers = Vec::new();
        for (caller, name, expected_len) in [(b.clone(), "B", 2), (c.clone(), "C", 3)] {
            let worker_sched = sched.clone();
            let log = log.clone();
            workers.push(thread::spawn(move || {
                worker_sched.join(G1, &caller).unwrap();
                take_turns(&worker_sched, &caller, name, 2, &log);
            }));
            wait_until(&sched, |snap| members_of(snap, G1).len() == expected_len);
        }

        assert_eq!(members_of(&sched.snapshot(), G1), vec![a.id(), b.id(), c.id()]);
        take_turns(&sched, &a, "A", 2, &log);

        for w in workers {
            w.join().unwrap();
        }
        assert!(sched.snapshot().is_empty());
        let order = log.lock().unwrap().clone();
        order
    });

    assert_eq!(order, vec!["A", "B", "C", "A", "B", "C", "A", "B", "C"]);
}

#[test]
fn switch_parks_caller_and_readies_target() {
    init_tracing();
    within(|| {
        let sched = handoff_scheduler();
        let (a, b) = (ThreadCaller::new(), ThreadCaller::new());
        sched.join(G1, &a).unwrap();

        let a_id = a.id();
        let worker = {
            let sched = sched.clone();
            let b = b.clone();
            thread::spawn(move || {
                sched.join(G1, &b).unwrap();
                // Running now; observe A parked behind us.
                let snap = sched.snapshot();
                let group = snap.group(G1).unwrap();
                assert_eq!(group.holder, Some(b.id()));
                assert_eq!(group.state_of(b.id()), Some(MemberState::Running));
                assert_eq!(group.state_of(a_id), Some(MemberState::Parked));
                sched.leave(G1, &b).unwrap();
            })
        };
        wait_until(&sched, |snap| members_of(snap, G1).len() == 2);

        sched.switch(G1, &a).unwrap();
        worker.join().unwrap();

        // Leave by B handed the group back.
        let snap = sched.snapshot();
        assert_eq!(snap.group(G1).unwrap().holder, Some(a.id()));
        sched.leave(G1, &a).unwrap();
    });
}

#[test]
fn sole_member_switch_is_noop() {
    init_tracing();
    within(|| {
        let sched = Scheduler::with_config(SchedulerConfig::default());
        let a = ThreadCaller::new();
        sched.join(G1, &a).unwrap();
        let before = sched.snapshot();
        sched.switch(G1, &a).unwrap();
        assert_eq!(sched.snapshot(), before);
        assert_eq!(sched.stats().parks.get(), 0);
        assert_eq!(sched.stats().wakes.get(), 0);
    });
}

#[test]
fn last_leave_destroys_group_and_rejoin_starts_fresh() {
    init_tracing();
    within(|| {
        let sched = handoff_scheduler();
        let (a, b, c) = (ThreadCaller::new(), ThreadCaller::new(), ThreadCaller::new());
        sched.join(G1, &a).unwrap();

        let worker = {
            let sched = sched.clone();
            let b = b.clone();
            thread::spawn(move || {
                sched.join(G1, &b).unwrap();
                sched.leave(G1, &b).unwrap();
            })
        };
        wait_until(&sched, |snap| members_of(snap, G1).len() == 2);

        sched.leave(G1, &a).unwrap();
        worker.join().unwrap();
        assert!(sched.snapshot().group(G1).is_none());

        sched.join(G1, &c).unwrap();
        assert_eq!(members_of(&sched.snapshot(), G1), vec![c.id()]);
        assert_eq!(sched.stats().groups_created.get(), 2);
        assert_eq!(sched.stats().groups_destroyed.get(), 1);
    });
}

#[test]
fn duplicate_join_keeps_single_entry() {
    init_tracing();
    within(|| {
        let sched = handoff_scheduler();
        let (a, b) = (ThreadCaller::new(), ThreadCaller::new());
        sched.join(G1, &a).unwrap();
        sched.join(G1, &a).unwrap();
        assert_eq!(members_of(&sched.snapshot(), G1), vec![a.id()]);

        let log = Arc::new(Mutex::new(Vec::<&'static str>::new()));
        let worker = {
            let (sched, b, log) = (sched.clone(), b.clone(), log.clone());
            thread::spawn(move || {
                sched.join(G1, &b).unwrap();
                take_turns(&sched, &b, "B", 1, &log);
            })
        };
        wait_until(&sched, |snap| members_of(snap, G1).len() == 2);

        take_turns(&sched, &a, "A", 1, &log);
        worker.join().unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["A", "B", "A", "B"]);
    });
}

#[test]
fn switch_in_one_group_never_touches_another() {
    init_tracing();
    within(|| {
        let sched = handoff_scheduler();
        let (a, b, c) = (ThreadCaller::new(), ThreadCaller::new(), ThreadCaller::new());
        sched.join(G1, &a).unwrap();
        sched.join(G2, &c).unwrap();

        let worker = {
            let (sched, b) = (sched.clone(), b.clone());
            thread::spawn(move || {
                sched.join(G1, &b).unwrap();
                sched.leave(G1, &b).unwrap();
            })
        };
        wait_until(&sched, |snap| members_of(snap, G1).len() == 2);

        sched.switch(G1, &a).unwrap();
        worker.join().unwrap();

        // No permit was ever delivered to C.
        assert!(!c.parker().park_timeout(Duration::from_millis(50)));
        sched.switch(G2, &c).unwrap();
        let snap = sched.snapshot();
        assert_eq!(snap.group(G2).unwrap().holder, Some(c.id()));
        assert_eq!(snap.group(G2).unwrap().state_of(c.id()), Some(MemberState::Running));
    });
}

#[test]
fn switch_after_partner_left_is_noop() {
    init_tracing();
    within(|| {
        let sched = handoff_scheduler();
        let (a, b) = (ThreadCaller::new(), ThreadCaller::new());
        sched.join(G1, &a).unwrap();

        let worker = {
            let (sched, b) = (sched.clone(), b.clone());
            thread::spawn(move || {
                sched.join(G1, &b).unwrap();
                sched.leave(G1, &b).unwrap();
            })
        };
        wait_until(&sched, |snap| members_of(snap, G1).len() == 2);

        sched.switch(G1, &a).unwrap();
        worker.join().unwrap();

        let parks = sched.stats().parks.get();
        sched.switch(G1, &a).unwrap();
        assert_eq!(sched.stats().parks.get(), parks);
        sched.leave(G1, &a).unwrap();
    });
}

#[test]
fn leave_without_handoff_strands_parked_members() {
    init_tracing();
    within(|| {
        let sched = Arc::new(Scheduler::with_config(SchedulerConfig::default()));
        let (a, b) = (ThreadCaller::new(), ThreadCaller::new());
        sched.join(G1, &a).unwrap();

        let worker = {
            let (sched, b) = (sched.clone(), b.clone());
            thread::spawn(move || {
                sched.join(G1, &b).unwrap();
                sched.leave(G1, &b).unwrap();
            })
        };
        wait_until(&sched, |snap| members_of(snap, G1).len() == 2);

        sched.leave(G1, &a).unwrap();
        thread::sleep(Duration::from_millis(50));
        let snap = sched.snapshot();
        let group = snap.group(G1).unwrap();
        assert_eq!(group.member_ids(), vec![b.id()]);
        assert_eq!(group.holder, None);
        assert_eq!(group.state_of(b.id()), Some(MemberState::Parked));
        assert!(!worker.is_finished());

        // Release B by hand so the test can finish.
        b.parker().unpark();
        worker.join().unwrap();
        assert!(sched.snapshot().is_empty());
    });
}

#[test]
fn full_group_rejects_join_without_blocking() {
    init_tracing();
    within(|| {
        let sched = Scheduler::with_config(SchedulerConfig::default().max_members_per_group(1));
        let (a, b) = (ThreadCaller::new(), ThreadCaller::new());
        sched.join(G1, &a).unwrap();
        let err = sched.join(G1, &b).unwrap_err();
        assert!(matches!(err, SchedError::ResourceExhausted { group_id: G1, .. }));
        assert_eq!(members_of(&sched.snapshot(), G1), vec![a.id()]);
    });
}

#[test]
fn many_rounds_many_members() {
    init_tracing();
    const MEMBERS: usize = 6;
    const ROUNDS: usize = 50;

    let order = within(|| {
        let sched = handoff_scheduler();
        let log = Arc::new(Mutex::new(Vec::<&'static str>::new()));
        let callers: Vec<ThreadCaller> = (0..MEMBERS).map(|_| ThreadCaller::new()).collect();
        let names: [&'static str; MEMBERS] = ["0", "1", "2", "3", "4", "5"];

        sched.join(G1, &callers[0]).unwrap();
        let mut workers = Vec::new();
        for i in 1..MEMBERS {
            let (worker_sched, log, me) = (sched.clone(), log.clone(), callers[i].clone());
            let name = names[i];
            workers.push(thread::spawn(move || {
                worker_sched.join(G1, &me).unwrap();
                take_turns(&worker_sched, &me, name, ROUNDS, &log);
            }));
            wait_until(&sched, |snap| members_of(snap, G1).len() == i + 1);
        }
        take_turns(&sched, &callers[0], names[0], ROUNDS, &log);
        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(sched.stats().handoffs.get(), (MEMBERS * ROUNDS) as u64);
        let order = log.lock().unwrap().clone();
        order
    });

    assert_eq!(order.len(), MEMBERS * (ROUNDS + 1));
    for (i, name) in order.iter().enumerate() {
        assert_eq!(*name, (i % MEMBERS).to_string(), "turn {i} out of order");
    }
}
