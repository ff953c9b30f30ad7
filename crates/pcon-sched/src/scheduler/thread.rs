//! Blocking front-end for OS threads.

use std::sync::OnceLock;

use crate::config::SchedulerConfig;
use crate::error::SchedError;
use crate::group::{RegistrySnapshot, SwitchOutcome};
use crate::park::Parker;
use crate::stats::SchedStats;
use crate::types::{GroupId, MemberId};

use super::Core;

/// Identity and wake handle of a calling thread.
///
/// [`ThreadCaller::current`] hands out the same caller for the same
/// thread every time. [`ThreadCaller::new`] mints an independent one.
#[derive(Debug, Clone)]
pub struct ThreadCaller {
    id: MemberId,
    parker: Parker,
}

impl Default for ThreadCaller {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadCaller {
    pub fn new() -> Self {
        Self {
            id: MemberId::next(),
            parker: Parker::new(),
        }
    }

    /// The caller bound to the current thread.
    pub fn current() -> Self {
        thread_local! {
            static CURRENT: ThreadCaller = ThreadCaller::new();
        }
        CURRENT.with(Clone::clone)
    }

    pub fn id(&self) -> MemberId {
        self.id
    }

    pub fn parker(&self) -> &Parker {
        &self.parker
    }
}

/// Group-scoped round-robin scheduler for OS threads.
///
/// `join` and `switch` block the calling thread when it has to wait for
/// its turn; `leave` never blocks.
///
/// ```rust,no_run
/// use pcon_sched::{GroupId, Scheduler, ThreadCaller};
///
/// let scheduler = Scheduler::global();
/// let me = ThreadCaller::current();
/// scheduler.join(GroupId(1), &me)?;   // runs at once if the group was empty
/// scheduler.switch(GroupId(1), &me)?; // hand off and wait for the next turn
/// scheduler.leave(GroupId(1), &me)?;
/// # Ok::<(), pcon_sched::SchedError>(())
/// ```
pub struct Scheduler {
    core: Core<Parker>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Scheduler configured from the environment (see [`SchedulerConfig::new`]).
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::new())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            core: Core::new(config),
        }
    }

    /// The process-wide scheduler, created on first use.
    pub fn global() -> &'static Scheduler {
        static GLOBAL: OnceLock<Scheduler> = OnceLock::new();
        GLOBAL.get_or_init(Scheduler::new)
    }

    /// Join `group_id`, creating it if needed.
    ///
    /// Returns at once for the first member (and for a caller already in
    /// the group). Anyone else blocks until a switch hands them the group.
    pub fn join(&self, group_id: GroupId, caller: &ThreadCaller) -> Result<(), SchedError> {
        let outcome = self
            .core
            .join(group_id, caller.id, caller.parker.clone())?;
        if outcome.must_park() {
            self.park(group_id, caller);
        }
        Ok(())
    }

    /// Hand the group to the next member and block until it comes back.
    ///
    /// A no-op for the only member.
    pub fn switch(&self, group_id: GroupId, caller: &ThreadCaller) -> Result<(), SchedError> {
        match self.core.switch(group_id, caller.id)? {
            SwitchOutcome::Stay => Ok(()),
            SwitchOutcome::Handoff { target, wake } => {
                tracing::trace!("{} wakes {target}", caller.id);
                self.core.stats().wakes.inc();
                wake.unpark();
                self.park(group_id, caller);
                Ok(())
            }
        }
    }

    /// Leave `group_id`; the group disappears with its last member.
    pub fn leave(&self, group_id: GroupId, caller: &ThreadCaller) -> Result<(), SchedError> {
        let outcome = self.core.leave(group_id, caller.id)?;
        if let Some((next, wake)) = outcome.handoff {
            tracing::trace!("{} wakes {next} on leave", caller.id);
            self.core.stats().wakes.inc();
            wake.unpark();
        }
        Ok(())
    }

    fn park(&self, group_id: GroupId, caller: &ThreadCaller) {
        tracing::trace!("{} parks in group {group_id}", caller.id);
        self.core.stats().parks.inc();
        caller.parker.park();
        self.core.resumed(group_id, caller.id);
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.core.snapshot()
    }

    pub fn stats(&self) -> &SchedStats {
        self.core.stats()
    }

    pub fn config(&self) -> &SchedulerConfig {
        self.core.config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MemberState;

    fn scheduler() -> Scheduler {
        Scheduler::with_config(SchedulerConfig::default())
    }

    #[test]
    fn current_caller_is_stable_per_thread() {
        let a = ThreadCaller::current();
        let b = ThreadCaller::current();
        assert_eq!(a.id(), b.id());
        assert!(a.parker().same_as(b.parker()));

        let other = std::thread::spawn(|| ThreadCaller::current().id())
            .join()
            .unwrap();
        assert_ne!(a.id(), other);
    }

    #[test]
    fn solo_join_and_switch_do_not_block() {
        let sched = scheduler();
        let me = ThreadCaller::new();
        sched.join(GroupId(1), &me).unwrap();
        sched.switch(GroupId(1), &me).unwrap();

        let snap = sched.snapshot();
        let group = snap.group(GroupId(1)).unwrap();
        assert_eq!(group.member_ids(), vec![me.id()]);
        assert_eq!(group.state_of(me.id()), Some(MemberState::Running));
        assert_eq!(sched.stats().parks.get(), 0);
        assert_eq!(sched.stats().handoffs.get(), 0);
    }

    #[test]
    fn leave_removes_group_and_counts() {
        let sched = scheduler();
        let me = ThreadCaller::new();
        sched.join(GroupId(5), &me).unwrap();
        sched.leave(GroupId(5), &me).unwrap();
        assert!(sched.snapshot().is_empty());
        assert_eq!(sched.stats().groups_created.get(), 1);
        assert_eq!(sched.stats().groups_destroyed.get(), 1);
        assert_eq!(sched.stats().live_groups(), 0);
    }

    #[test]
    fn errors_are_counted() {
        let sched = scheduler();
        let me = ThreadCaller::new();
        assert!(sched.switch(GroupId(1), &me).is_err());
        assert!(sched.leave(GroupId(1), &me).is_err());
        assert_eq!(sched.stats().errors.get(), 2);
    }

    #[test]
    fn global_is_a_singleton() {
        assert!(std::ptr::eq(Scheduler::global(), Scheduler::global()));
    }
}
