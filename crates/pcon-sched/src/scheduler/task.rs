//! Async front-end for tokio tasks.
//!
//! Same semantics as the blocking [`Scheduler`](super::Scheduler), but a
//! member waits on its own [`Notify`] instead of blocking a thread.
//! `Notify::notify_one` stores a permit when nobody is waiting yet, so a
//! handoff that races ahead of the target's `.await` is not lost.
//!
//! Dropping a `join` or `switch` future while it waits leaves the member
//! registered; there is no cancellation.

use std::sync::Arc;

use tokio::sync::Notify;

use crate::config::SchedulerConfig;
use crate::error::SchedError;
use crate::group::{RegistrySnapshot, SwitchOutcome};
use crate::stats::SchedStats;
use crate::types::{GroupId, MemberId};

use super::Core;

/// Identity and wake handle of a task.
#[derive(Debug, Clone)]
pub struct TaskCaller {
    id: MemberId,
    notify: Arc<Notify>,
}

impl Default for TaskCaller {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskCaller {
    pub fn new() -> Self {
        Self {
            id: MemberId::next(),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn id(&self) -> MemberId {
        self.id
    }
}

/// Group-scoped round-robin scheduler for async tasks.
pub struct AsyncScheduler {
    core: Core<Arc<Notify>>,
}

impl Default for AsyncScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncScheduler {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::new())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            core: Core::new(config),
        }
    }

    pub async fn join(&self, group_id: GroupId, caller: &TaskCaller) -> Result<(), SchedError> {
        let outcome = self
            .core
            .join(group_id, caller.id, caller.notify.clone())?;
        if outcome.must_park() {
            self.park(group_id, caller).await;
        }
        Ok(())
    }

    pub async fn switch(&self, group_id: GroupId, caller: &TaskCaller) -> Result<(), SchedError> {
        let (target, wake) = match self.core.switch(group_id, caller.id)? {
            SwitchOutcome::Stay => return Ok(()),
            SwitchOutcome::Handoff { target, wake } => (target, wake),
        };
        tracing::trace!("{} wakes {target}", caller.id);
        self.core.stats().wakes.inc();
        wake.notify_one();
        self.park(group_id, caller).await;
        Ok(())
    }

    pub fn leave(&self, group_id: GroupId, caller: &TaskCaller) -> Result<(), SchedError> {
        let outcome = self.core.leave(group_id, caller.id)?;
        if let Some((next, wake)) = outcome.handoff {
            tracing::trace!("{} wakes {next} on leave", caller.id);
            self.core.stats().wakes.inc();
            wake.notify_one();
        }
        Ok(())
    }

    async fn park(&self, group_id: GroupId, caller: &TaskCaller) {
        tracing::trace!("{} parks in group {group_id}", caller.id);
        self.core.stats().parks.inc();
        caller.notify.notified().await;
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

    #[tokio::test]
    async fn solo_task_never_waits() {
        let sched = AsyncScheduler::with_config(SchedulerConfig::default());
        let me = TaskCaller::new();
        sched.join(GroupId(1), &me).await.unwrap();
        sched.switch(GroupId(1), &me).await.unwrap();
        sched.leave(GroupId(1), &me).unwrap();
        assert!(sched.snapshot().is_empty());
        assert_eq!(sched.stats().parks.get(), 0);
    }

    #[tokio::test]
    async fn leave_unknown_group_fails() {
        let sched = AsyncScheduler::with_config(SchedulerConfig::default());
        let me = TaskCaller::new();
        assert_eq!(
            sched.leave(GroupId(3), &me),
            Err(SchedError::GroupNotFound {
                group_id: GroupId(3)
            })
        );
    }
}
