//! Scheduler front-ends.
//!
//! Both front-ends share one `Core`: a single mutex around the registry
//! plus stats. The core only ever holds the lock while the registry
//! decides; parking and waking happen in the front-end after the guard
//! is gone.

mod task;
mod thread;

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::SchedulerConfig;
use crate::error::SchedError;
use crate::group::{JoinOutcome, LeaveOutcome, Registry, RegistrySnapshot, SwitchOutcome};
use crate::stats::SchedStats;
use crate::types::{GroupId, MemberId};

pub use task::{AsyncScheduler, TaskCaller};
pub use thread::{Scheduler, ThreadCaller};

/// Registry behind the process-wide lock, generic over the wake handle.
pub(crate) struct Core<H> {
    registry: Mutex<Registry<H>>,
    config: SchedulerConfig,
    stats: SchedStats,
}

impl<H: Clone> Core<H> {
    pub(crate) fn new(config: SchedulerConfig) -> Self {
        Self {
            registry: Mutex::new(Registry::new(config.clone())),
            config,
            stats: SchedStats::default(),
        }
    }

    // Registry mutations never panic halfway, so a poisoned lock still
    // guards consistent state.
    fn lock(&self) -> MutexGuard<'_, Registry<H>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub(crate) fn stats(&self) -> &SchedStats {
        &self.stats
    }

    pub(crate) fn snapshot(&self) -> RegistrySnapshot {
        self.lock().snapshot()
    }

    pub(crate) fn join(
        &self,
        group_id: GroupId,
        member_id: MemberId,
        handle: H,
    ) -> Result<JoinOutcome, SchedError> {
        let mut registry = self.lock();
        let result = registry.join(group_id, member_id, handle);
        match &result {
            Ok(outcome) => {
                self.stats.joins.inc();
                if *outcome == JoinOutcome::Running {
                    self.stats.groups_created.inc();
                    tracing::debug!("group {group_id} created by {member_id}");
                }
                tracing::debug!("join: {member_id} in group {group_id} -> {outcome:?}");
                self.trace_registry(&registry);
            }
            Err(e) => self.failed("join", e),
        }
        result
    }

    pub(crate) fn switch(
        &self,
        group_id: GroupId,
        member_id: MemberId,
    ) -> Result<SwitchOutcome<H>, SchedError> {
        let mut registry = self.lock();
        let result = registry.switch(group_id, member_id);
        match &result {
            Ok(SwitchOutcome::Stay) => {
                self.stats.switches.inc();
                tracing::debug!("switch: {member_id} is alone in group {group_id}");
            }
            Ok(SwitchOutcome::Handoff { target, .. }) => {
                self.stats.switches.inc();
                self.stats.handoffs.inc();
                tracing::debug!("switch: {member_id} -> {target} in group {group_id}");
                self.trace_registry(&registry);
            }
            Err(e) => self.failed("switch", e),
        }
        result
    }

    pub(crate) fn leave(
        &self,
        group_id: GroupId,
        member_id: MemberId,
    ) -> Result<LeaveOutcome<H>, SchedError> {
        let mut registry = self.lock();
        let result = registry.leave(group_id, member_id);
        match &result {
            Ok(outcome) => {
                self.stats.leaves.inc();
                tracing::debug!("leave: {member_id} from group {group_id}");
                if let Some((next, _)) = &outcome.handoff {
                    tracing::debug!("leave: possession of group {group_id} passes to {next}");
                }
                if outcome.group_removed {
                    self.stats.groups_destroyed.inc();
                    tracing::debug!("group {group_id} removed");
                }
                self.trace_registry(&registry);
            }
            Err(e) => self.failed("leave", e),
        }
        result
    }

    /// A woken member is executing again.
    pub(crate) fn resumed(&self, group_id: GroupId, member_id: MemberId) {
        tracing::trace!("{member_id} resumed in group {group_id}");
        self.lock().mark_running(group_id, member_id);
    }

    fn trace_registry(&self, registry: &Registry<H>) {
        if self.config.trace_registry {
            tracing::debug!("registry:\n{}", registry.snapshot());
        }
    }

    fn failed(&self, op: &str, e: &SchedError) {
        self.stats.errors.inc();
        tracing::warn!("{op} failed: {e}");
    }
}
