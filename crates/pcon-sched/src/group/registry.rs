/// Group registry: the set of live groups and the Join/Switch/Leave
/// decision engine.
///
/// Pure state machine: no locking, no parking, no waking. Every method
/// returns an outcome that the caller executes once it has released
/// whatever lock guards the registry.
use std::collections::HashMap;

use crate::config::SchedulerConfig;
use crate::error::SchedError;
use crate::group::members::{Member, MembershipList, Removal};
use crate::group::types::*;
use crate::types::{GroupId, MemberId, MemberState};

/// One scheduling domain.
#[derive(Debug, Clone)]
pub struct Group<H> {
    pub group_id: GroupId,
    pub(crate) members: MembershipList<H>,
    /// Member currently entitled to run.
    holder: Option<MemberId>,
}

impl<H> Group<H> {
    fn new(group_id: GroupId) -> Self {
        Self {
            group_id,
            members: MembershipList::new(),
            holder: None,
        }
    }

    pub fn holder(&self) -> Option<MemberId> {
        self.holder
    }

    /// Members in ring order.
    pub fn members(&self) -> &MembershipList<H> {
        &self.members
    }

    fn set_state(&mut self, id: MemberId, state: MemberState) {
        if let Some(member) = self.members.get_mut(id) {
            member.state = state;
        }
    }

    fn admit(
        &mut self,
        id: MemberId,
        handle: H,
        max_members: Option<usize>,
    ) -> Result<JoinOutcome, SchedError> {
        if self.members.contains(id) {
            return Ok(JoinOutcome::AlreadyMember);
        }
        if let Some(max) = max_members {
            if self.members.len() >= max {
                return Err(SchedError::ResourceExhausted {
                    group_id: self.group_id,
                    reason: format!("group is full ({max} members)"),
                });
            }
        }

        self.members
            .append(Member::new(id, handle))
            .map_err(|e| SchedError::allocation(self.group_id, e))?;

        if self.members.len() == 1 {
            self.holder = Some(id);
            self.set_state(id, MemberState::Running);
            Ok(JoinOutcome::Running)
        } else {
            Ok(JoinOutcome::Park)
        }
    }

    fn snapshot(&self) -> GroupSnapshot {
        GroupSnapshot {
            group_id: self.group_id,
            holder: self.holder,
            members: self
                .members
                .iter()
                .map(|m| MemberSnapshot {
                    member_id: m.id,
                    state: m.state,
                })
                .collect(),
        }
    }
}

/// All live groups, keyed by id.
///
/// Invariant: every group in the map has at least one member.
#[derive(Debug)]
pub struct Registry<H> {
    groups: HashMap<GroupId, Group<H>>,
    config: SchedulerConfig,
}

impl<H> Default for Registry<H> {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl<H> Registry<H> {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            groups: HashMap::new(),
            config,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn contains(&self, group_id: GroupId) -> bool {
        self.groups.contains_key(&group_id)
    }

    pub fn get(&self, group_id: GroupId) -> Option<&Group<H>> {
        self.groups.get(&group_id)
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut groups: Vec<GroupSnapshot> = self.groups.values().map(Group::snapshot).collect();
        groups.sort_by_key(|g| g.group_id);
        RegistrySnapshot { groups }
    }

    // ── Structure ────────────────────────────────────────────────────────

    /// The group for `group_id`, inserting an empty one if absent.
    ///
    /// An inserted group is empty until the caller admits someone; callers
    /// that fail to do so must follow up with [`Self::delete_if_empty`].
    pub(crate) fn find_or_create(
        &mut self,
        group_id: GroupId,
    ) -> Result<&mut Group<H>, SchedError> {
        if !self.groups.contains_key(&group_id) {
            if let Some(max) = self.config.max_groups {
                if self.groups.len() >= max {
                    return Err(SchedError::ResourceExhausted {
                        group_id,
                        reason: format!("registry is full ({max} groups)"),
                    });
                }
            }
            self.groups
                .try_reserve(1)
                .map_err(|e| SchedError::allocation(group_id, e))?;
        }
        Ok(self
            .groups
            .entry(group_id)
            .or_insert_with(|| Group::new(group_id)))
    }

    /// Remove the group iff it has no members. Returns whether it was removed.
    ///
    /// Absent ids are a no-op.
    pub fn delete_if_empty(&mut self, group_id: GroupId) -> bool {
        let empty = self
            .groups
            .get(&group_id)
            .is_some_and(|group| group.members.is_empty());
        if empty {
            self.groups.remove(&group_id);
        }
        empty
    }
}

impl<H: Clone> Registry<H> {
    // ── Operations ───────────────────────────────────────────────────────

    /// Add `member_id` to `group_id`, creating the group on first join.
    ///
    /// On failure nothing is left behind: a group created for this call
    /// is removed again.
    pub fn join(
        &mut self,
        group_id: GroupId,
        member_id: MemberId,
        handle: H,
    ) -> Result<JoinOutcome, SchedError> {
        let max_members = self.config.max_members_per_group;
        let group = self.find_or_create(group_id)?;
        let admitted = group.admit(member_id, handle, max_members);
        if admitted.is_err() {
            self.delete_if_empty(group_id);
        }
        admitted
    }

    /// Hand possession from `member_id` to the next member of the ring.
    ///
    /// A caller outside the ring hands off to the head and is not itself
    /// recorded anywhere, so only an external wake can resume it.
    pub fn switch(
        &mut self,
        group_id: GroupId,
        member_id: MemberId,
    ) -> Result<SwitchOutcome<H>, SchedError> {
        let group = self
            .groups
            .get_mut(&group_id)
            .ok_or(SchedError::GroupNotFound { group_id })?;

        let (target, wake) = match group.members.next_after(member_id) {
            Some(next) if next.id != member_id => (next.id, next.handle.clone()),
            _ => return Ok(SwitchOutcome::Stay),
        };

        if group.members.contains(member_id) {
            group.set_state(member_id, MemberState::Parked);
        }
        group.set_state(target, MemberState::Ready);
        group.holder = Some(target);
        Ok(SwitchOutcome::Handoff { target, wake })
    }

    /// Remove `member_id` from `group_id`; drop the group once empty.
    pub fn leave(
        &mut self,
        group_id: GroupId,
        member_id: MemberId,
    ) -> Result<LeaveOutcome<H>, SchedError> {
        let wake_on_leave = self.config.wake_on_leave;
        let group = self
            .groups
            .get_mut(&group_id)
            .ok_or(SchedError::GroupNotFound { group_id })?;

        let held = group.holder == Some(member_id);
        let successor = if wake_on_leave && held {
            group
                .members
                .next_after(member_id)
                .filter(|next| next.id != member_id)
                .map(|next| (next.id, next.handle.clone()))
        } else {
            None
        };

        let now_empty = match group.members.remove(member_id) {
            Removal::Removed { now_empty } => now_empty,
            Removal::NotFound => {
                return Err(SchedError::MemberNotFound {
                    group_id,
                    member_id,
                })
            }
        };

        if held {
            group.holder = None;
        }
        if let Some((next, _)) = &successor {
            group.holder = Some(*next);
            group.set_state(*next, MemberState::Ready);
        }

        let group_removed = now_empty && self.delete_if_empty(group_id);
        Ok(LeaveOutcome {
            group_removed,
            handoff: successor,
        })
    }

    /// Record that a woken member has resumed execution.
    ///
    /// Ignored if the member is gone or no longer holds possession.
    pub fn mark_running(&mut self, group_id: GroupId, member_id: MemberId) {
        if let Some(group) = self.groups.get_mut(&group_id) {
            if group.holder == Some(member_id) {
                group.set_state(member_id, MemberState::Running);
            }
        }
    }
}
