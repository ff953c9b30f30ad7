/// Outcomes returned by the registry and the snapshot types used for
/// diagnostics.
///
/// The registry never parks or wakes anyone itself. Each operation
/// returns an outcome that the scheduler front-end executes after the
/// registry lock has been released.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{GroupId, MemberId, MemberState};

// ── Outcomes ─────────────────────────────────────────────────────────────

/// What the joining caller must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Sole member of a freshly created group: keep running.
    Running,
    /// Caller was already in the group: nothing changed, keep running.
    AlreadyMember,
    /// Appended behind existing members: park until a handoff.
    Park,
}

impl JoinOutcome {
    pub fn must_park(self) -> bool {
        self == JoinOutcome::Park
    }
}

/// What the switching caller must do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome<H> {
    /// No one else to hand off to.
    Stay,
    /// Wake `wake`, then park.
    Handoff { target: MemberId, wake: H },
}

/// Result of a leave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome<H> {
    /// The group became empty and was removed from the registry.
    pub group_removed: bool,
    /// Successor that inherits possession (only with wake-on-leave).
    pub handoff: Option<(MemberId, H)>,
}

// ── Snapshots ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSnapshot {
    pub member_id: MemberId,
    pub state: MemberState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub group_id: GroupId,
    /// Member holding possession, if any.
    pub holder: Option<MemberId>,
    /// Members in ring order.
    pub members: Vec<MemberSnapshot>,
}

impl GroupSnapshot {
    pub fn member_ids(&self) -> Vec<MemberId> {
        self.members.iter().map(|m| m.member_id).collect()
    }

    pub fn state_of(&self, member_id: MemberId) -> Option<MemberState> {
        self.members
            .iter()
            .find(|m| m.member_id == member_id)
            .map(|m| m.state)
    }
}

/// Point-in-time copy of the whole registry, groups sorted by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub groups: Vec<GroupSnapshot>,
}

impl RegistrySnapshot {
    pub fn group(&self, group_id: GroupId) -> Option<&GroupSnapshot> {
        self.groups.iter().find(|g| g.group_id == group_id)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl fmt::Display for RegistrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.groups.is_empty() {
            return f.write_str("(no groups)");
        }
        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "group {}:", group.group_id)?;
            for member in &group.members {
                write!(f, " {}({:?})", member.member_id, member.state)?;
            }
        }
        Ok(())
    }
}
