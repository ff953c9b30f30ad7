use std::collections::TryReserveError;

use crate::types::{GroupId, MemberId};

/// errno values used by the status-code convention of the control channel.
pub const ENOENT: i32 = 2;
pub const ESRCH: i32 = 3;
pub const ENOMEM: i32 = 12;
pub const EINVAL: i32 = 22;
pub const ENOTTY: i32 = 25;

/// Scheduler errors.
///
/// None of these are fatal; each is local to the call that produced it
/// and leaves the registry unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedError {
    #[error("resource exhausted in group {group_id}: {reason}")]
    ResourceExhausted { group_id: GroupId, reason: String },

    #[error("group {group_id} not found")]
    GroupNotFound { group_id: GroupId },

    #[error("member {member_id} not found in group {group_id}")]
    MemberNotFound {
        group_id: GroupId,
        member_id: MemberId,
    },
}

impl SchedError {
    /// Allocation failure while growing the registry or a membership list.
    pub(crate) fn allocation(group_id: GroupId, e: TryReserveError) -> Self {
        SchedError::ResourceExhausted {
            group_id,
            reason: e.to_string(),
        }
    }

    /// Negative errno-style status for the control channel.
    pub fn status(&self) -> i32 {
        match self {
            SchedError::ResourceExhausted { .. } => -ENOMEM,
            SchedError::GroupNotFound { .. } => -ENOENT,
            SchedError::MemberNotFound { .. } => -ESRCH,
        }
    }
}

/// Control-channel errors: a malformed request, or a scheduler error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    #[error("command record too short: {len} bytes (need {need})")]
    Truncated { len: usize, need: usize },

    #[error("unknown operation selector: {0}")]
    UnknownOp(u32),

    #[error(transparent)]
    Sched(#[from] SchedError),
}

impl ControlError {
    pub fn status(&self) -> i32 {
        match self {
            ControlError::Truncated { .. } => -EINVAL,
            ControlError::UnknownOp(_) => -ENOTTY,
            ControlError::Sched(e) => e.status(),
        }
    }
}
