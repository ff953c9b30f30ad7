/// Control channel: turns raw command records into scheduler calls.
///
/// Record layout (16 bytes, little-endian):
///
/// | bytes  | field              |
/// |--------|--------------------|
/// | 0..8   | group id (u64)     |
/// | 8..12  | operation selector |
/// | 12..16 | reserved, zero     |
///
/// Statuses follow the errno convention: `0` on success, a negative
/// errno otherwise.
use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::ControlError;
use crate::scheduler::{Scheduler, ThreadCaller};
use crate::types::GroupId;

/// Size of one encoded command record.
pub const CMD_LEN: usize = 16;

/// Operation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Join,
    Switch,
    Leave,
}

impl Op {
    pub fn selector(self) -> u32 {
        match self {
            Op::Join => 1,
            Op::Switch => 2,
            Op::Leave => 3,
        }
    }
}

impl TryFrom<u32> for Op {
    type Error = ControlError;

    fn try_from(selector: u32) -> Result<Self, Self::Error> {
        match selector {
            1 => Ok(Op::Join),
            2 => Ok(Op::Switch),
            3 => Ok(Op::Leave),
            other => Err(ControlError::UnknownOp(other)),
        }
    }
}

/// One decoded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerCmd {
    pub group_id: GroupId,
    pub op: Op,
}

impl ContainerCmd {
    pub fn new(op: Op, group_id: impl Into<GroupId>) -> Self {
        Self {
            group_id: group_id.into(),
            op,
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(CMD_LEN);
        buf.put_u64_le(self.group_id.0);
        buf.put_u32_le(self.op.selector());
        buf.put_u32_le(0);
        buf.freeze()
    }

    /// Decode a record. Trailing bytes past [`CMD_LEN`] are ignored.
    pub fn decode(mut raw: &[u8]) -> Result<Self, ControlError> {
        if raw.len() < CMD_LEN {
            return Err(ControlError::Truncated {
                len: raw.len(),
                need: CMD_LEN,
            });
        }
        let group_id = GroupId(raw.get_u64_le());
        let op = Op::try_from(raw.get_u32_le())?;
        Ok(Self { group_id, op })
    }
}

/// Entry point for callers that speak in command records.
#[derive(Clone, Copy)]
pub struct ControlChannel<'a> {
    scheduler: &'a Scheduler,
}

impl<'a> ControlChannel<'a> {
    pub fn new(scheduler: &'a Scheduler) -> Self {
        Self { scheduler }
    }

    /// Channel bound to [`Scheduler::global`].
    pub fn global() -> ControlChannel<'static> {
        ControlChannel::new(Scheduler::global())
    }

    /// Run a decoded command on behalf of `caller`. May block.
    pub fn call(&self, cmd: ContainerCmd, caller: &ThreadCaller) -> Result<(), ControlError> {
        match cmd.op {
            Op::Join => self.scheduler.join(cmd.group_id, caller)?,
            Op::Switch => self.scheduler.switch(cmd.group_id, caller)?,
            Op::Leave => self.scheduler.leave(cmd.group_id, caller)?,
        }
        Ok(())
    }

    /// Decode and run a raw record; returns the status code.
    pub fn dispatch(&self, raw: &[u8], caller: &ThreadCaller) -> i32 {
        let result = ContainerCmd::decode(raw).and_then(|cmd| self.call(cmd, caller));
        match result {
            Ok(()) => 0,
            Err(e) => {
                tracing::debug!("control: request from {} rejected: {e}", caller.id());
                e.status()
            }
        }
    }
}
