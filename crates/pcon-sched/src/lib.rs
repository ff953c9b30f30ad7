//! Processor containers.
//!
//! Cooperative, group-scoped round-robin scheduling. Callers join a group
//! (a "container"); inside a group exactly one member runs while the
//! others are parked. A running member hands the group to the next one
//! in join order with `switch`, and `leave` removes it. Groups appear on
//! first join and vanish with their last member.
//!
//! Layers:
//! - [`group`]: membership rings and the registry, pure state machines
//! - [`Scheduler`] / [`AsyncScheduler`]: the registry behind one lock,
//!   parking and waking threads or tokio tasks outside it
//! - [`channel`]: fixed-size command records and errno-style statuses
//!
//! # Quick start
//!
//! ```rust
//! use pcon_sched::{GroupId, Scheduler, SchedulerConfig, ThreadCaller};
//!
//! let scheduler = Scheduler::with_config(SchedulerConfig::default());
//! let me = ThreadCaller::current();
//!
//! scheduler.join(GroupId(7), &me).unwrap();   // first member: keeps running
//! scheduler.switch(GroupId(7), &me).unwrap(); // alone: no-op
//! scheduler.leave(GroupId(7), &me).unwrap();  // group is gone
//! assert!(scheduler.snapshot().is_empty());
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod group;
pub mod park;
pub mod scheduler;
pub mod stats;
pub mod types;

pub use channel::{ContainerCmd, ControlChannel, Op, CMD_LEN};
pub use config::SchedulerConfig;
pub use error::{ControlError, SchedError};
pub use group::{
    GroupSnapshot, JoinOutcome, LeaveOutcome, MemberSnapshot, Registry, RegistrySnapshot,
    SwitchOutcome,
};
pub use park::Parker;
pub use scheduler::{AsyncScheduler, Scheduler, TaskCaller, ThreadCaller};
pub use stats::SchedStats;
pub use types::{GroupId, MemberId, MemberState};
