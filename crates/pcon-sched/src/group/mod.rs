/// Groups and their membership rings.
///
/// Pure state machines: the registry decides, the scheduler front-ends
/// park and wake.
pub mod members;
pub mod registry;
pub mod types;

pub use members::{Member, MembershipList, Removal};
pub use registry::{Group, Registry};
pub use types::{
    GroupSnapshot, JoinOutcome, LeaveOutcome, MemberSnapshot, RegistrySnapshot, SwitchOutcome,
};
