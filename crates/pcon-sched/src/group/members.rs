/// Membership list: the round-robin ring of one group.
///
/// Insertion order is join order; `next_after` wraps from the tail back
/// to the head.
use std::collections::TryReserveError;

use crate::types::{MemberId, MemberState};

/// One participating execution context.
///
/// `handle` is whatever the front-end needs to resume the context. The
/// list never touches the context itself, only the record.
#[derive(Debug, Clone)]
pub struct Member<H> {
    pub id: MemberId,
    pub handle: H,
    pub state: MemberState,
}

impl<H> Member<H> {
    pub fn new(id: MemberId, handle: H) -> Self {
        Self {
            id,
            handle,
            state: MemberState::Parked,
        }
    }
}

/// Result of [`MembershipList::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// No member with that identity.
    NotFound,
    /// Removed; `now_empty` tells whether the list became empty.
    Removed { now_empty: bool },
}

/// Ordered members of one group.
#[derive(Debug, Clone)]
pub struct MembershipList<H> {
    members: Vec<Member<H>>,
}

impl<H> Default for MembershipList<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> MembershipList<H> {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: MemberId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: MemberId) -> Option<&Member<H>> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn get_mut(&mut self, id: MemberId) -> Option<&mut Member<H>> {
        self.members.iter_mut().find(|m| m.id == id)
    }

    /// Members in ring order, head first.
    pub fn iter(&self) -> impl Iterator<Item = &Member<H>> {
        self.members.iter()
    }

    fn position(&self, id: MemberId) -> Option<usize> {
        self.members.iter().position(|m| m.id == id)
    }

    /// Append at the tail.
    ///
    /// Growth goes through `try_reserve`, so an allocation failure is
    /// returned instead of aborting and the list is left untouched.
    pub fn append(&mut self, member: Member<H>) -> Result<(), TryReserveError> {
        self.members.try_reserve(1)?;
        self.members.push(member);
        Ok(())
    }

    /// Remove the member with `id`, preserving the order of the others.
    pub fn remove(&mut self, id: MemberId) -> Removal {
        match self.position(id) {
            Some(idx) => {
                self.members.remove(idx);
                Removal::Removed {
                    now_empty: self.members.is_empty(),
                }
            }
            None => Removal::NotFound,
        }
    }

    /// The member that follows `id` in the ring.
    ///
    /// Wraps from the last member to the first. An absent `id` yields the
    /// head. A single-member list yields that member. `None` only when
    /// the list is empty.
    pub fn next_after(&self, id: MemberId) -> Option<&Member<H>> {
        let next = match self.position(id) {
            Some(idx) => (idx + 1) % self.members.len(),
            None => 0,
        };
        self.members.get(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(ids: &[u64]) -> MembershipList<()> {
        let mut list = MembershipList::new();
        for &id in ids {
            list.append(Member::new(MemberId(id), ())).unwrap();
        }
        list
    }

    fn next(list: &MembershipList<()>, id: u64) -> Option<u64> {
        list.next_after(MemberId(id)).map(|m| m.id.0)
    }

    #[test]
    fn append_keeps_join_order() {
        let list = ring(&[3, 1, 2]);
        let order: Vec<u64> = list.iter().map(|m| m.id.0).collect();
        assert_eq!(order, vec![3, 1, 2]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn next_after_walks_and_wraps() {
        let list = ring(&[1, 2, 3]);
        assert_eq!(next(&list, 1), Some(2));
        assert_eq!(next(&list, 2), Some(3));
        assert_eq!(next(&list, 3), Some(1));
    }

    #[test]
    fn next_after_single_member_is_self() {
        let list = ring(&[7]);
        assert_eq!(next(&list, 7), Some(7));
    }

    #[test]
    fn next_after_absent_returns_head() {
        let list = ring(&[4, 5]);
        assert_eq!(next(&list, 99), Some(4));
    }

    #[test]
    fn next_after_empty_is_none() {
        let list = ring(&[]);
        assert_eq!(next(&list, 1), None);
    }

    #[test]
    fn remove_reports_emptiness() {
        let mut list = ring(&[1, 2]);
        assert_eq!(list.remove(MemberId(1)), Removal::Removed { now_empty: false });
        assert_eq!(list.remove(MemberId(2)), Removal::Removed { now_empty: true });
        assert!(list.is_empty());
    }

    #[test]
    fn remove_absent_is_not_found() {
        let mut list = ring(&[1]);
        assert_eq!(list.remove(MemberId(2)), Removal::NotFound);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn remove_middle_closes_ring() {
        let mut list = ring(&[1, 2, 3]);
        list.remove(MemberId(2));
        assert_eq!(next(&list, 1), Some(3));
        assert_eq!(next(&list, 3), Some(1));
    }

    #[test]
    fn new_members_start_parked() {
        let member = Member::new(MemberId(1), ());
        assert_eq!(member.state, MemberState::Parked);
    }
}
