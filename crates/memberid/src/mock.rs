//! Scripted sources and faulty stores shared by the unit tests.

use crate::{
    AssignmentCounts, CounterStore, MembershipId, MembershipStore, MemoryStore, RandSource,
    StoreError, UserId, UserInfo,
};
use core::cell::Cell;
use std::sync::atomic::{AtomicU32, Ordering};

/// Walks offsets `0, 1, 2, ...` modulo the bound, so a block with any free
/// slot is always found within `BLOCK_SIZE` attempts.
#[derive(Default)]
pub struct CyclingRand {
    next: Cell<u32>,
}

impl RandSource for CyclingRand {
    fn rand_below(&self, bound: u32) -> u32 {
        let n = self.next.get();
        self.next.set(n.wrapping_add(1));
        n % bound
    }
}

/// Always returns the same offset.
pub struct FixedRand(pub u32);

impl RandSource for FixedRand {
    fn rand_below(&self, bound: u32) -> u32 {
        self.0 % bound
    }
}

pub struct FailingCounter;

impl CounterStore for FailingCounter {
    fn increment(&self) -> Result<u64, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    fn current(&self) -> Result<u64, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }
}

/// A [`MemoryStore`] whose existence checks fail.
#[derive(Default)]
pub struct BrokenStore(pub MemoryStore);

impl MembershipStore for BrokenStore {
    fn exists(&self, _id: &MembershipId) -> Result<bool, StoreError> {
        Err(StoreError::unavailable("existence check timed out"))
    }

    fn find_by_membership_id(&self, id: &MembershipId) -> Result<Option<UserInfo>, StoreError> {
        self.0.find_by_membership_id(id)
    }

    fn find_by_user_id(&self, user_id: UserId) -> Result<Option<UserInfo>, StoreError> {
        self.0.find_by_user_id(user_id)
    }

    fn assign(&self, user_id: UserId, id: &MembershipId) -> Result<(), StoreError> {
        self.0.assign(user_id, id)
    }

    fn counts(&self) -> Result<AssignmentCounts, StoreError> {
        self.0.counts()
    }
}

/// A [`MemoryStore`] that loses the check-then-act race for its first
/// `conflicts` assignments: the ID passed `exists` but a concurrent writer
/// committed it first.
pub struct RacingStore {
    pub inner: MemoryStore,
    conflicts: AtomicU32,
}

impl RacingStore {
    pub fn new(conflicts: u32) -> Self {
        Self {
            inner: MemoryStore::new(),
            conflicts: AtomicU32::new(conflicts),
        }
    }
}

impl MembershipStore for RacingStore {
    fn exists(&self, id: &MembershipId) -> Result<bool, StoreError> {
        self.inner.exists(id)
    }

    fn find_by_membership_id(&self, id: &MembershipId) -> Result<Option<UserInfo>, StoreError> {
        self.inner.find_by_membership_id(id)
    }

    fn find_by_user_id(&self, user_id: UserId) -> Result<Option<UserInfo>, StoreError> {
        self.inner.find_by_user_id(user_id)
    }

    fn assign(&self, user_id: UserId, id: &MembershipId) -> Result<(), StoreError> {
        let lost_race = self
            .conflicts
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok();
        if lost_race {
            // The other writer keeps the ID.
            self.inner.reserve(*id);
            return Err(StoreError::Conflict {
                id: *id,
                owner: None,
            });
        }
        self.inner.assign(user_id, id)
    }

    fn counts(&self) -> Result<AssignmentCounts, StoreError> {
        self.inner.counts()
    }
}
