use crate::{
    AssignmentCounts, Block, CounterStore, MembershipId, MembershipStore, StoreError, UserId,
    UserInfo, UserProfile,
};
use parking_lot::RwLock;
use portable_atomic::{AtomicU64, Ordering};
use std::collections::{HashMap, HashSet};

/// A lock-free, process-local [`CounterStore`].
///
/// The counter lives in an [`AtomicU64`], so concurrent increments within one
/// process never collide. It is **not** shared across processes: a
/// multi-instance deployment needs a counter backed by shared storage.
///
/// ## Recommended When
/// - Tests, benchmarks and single-process deployments
/// - You want a reference implementation of the counter contract
#[derive(Debug, Default)]
pub struct AtomicCounter {
    #[cfg(feature = "cache-padded")]
    value: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    value: AtomicU64,
}

impl AtomicCounter {
    /// Creates a counter that has issued nothing yet.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a counter restored to `count` previously issued ordinals. The
    /// next increment returns `count + 1`.
    pub fn starting_at(count: u64) -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            value: crossbeam_utils::CachePadded::new(AtomicU64::new(count)),
            #[cfg(not(feature = "cache-padded"))]
            value: AtomicU64::new(count),
        }
    }
}

impl CounterStore for AtomicCounter {
    fn increment(&self) -> Result<u64, StoreError> {
        self.value
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_add(1))
            .map(|prev| prev + 1)
            .map_err(|_| StoreError::unavailable("sequence counter overflow"))
    }

    fn current(&self) -> Result<u64, StoreError> {
        Ok(self.value.load(Ordering::Acquire))
    }
}

struct UserRow {
    profile: UserProfile,
    membership_id: Option<MembershipId>,
}

#[derive(Default)]
struct Inner {
    next_user: u64,
    users: HashMap<UserId, UserRow>,
    holders: HashMap<MembershipId, UserId>,
    // Taken IDs with no current holder: replaced by regeneration or reserved.
    retired: HashSet<MembershipId>,
}

impl Inner {
    fn info(&self, user_id: UserId) -> Option<UserInfo> {
        self.users
            .get(&user_id)
            .map(|row| UserInfo::from_profile(user_id, row.membership_id, &row.profile))
    }
}

/// An in-memory [`MembershipStore`] guarded by a single [`RwLock`].
///
/// The write lock makes [`MembershipStore::assign`] the uniqueness
/// constraint: a second writer for the same ID always sees the first and
/// gets [`StoreError::Conflict`].
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a user without a membership ID and returns its ID. User IDs
    /// start at 1.
    pub fn add_user(&self, profile: UserProfile) -> UserId {
        let mut inner = self.inner.write();
        inner.next_user += 1;
        let user_id = UserId(inner.next_user);
        inner.users.insert(
            user_id,
            UserRow {
                profile,
                membership_id: None,
            },
        );
        user_id
    }

    /// Activates or deactivates a user.
    ///
    /// # Errors
    /// [`StoreError::UserNotFound`] if the user does not exist.
    pub fn set_active(&self, user_id: UserId, active: bool) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let row = inner
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::UserNotFound(user_id))?;
        row.profile.is_active = active;
        Ok(())
    }

    /// Marks `id` as taken without assigning it to anyone. Returns `false` if
    /// it was already taken.
    pub fn reserve(&self, id: MembershipId) -> bool {
        let mut inner = self.inner.write();
        if inner.holders.contains_key(&id) {
            return false;
        }
        inner.retired.insert(id)
    }

    /// Reserves every ID in `block`, returning how many were newly reserved.
    pub fn reserve_block(&self, block: Block) -> usize {
        let range = block.range();
        (range.start()..=range.end())
            .filter_map(|suffix| MembershipId::from_suffix(suffix as u32))
            .filter(|id| self.reserve(*id))
            .count()
    }

    /// Number of IDs that are taken, held or retired.
    pub fn taken(&self) -> usize {
        let inner = self.inner.read();
        inner.holders.len() + inner.retired.len()
    }
}

impl MembershipStore for MemoryStore {
    fn exists(&self, id: &MembershipId) -> Result<bool, StoreError> {
        let inner = self.inner.read();
        Ok(inner.holders.contains_key(id) || inner.retired.contains(id))
    }

    fn find_by_membership_id(&self, id: &MembershipId) -> Result<Option<UserInfo>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .holders
            .get(id)
            .and_then(|user_id| inner.info(*user_id)))
    }

    fn find_by_user_id(&self, user_id: UserId) -> Result<Option<UserInfo>, StoreError> {
        Ok(self.inner.read().info(user_id))
    }

    fn assign(&self, user_id: UserId, id: &MembershipId) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let Inner {
            users,
            holders,
            retired,
            ..
        } = &mut *inner;

        let row = users
            .get_mut(&user_id)
            .ok_or(StoreError::UserNotFound(user_id))?;

        match holders.get(id) {
            Some(owner) if *owner == user_id => return Ok(()),
            Some(owner) => {
                return Err(StoreError::Conflict {
                    id: *id,
                    owner: Some(*owner),
                });
            }
            None if retired.contains(id) => {
                return Err(StoreError::Conflict {
                    id: *id,
                    owner: None,
                });
            }
            None => {}
        }

        if let Some(previous) = row.membership_id.replace(*id) {
            holders.remove(&previous);
            retired.insert(previous);
        }
        holders.insert(*id, user_id);
        Ok(())
    }

    fn counts(&self) -> Result<AssignmentCounts, StoreError> {
        let inner = self.inner.read();
        Ok(AssignmentCounts {
            total_users: inner.users.len() as u64,
            assigned: inner
                .users
                .values()
                .filter(|row| row.membership_id.is_some())
                .count() as u64,
        })
    }
}
