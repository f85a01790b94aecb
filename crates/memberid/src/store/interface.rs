use crate::{MembershipId, StoreError, UserId, UserInfo};
use std::sync::Arc;

/// The single monotonically increasing counter behind ordinal issuance.
///
/// Implementations must make [`CounterStore::increment`] a single atomic
/// read-modify-write at the storage layer (a row-locking `UPDATE ...
/// RETURNING`, a sequence object, an atomic integer). Two concurrent calls
/// must never observe the same value and no value may be skipped.
///
/// # Example
/// ```
/// use memberid::{CounterStore, StoreError};
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// struct Sequence(AtomicU64);
///
/// impl CounterStore for Sequence {
///     fn increment(&self) -> Result<u64, StoreError> {
///         Ok(self.0.fetch_add(1, Ordering::AcqRel) + 1)
///     }
///
///     fn current(&self) -> Result<u64, StoreError> {
///         Ok(self.0.load(Ordering::Acquire))
///     }
/// }
///
/// let seq = Sequence(AtomicU64::new(0));
/// assert_eq!(seq.increment().unwrap(), 1);
/// assert_eq!(seq.current().unwrap(), 1);
/// ```
pub trait CounterStore {
    /// Atomically increments the counter and returns the new value.
    fn increment(&self) -> Result<u64, StoreError>;

    /// Returns the current value without modifying it.
    fn current(&self) -> Result<u64, StoreError>;
}

/// Aggregate user counts used by statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssignmentCounts {
    pub total_users: u64,
    /// Users currently holding a membership ID.
    pub assigned: u64,
}

/// The persistent mapping between users and membership IDs.
///
/// Backends must enforce uniqueness of membership IDs themselves:
/// [`MembershipStore::assign`] returns [`StoreError::Conflict`] when another
/// user holds the ID, even if a prior [`MembershipStore::exists`] check said
/// it was free. IDs replaced by a later assignment are retired, and `exists`
/// keeps reporting them as taken.
pub trait MembershipStore {
    /// Whether `id` is, or ever was, assigned to a user.
    fn exists(&self, id: &MembershipId) -> Result<bool, StoreError>;

    /// The user currently holding `id`.
    fn find_by_membership_id(&self, id: &MembershipId) -> Result<Option<UserInfo>, StoreError>;

    /// The user with `user_id`, whether or not an ID is assigned.
    fn find_by_user_id(&self, user_id: UserId) -> Result<Option<UserInfo>, StoreError>;

    /// Upserts `id` onto `user_id`'s profile, replacing any previous ID.
    ///
    /// # Errors
    /// - [`StoreError::Conflict`] if `id` is held by another user or retired.
    /// - [`StoreError::UserNotFound`] if the user does not exist.
    fn assign(&self, user_id: UserId, id: &MembershipId) -> Result<(), StoreError>;

    fn counts(&self) -> Result<AssignmentCounts, StoreError>;
}

impl<T: CounterStore + ?Sized> CounterStore for &T {
    fn increment(&self) -> Result<u64, StoreError> {
        (**self).increment()
    }

    fn current(&self) -> Result<u64, StoreError> {
        (**self).current()
    }
}

impl<T: CounterStore + ?Sized> CounterStore for Arc<T> {
    fn increment(&self) -> Result<u64, StoreError> {
        (**self).increment()
    }

    fn current(&self) -> Result<u64, StoreError> {
        (**self).current()
    }
}

impl<T: MembershipStore + ?Sized> MembershipStore for &T {
    fn exists(&self, id: &MembershipId) -> Result<bool, StoreError> {
        (**self).exists(id)
    }

    fn find_by_membership_id(&self, id: &MembershipId) -> Result<Option<UserInfo>, StoreError> {
        (**self).find_by_membership_id(id)
    }

    fn find_by_user_id(&self, user_id: UserId) -> Result<Option<UserInfo>, StoreError> {
        (**self).find_by_user_id(user_id)
    }

    fn assign(&self, user_id: UserId, id: &MembershipId) -> Result<(), StoreError> {
        (**self).assign(user_id, id)
    }

    fn counts(&self) -> Result<AssignmentCounts, StoreError> {
        (**self).counts()
    }
}

impl<T: MembershipStore + ?Sized> MembershipStore for Arc<T> {
    fn exists(&self, id: &MembershipId) -> Result<bool, StoreError> {
        (**self).exists(id)
    }

    fn find_by_membership_id(&self, id: &MembershipId) -> Result<Option<UserInfo>, StoreError> {
        (**self).find_by_membership_id(id)
    }

    fn find_by_user_id(&self, user_id: UserId) -> Result<Option<UserInfo>, StoreError> {
        (**self).find_by_user_id(user_id)
    }

    fn assign(&self, user_id: UserId, id: &MembershipId) -> Result<(), StoreError> {
        (**self).assign(user_id, id)
    }

    fn counts(&self) -> Result<AssignmentCounts, StoreError> {
        (**self).counts()
    }
}
