//! The allocator facade used by the registration flow.
//!
//! ```text
//! counter.increment() ─► ordinal ─► primary block ─► FallbackSearch ─► Allocation
//!                                                        │
//!                                   store.exists() ◄─────┘ (per candidate)
//! ```


use crate::{
    Allocation, AllocatorConfig, BlockAllocator, CounterStore, Error, FallbackSearch, LookupKey,
    MembershipId, MembershipStats, MembershipStore, RandSource, Result, StoreError, ThreadRandom,
    UserId, UserInfo,
};
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Allocates, looks up and regenerates membership IDs.
///
/// The only cross-request serialization point is the [`CounterStore`]
/// increment. Everything else runs in parallel, including several requests
/// searching the same block; uniqueness rests on the existence check plus the
/// store's own uniqueness constraint, which [`Self::assign`] handles by
/// searching again for the same ordinal.
///
/// ## Example
/// ```
/// use memberid::{AtomicCounter, MemoryStore, MembershipIdService, UserProfile};
///
/// let service = MembershipIdService::new(AtomicCounter::new(), MemoryStore::new());
/// let user = service.store().add_user(UserProfile::with_email("ada@example.com"));
///
/// let allocation = service.assign(user).unwrap();
/// assert_eq!(allocation.ordinal, 1);
/// assert!(MembershipIdService::<AtomicCounter, MemoryStore>::validate_format(
///     &allocation.id.to_string()
/// ));
///
/// // Registration happens once; `regenerate` replaces the ID.
/// assert!(service.assign(user).is_err());
/// assert_ne!(service.regenerate(user).unwrap(), allocation.id);
///
/// let info = service.lookup_by_membership_id(&allocation.id.to_string()).unwrap();
/// assert_eq!(info.user_id, user);
/// ```
pub struct MembershipIdService<C, S, R = ThreadRandom> {
    counter: C,
    store: S,
    search: FallbackSearch<R>,
    config: AllocatorConfig,
}

impl<C, S> MembershipIdService<C, S, ThreadRandom>
where
    C: CounterStore,
    S: MembershipStore,
{
    /// Creates a service with the default [`AllocatorConfig`] and the
    /// thread-local RNG.
    pub fn new(counter: C, store: S) -> Self {
        Self::build(counter, store, AllocatorConfig::default(), ThreadRandom)
    }

    /// # Errors
    /// [`Error::InvalidConfig`] if `config` does not validate.
    pub fn with_config(counter: C, store: S, config: AllocatorConfig) -> Result<Self> {
        Self::with_rand(counter, store, config, ThreadRandom)
    }

    /// Returns `true` if `id` is `269` followed by exactly five ASCII digits.
    /// Pure, no I/O.
    pub fn validate_format(id: &str) -> bool {
        crate::validate_format(id)
    }
}

impl<C, S, R> MembershipIdService<C, S, R>
where
    C: CounterStore,
    S: MembershipStore,
    R: RandSource,
{
    /// Creates a service drawing candidate offsets from `rng`.
    ///
    /// # Errors
    /// [`Error::InvalidConfig`] if `config` does not validate.
    pub fn with_rand(counter: C, store: S, config: AllocatorConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(counter, store, config, rng))
    }

    fn build(counter: C, store: S, config: AllocatorConfig, rng: R) -> Self {
        let allocator = BlockAllocator::new(rng, config.max_attempts);
        Self {
            counter,
            store,
            search: FallbackSearch::new(allocator, config.max_fallback_blocks),
            config,
        }
    }

    pub const fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    pub const fn counter(&self) -> &C {
        &self.counter
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns an ID that is free at the time of the call.
    ///
    /// The ID is not persisted and nothing is reserved, so two calls may
    /// return the same ID until one of them is stored. Registration should
    /// go through [`Self::assign`], which allocates and persists in one step.
    ///
    /// # Errors
    /// - [`Error::CounterUnavailable`] if the counter could not be incremented
    /// - [`Error::Storage`] if an existence check failed
    /// - [`Error::CapacityExhausted`] if no searched block had room
    pub fn generate_unique_id(&self) -> Result<MembershipId> {
        self.allocate().map(|allocation| allocation.id)
    }

    /// Like [`Self::generate_unique_id`], but reports the ordinal consumed and
    /// where in the search the ID was found.
    ///
    /// The ordinal is consumed even when the search then fails.
    ///
    /// # Errors
    /// See [`Self::generate_unique_id`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn allocate(&self) -> Result<Allocation> {
        let ordinal = self.counter.increment().map_err(|err| {
            #[cfg(feature = "tracing")]
            tracing::error!(error = %err, "failed to increment membership sequence");
            Error::CounterUnavailable(err)
        })?;
        self.search.search(&self.store, ordinal)
    }

    /// Allocates an ID and persists it onto `user_id`'s profile. A user is
    /// registered once; use [`Self::regenerate`] to replace an existing ID.
    ///
    /// # Errors
    /// - [`Error::NotFound`] if the user does not exist
    /// - [`Error::AlreadyAssigned`] if the user already holds an ID
    /// - [`Error::Storage`] wrapping [`StoreError::Conflict`] once conflicts
    ///   run out
    /// - anything [`Self::allocate`] returns
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self), fields(user = %user_id)))]
    pub fn assign(&self, user_id: UserId) -> Result<Allocation> {
        let info = self
            .store
            .find_by_user_id(user_id)?
            .ok_or(Error::NotFound(LookupKey::UserId(user_id)))?;
        if info.membership_id.is_some() {
            return Err(Error::AlreadyAssigned(user_id));
        }

        self.allocate_and_store(user_id)
    }

    /// Allocates and writes the ID, overwriting whatever the user held.
    ///
    /// When the store's uniqueness constraint rejects an ID that passed the
    /// existence check, the candidate is treated as taken and the search
    /// runs again for the same ordinal, up to `max_assign_conflicts` times.
    fn allocate_and_store(&self, user_id: UserId) -> Result<Allocation> {
        let mut allocation = self.allocate()?;
        let mut conflicts = 0;
        loop {
            match self.store.assign(user_id, &allocation.id) {
                Ok(()) => return Ok(allocation),
                Err(StoreError::Conflict { .. }) if conflicts < self.config.max_assign_conflicts => {
                    conflicts += 1;
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        id = %allocation.id,
                        ordinal = allocation.ordinal,
                        conflicts,
                        "membership id taken between check and insert; searching again"
                    );
                    allocation = self.search.search(&self.store, allocation.ordinal)?;
                }
                Err(StoreError::UserNotFound(user_id)) => {
                    return Err(Error::NotFound(LookupKey::UserId(user_id)));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Looks up the user holding `id`.
    ///
    /// # Errors
    /// - [`Error::InvalidFormat`] before any query if `id` is malformed
    /// - [`Error::NotFound`] if no user holds the ID
    /// - [`Error::AccountDisabled`] if the holder is deactivated
    pub fn lookup_by_membership_id(&self, id: &str) -> Result<UserInfo> {
        let id: MembershipId = id.parse()?;
        let info = self
            .store
            .find_by_membership_id(&id)?
            .ok_or(Error::NotFound(LookupKey::MembershipId(id)))?;

        if !info.is_active {
            return Err(Error::AccountDisabled(info.user_id));
        }
        Ok(info)
    }

    /// Returns the ID assigned to `user_id`.
    ///
    /// # Errors
    /// [`Error::NotFound`] if the user does not exist or has no ID yet.
    pub fn lookup_by_user_id(&self, user_id: UserId) -> Result<MembershipId> {
        self.store
            .find_by_user_id(user_id)?
            .and_then(|info| info.membership_id)
            .ok_or(Error::NotFound(LookupKey::UserId(user_id)))
    }

    /// Replaces `user_id`'s ID with a freshly allocated one, or assigns one if
    /// the user had none. The previous ID is retired, not returned to the
    /// free pool.
    ///
    /// # Errors
    /// [`Error::NotFound`] if the user does not exist, plus anything
    /// [`Self::assign`] returns other than [`Error::AlreadyAssigned`].
    pub fn regenerate(&self, user_id: UserId) -> Result<MembershipId> {
        #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
        let previous = self
            .store
            .find_by_user_id(user_id)?
            .ok_or(Error::NotFound(LookupKey::UserId(user_id)))?
            .membership_id;

        let allocation = self.allocate_and_store(user_id)?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            user = %user_id,
            previous = ?previous.map(|id| id.to_string()),
            id = %allocation.id,
            "regenerated membership id"
        );

        Ok(allocation.id)
    }

    /// Reports user counts and the counter position.
    ///
    /// # Errors
    /// [`Error::CounterUnavailable`] or [`Error::Storage`] if either read
    /// fails.
    pub fn stats(&self) -> Result<MembershipStats> {
        let counts = self.store.counts()?;
        let current = self
            .counter
            .current()
            .map_err(Error::CounterUnavailable)?;
        Ok(MembershipStats::new(counts, current))
    }
}
