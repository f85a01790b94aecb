//! Error types for membership ID allocation and lookup.
//!
//! Storage faults and capacity exhaustion are fatal to the request that hit
//! them and must fail the registration rather than leave a user without an
//! ID. Format and lookup failures are ordinary results returned to the
//! caller.

use crate::{MembershipId, StoreError, UserId};
use core::fmt;

/// A result type defaulting to this crate's [`enum@Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// The key a failed lookup was made with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LookupKey {
    MembershipId(MembershipId),
    UserId(UserId),
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MembershipId(id) => write!(f, "membership id {id}"),
            Self::UserId(id) => write!(f, "user {id}"),
        }
    }
}

/// All errors surfaced by [`MembershipIdService`].
///
/// Running out of attempts inside a single block is not an error; it is the
/// [`BlockOutcome::Exhausted`] value and is absorbed by the fallback search.
///
/// [`MembershipIdService`]: crate::MembershipIdService
/// [`BlockOutcome::Exhausted`]: crate::BlockOutcome::Exhausted
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The atomic increment could not be performed. No ordinal was issued,
    /// so the request can be retried from scratch.
    #[error("sequence counter unavailable")]
    CounterUnavailable(#[source] StoreError),

    /// Any other storage fault (existence check, lookup, assignment).
    #[error("membership store failure")]
    Storage(#[from] StoreError),

    /// The primary block and every fallback block were exhausted. This is an
    /// operator-facing incident and is not retried automatically.
    #[error(
        "membership id capacity exhausted: ordinal {ordinal} (primary block {primary_block}), {blocks_searched} blocks searched"
    )]
    CapacityExhausted {
        ordinal: u64,
        /// Target block index; may lie past the ID ceiling.
        primary_block: u64,
        blocks_searched: usize,
    },

    /// A caller supplied a string that is not a well-formed membership ID.
    #[error("invalid membership id format: {0:?}")]
    InvalidFormat(String),

    #[error("{0} not found")]
    NotFound(LookupKey),

    /// The holder of the ID exists but has been deactivated.
    #[error("account {0} is disabled")]
    AccountDisabled(UserId),

    /// Registration found an ID already on the profile. Replacing it is
    /// [`regenerate`](crate::MembershipIdService::regenerate)'s job.
    #[error("user {0} already has a membership id")]
    AlreadyAssigned(UserId),

    #[error("invalid allocator configuration: {0}")]
    InvalidConfig(&'static str),
}

impl Error {
    /// Whether starting the whole operation again may succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CounterUnavailable(_) | Self::Storage(StoreError::Unavailable { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(Error::CounterUnavailable(StoreError::unavailable("down")).is_retryable());
        assert!(Error::Storage(StoreError::unavailable("down")).is_retryable());
        assert!(!Error::Storage(StoreError::UserNotFound(UserId(1))).is_retryable());
        assert!(
            !Error::CapacityExhausted {
                ordinal: 1,
                primary_block: 0,
                blocks_searched: 11
            }
            .is_retryable()
        );
        assert!(!Error::InvalidFormat("x".into()).is_retryable());
        assert!(!Error::AlreadyAssigned(UserId(1)).is_retryable());
    }

    #[test]
    fn messages_name_the_key() {
        let err = Error::NotFound(LookupKey::MembershipId(
            MembershipId::from_suffix(1).unwrap(),
        ));
        assert_eq!(err.to_string(), "membership id 26900001 not found");

        let err = Error::NotFound(LookupKey::UserId(UserId(9)));
        assert_eq!(err.to_string(), "user 9 not found");

        let err = Error::AlreadyAssigned(UserId(9));
        assert_eq!(err.to_string(), "user 9 already has a membership id");
    }
}
