use crate::{MembershipId, UserId};

/// Failures reported by a [`CounterStore`] or [`MembershipStore`] backend.
///
/// [`CounterStore`]: crate::CounterStore
/// [`MembershipStore`]: crate::MembershipStore
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The backend could not be reached or refused the operation.
    #[error("store unavailable: {context}")]
    Unavailable { context: String },

    /// The uniqueness constraint on membership IDs rejected a write because
    /// another user already holds (or once held) `id`.
    #[error("membership id {id} is already taken")]
    Conflict {
        id: MembershipId,
        /// The current holder, if the ID has not been retired.
        owner: Option<UserId>,
    },

    /// The user an operation targeted does not exist.
    #[error("user {0} does not exist")]
    UserNotFound(UserId),
}

impl StoreError {
    pub fn unavailable(context: impl Into<String>) -> Self {
        Self::Unavailable {
            context: context.into(),
        }
    }
}
