use crate::MembershipId;

/// The result of searching a single block for a free ID.
///
/// - [`BlockOutcome::Found`] carries a candidate that passed the existence
///   check.
/// - [`BlockOutcome::Exhausted`] means every attempt hit a taken ID. This is
///   a statistical verdict ("the block is full enough"), not proof that no
///   free slot remains.
///
/// Modeling exhaustion as a value lets the fallback search chain blocks as a
/// plain sequence of fallible steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    Found {
        id: MembershipId,
        /// Attempts spent, including the successful one.
        attempts: u32,
    },
    Exhausted {
        attempts: u32,
    },
}

impl BlockOutcome {
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    pub const fn found(self) -> Option<MembershipId> {
        match self {
            Self::Found { id, .. } => Some(id),
            Self::Exhausted { .. } => None,
        }
    }

    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Found { attempts, .. } | Self::Exhausted { attempts } => *attempts,
        }
    }
}
