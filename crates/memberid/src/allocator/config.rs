use crate::{Error, Result};

/// Attempts made inside one block before it is treated as full.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Blocks searched in each direction once the primary block is full.
pub const DEFAULT_MAX_FALLBACK_BLOCKS: u32 = 10;

/// Extra allocations made when the store's uniqueness constraint rejects an
/// ID that passed the existence check.
pub const DEFAULT_MAX_ASSIGN_CONFLICTS: u32 = 3;

/// Tuning knobs for [`MembershipIdService`].
///
/// [`MembershipIdService`]: crate::MembershipIdService
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, rename_all = "camelCase")
)]
pub struct AllocatorConfig {
    pub max_attempts: u32,
    pub max_fallback_blocks: u32,
    pub max_assign_conflicts: u32,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_fallback_blocks: DEFAULT_MAX_FALLBACK_BLOCKS,
            max_assign_conflicts: DEFAULT_MAX_ASSIGN_CONFLICTS,
        }
    }
}

impl AllocatorConfig {
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub const fn with_max_fallback_blocks(mut self, max_fallback_blocks: u32) -> Self {
        self.max_fallback_blocks = max_fallback_blocks;
        self
    }

    #[must_use]
    pub const fn with_max_assign_conflicts(mut self, max_assign_conflicts: u32) -> Self {
        self.max_assign_conflicts = max_assign_conflicts;
        self
    }

    /// Upper bound on the blocks a single allocation may search.
    pub const fn max_blocks_searched(&self) -> u32 {
        1 + 2 * self.max_fallback_blocks
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `max_attempts` is zero, which would
    /// make every block look full.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::InvalidConfig("max_attempts must be greater than 0"));
        }
        Ok(())
    }
}
