use crate::{Block, MembershipId, RandSource, ThreadRandom};

/// Proposes random, correctly formatted membership IDs inside a block.
///
/// Each candidate is `start + uniform(0..len)` over the block's range, which
/// spreads concurrent registrations targeting the same block across all of
/// its slots instead of having them race for the next sequential one. The
/// generator keeps no state between calls.
#[derive(Clone, Debug, Default)]
pub struct CandidateGenerator<R = ThreadRandom> {
    rng: R,
}

impl<R> CandidateGenerator<R>
where
    R: RandSource,
{
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Returns a random ID within `block`'s range.
    ///
    /// # Example
    /// ```
    /// use memberid::{Block, CandidateGenerator, ThreadRandom};
    ///
    /// let block = Block::new(7).unwrap();
    /// let candidates = CandidateGenerator::new(ThreadRandom);
    /// let id = candidates.candidate(block);
    /// assert!(id.is_in(block.range()));
    /// ```
    pub fn candidate(&self, block: Block) -> MembershipId {
        let range = block.range();
        // A block never spans more than BLOCK_SIZE suffixes.
        let offset = self.rng.rand_below(range.len() as u32);
        MembershipId::from_suffix_unchecked(range.start() as u32 + offset)
    }

    pub const fn rng(&self) -> &R {
        &self.rng
    }
}
