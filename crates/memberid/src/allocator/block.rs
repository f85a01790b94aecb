use crate::{
    Block, BlockOutcome, CandidateGenerator, DEFAULT_MAX_ATTEMPTS, MembershipStore, RandSource,
    StoreError, ThreadRandom,
};
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Finds a free ID inside one block with bounded random retry.
///
/// Each attempt draws a candidate and performs a single existence lookup, so
/// no "list free slots" query is ever needed. Lightly occupied blocks, the
/// common case, resolve on the first or second attempt.
#[derive(Clone, Debug)]
pub struct BlockAllocator<R = ThreadRandom> {
    candidates: CandidateGenerator<R>,
    max_attempts: u32,
}

impl Default for BlockAllocator<ThreadRandom> {
    fn default() -> Self {
        Self::new(ThreadRandom, DEFAULT_MAX_ATTEMPTS)
    }
}

impl<R> BlockAllocator<R>
where
    R: RandSource,
{
    pub const fn new(rng: R, max_attempts: u32) -> Self {
        Self {
            candidates: CandidateGenerator::new(rng),
            max_attempts,
        }
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Searches `block` for an ID that `store` reports as unused.
    ///
    /// # Returns
    /// - `Ok(BlockOutcome::Found { .. })`: a free candidate
    /// - `Ok(BlockOutcome::Exhausted { .. })`: `max_attempts` candidates were
    ///   all taken
    ///
    /// # Errors
    /// Propagates any failure of the existence check.
    ///
    /// # Example
    /// ```
    /// use memberid::{Block, BlockAllocator, MemoryStore, ThreadRandom};
    ///
    /// let store = MemoryStore::new();
    /// let allocator = BlockAllocator::new(ThreadRandom, 100);
    /// let block = Block::new(3).unwrap();
    ///
    /// let id = allocator.allocate_in_block(&store, block).unwrap().found().unwrap();
    /// assert_eq!(id.block(), block);
    /// ```
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip(self, store), fields(block = block.index()))
    )]
    pub fn allocate_in_block<S>(&self, store: &S, block: Block) -> Result<BlockOutcome, StoreError>
    where
        S: MembershipStore + ?Sized,
    {
        for attempt in 1..=self.max_attempts {
            let id = self.candidates.candidate(block);
            if !store.exists(&id)? {
                return Ok(BlockOutcome::Found {
                    id,
                    attempts: attempt,
                });
            }
        }

        #[cfg(feature = "tracing")]
        tracing::warn!(
            block = block.index(),
            attempts = self.max_attempts,
            "block exhausted"
        );

        Ok(BlockOutcome::Exhausted {
            attempts: self.max_attempts,
        })
    }
}
