use crate::{
    Block, BlockAllocator, BlockOutcome, DEFAULT_MAX_FALLBACK_BLOCKS, Error, MembershipId,
    MembershipStore, RandSource, Result, ThreadRandom, block_index_of,
};
use core::fmt;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Which stage of the fallback search produced an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum SearchPhase {
    /// The block computed directly from the ordinal.
    Primary,
    /// `primary + 1 ..= primary + window`. Newer blocks are emptier, so this
    /// direction is tried first.
    Forward,
    /// `primary - 1 ..= primary - window`, only once forward is exhausted.
    Backward,
}

impl fmt::Display for SearchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Primary => "primary",
            Self::Forward => "forward",
            Self::Backward => "backward",
        })
    }
}

/// The order in which blocks are searched for one ordinal.
///
/// Yields the primary block, then up to `window` blocks forward (stopping at
/// the ceiling), then up to `window` blocks backward (stopping at zero).
/// Indices outside `0..=MAX_BLOCK` are never yielded.
///
/// ```
/// use memberid::{SearchPhase, SearchPlan};
///
/// let plan: Vec<_> = SearchPlan::new(1, 2)
///     .map(|(phase, block)| (phase, block.index()))
///     .collect();
///
/// assert_eq!(
///     plan,
///     [
///         (SearchPhase::Primary, 1),
///         (SearchPhase::Forward, 2),
///         (SearchPhase::Forward, 3),
///         (SearchPhase::Backward, 0),
///     ]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct SearchPlan {
    primary: u64,
    window: u64,
    phase: SearchPhase,
    step: u64,
}

impl SearchPlan {
    pub const fn new(primary: u64, window: u32) -> Self {
        Self {
            primary,
            window: window as u64,
            phase: SearchPhase::Primary,
            step: 0,
        }
    }
}

impl Iterator for SearchPlan {
    type Item = (SearchPhase, Block);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.phase {
                SearchPhase::Primary => {
                    self.phase = SearchPhase::Forward;
                    if let Some(block) = Block::new(self.primary) {
                        return Some((SearchPhase::Primary, block));
                    }
                }
                SearchPhase::Forward => {
                    self.step += 1;
                    let next = (self.step <= self.window)
                        .then(|| self.primary.checked_add(self.step))
                        .flatten()
                        .and_then(Block::new);
                    match next {
                        Some(block) => return Some((SearchPhase::Forward, block)),
                        None => {
                            self.phase = SearchPhase::Backward;
                            self.step = 0;
                        }
                    }
                }
                SearchPhase::Backward => {
                    if self.step >= self.window || self.step >= self.primary {
                        return None;
                    }
                    self.step += 1;
                    // Past the ceiling only when the primary block itself was.
                    if let Some(block) = Block::new(self.primary - self.step) {
                        return Some((SearchPhase::Backward, block));
                    }
                }
            }
        }
    }
}

/// A successful allocation and how it was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(rename_all = "camelCase")
)]
pub struct Allocation {
    /// The counter value this request consumed.
    pub ordinal: u64,
    pub id: MembershipId,
    /// The block the ID was drawn from.
    pub block: Block,
    pub phase: SearchPhase,
    /// Blocks found exhausted before this one.
    pub blocks_skipped: usize,
}

impl Allocation {
    pub const fn used_fallback(&self) -> bool {
        !matches!(self.phase, SearchPhase::Primary)
    }
}

/// Composes [`BlockAllocator`] over a [`SearchPlan`]: primary block, then
/// forward, then backward, terminal on the first success.
#[derive(Clone, Debug)]
pub struct FallbackSearch<R = ThreadRandom> {
    allocator: BlockAllocator<R>,
    window: u32,
}

impl Default for FallbackSearch<ThreadRandom> {
    fn default() -> Self {
        Self::new(BlockAllocator::default(), DEFAULT_MAX_FALLBACK_BLOCKS)
    }
}

impl<R> FallbackSearch<R>
where
    R: RandSource,
{
    pub const fn new(allocator: BlockAllocator<R>, window: u32) -> Self {
        Self { allocator, window }
    }

    pub const fn window(&self) -> u32 {
        self.window
    }

    /// Finds a free ID for `ordinal`, falling back to neighbouring blocks when
    /// the primary one is exhausted.
    ///
    /// # Errors
    /// - [`Error::Storage`] if an existence check fails
    /// - [`Error::CapacityExhausted`] if every searched block is exhausted
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, store)))]
    pub fn search<S>(&self, store: &S, ordinal: u64) -> Result<Allocation>
    where
        S: MembershipStore + ?Sized,
    {
        let primary = block_index_of(ordinal);
        let mut exhausted = 0_usize;

        for (phase, block) in SearchPlan::new(primary, self.window) {
            match self.allocator.allocate_in_block(store, block)? {
                BlockOutcome::Found { id, .. } => {
                    let allocation = Allocation {
                        ordinal,
                        id,
                        block,
                        phase,
                        blocks_skipped: exhausted,
                    };
                    log_allocation(&allocation);
                    return Ok(allocation);
                }
                BlockOutcome::Exhausted { .. } => exhausted += 1,
            }
        }

        #[cfg(feature = "tracing")]
        tracing::error!(
            ordinal,
            primary_block = primary,
            blocks_searched = exhausted,
            "membership id capacity exhausted"
        );

        Err(Error::CapacityExhausted {
            ordinal,
            primary_block: primary,
            blocks_searched: exhausted,
        })
    }
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn log_allocation(allocation: &Allocation) {
    #[cfg(feature = "tracing")]
    {
        match allocation.phase {
            SearchPhase::Primary => tracing::debug!(
                ordinal = allocation.ordinal,
                block = allocation.block.index(),
                id = %allocation.id,
                "allocated membership id"
            ),
            phase => tracing::info!(
                ordinal = allocation.ordinal,
                block = allocation.block.index(),
                id = %allocation.id,
                %phase,
                blocks_skipped = allocation.blocks_skipped,
                "allocated membership id from fallback block"
            ),
        }
    }
}
