use crate::MAX_SUFFIX;
use core::fmt;

/// Number of suffix values in one block.
pub const BLOCK_SIZE: u32 = 100;

/// Highest searchable block index.
pub const MAX_BLOCK: u32 = MAX_SUFFIX / BLOCK_SIZE;

/// Number of blocks in the suffix space.
pub const BLOCK_COUNT: u32 = MAX_BLOCK + 1;

/// Index of the block an ordinal targets: `floor((ordinal - 1) / BLOCK_SIZE)`.
///
/// The result is unbounded; ordinals past the ID ceiling produce indices
/// greater than [`MAX_BLOCK`]. Ordinal `0` is never issued and maps to `0`.
///
/// ```
/// use memberid::block_index_of;
///
/// assert_eq!(block_index_of(1), 0);
/// assert_eq!(block_index_of(100), 0);
/// assert_eq!(block_index_of(101), 1);
/// ```
pub const fn block_index_of(ordinal: u64) -> u64 {
    ordinal.saturating_sub(1) / BLOCK_SIZE as u64
}

/// A searchable partition of the suffix space, `0..=MAX_BLOCK`.
///
/// Blocks are derived, never stored. The invariant `index <= MAX_BLOCK` is
/// enforced at construction, so anything holding a [`Block`] may search it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct Block(u32);

impl Block {
    /// Returns the block at `index`, or `None` if it lies outside the ID
    /// space.
    pub const fn new(index: u64) -> Option<Self> {
        if index > MAX_BLOCK as u64 {
            None
        } else {
            Some(Self(index as u32))
        }
    }

    /// The block targeted by `ordinal`, or `None` once ordinals outrun the
    /// ID space.
    pub const fn of_ordinal(ordinal: u64) -> Option<Self> {
        Self::new(block_index_of(ordinal))
    }

    /// The block whose range holds `suffix`.
    pub(crate) const fn containing(suffix: u32) -> Self {
        let index = suffix.saturating_sub(1) / BLOCK_SIZE;
        if index > MAX_BLOCK {
            Self(MAX_BLOCK)
        } else {
            Self(index)
        }
    }

    pub const fn index(self) -> u32 {
        self.0
    }

    /// The inclusive suffix range owned by this block, clamped to
    /// [`MAX_SUFFIX`].
    ///
    /// ```
    /// use memberid::{Block, MAX_BLOCK};
    ///
    /// let range = Block::new(1).unwrap().range();
    /// assert_eq!((range.start(), range.end()), (101, 200));
    ///
    /// // The last block loses its 100th slot to the 5-digit ceiling.
    /// let last = Block::new(MAX_BLOCK as u64).unwrap().range();
    /// assert_eq!((last.start(), last.end()), (99_901, 99_999));
    /// ```
    pub const fn range(self) -> BlockRange {
        let nominal = BlockRange::nominal(self.0 as u64);
        let end = if nominal.end > MAX_SUFFIX as u64 {
            MAX_SUFFIX as u64
        } else {
            nominal.end
        };
        BlockRange {
            start: nominal.start,
            end,
        }
    }

    /// The block `distance` positions after this one, if still in range.
    pub const fn forward(self, distance: u32) -> Option<Self> {
        Self::new(self.0 as u64 + distance as u64)
    }

    /// The block `distance` positions before this one, if not below zero.
    pub const fn backward(self, distance: u32) -> Option<Self> {
        match self.0.checked_sub(distance) {
            Some(index) => Some(Self(index)),
            None => None,
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An inclusive range of suffix values, rendered as `"start-end"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockRange {
    start: u64,
    end: u64,
}

impl BlockRange {
    /// The unclamped range `[index*100+1, index*100+100]` for any block index,
    /// including ones past the ID ceiling. Used for reporting.
    pub const fn nominal(index: u64) -> Self {
        let base = index * BLOCK_SIZE as u64;
        Self {
            start: base + 1,
            end: base + BLOCK_SIZE as u64,
        }
    }

    pub const fn start(&self) -> u64 {
        self.start
    }

    pub const fn end(&self) -> u64 {
        self.end
    }

    /// Number of suffixes in the range.
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub const fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub const fn contains(&self, suffix: u64) -> bool {
        suffix >= self.start && suffix <= self.end
    }
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for BlockRange {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        s.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CAPACITY;

    #[test]
    fn ordinals_map_to_blocks() {
        assert_eq!(block_index_of(1), 0);
        assert_eq!(block_index_of(100), 0);
        assert_eq!(block_index_of(101), 1);
        assert_eq!(block_index_of(200), 1);
        assert_eq!(block_index_of(201), 2);
        assert_eq!(block_index_of(100_000), 999);
        assert_eq!(block_index_of(100_001), 1000);
    }

    #[test]
    fn block_constants_describe_the_id_space() {
        assert_eq!(MAX_BLOCK, 999);
        assert_eq!(BLOCK_COUNT, 1000);
        assert_eq!(BLOCK_COUNT * BLOCK_SIZE, CAPACITY);
    }

    #[test]
    fn blocks_past_the_ceiling_are_rejected() {
        assert!(Block::new(MAX_BLOCK as u64).is_some());
        assert!(Block::new(MAX_BLOCK as u64 + 1).is_none());
        assert!(Block::of_ordinal(100_000).is_some());
        assert!(Block::of_ordinal(100_001).is_none());
    }

    #[test]
    fn ranges_cover_one_hundred_values() {
        let range = Block::new(0).unwrap().range();
        assert_eq!(range.start(), 1);
        assert_eq!(range.end(), 100);
        assert_eq!(range.len(), 100);
        assert_eq!(range.to_string(), "1-100");

        let range = Block::new(42).unwrap().range();
        assert_eq!(range.to_string(), "4201-4300");
        assert!(range.contains(4201));
        assert!(range.contains(4300));
        assert!(!range.contains(4301));
    }

    #[test]
    fn last_block_is_clamped() {
        let last = Block::new(MAX_BLOCK as u64).unwrap();
        assert_eq!(last.range().len(), 99);
        assert_eq!(BlockRange::nominal(MAX_BLOCK as u64).end(), 100_000);
    }

    #[test]
    fn containing_inverts_range() {
        for index in [0_u64, 1, 57, 998, 999] {
            let block = Block::new(index).unwrap();
            let range = block.range();
            assert_eq!(Block::containing(range.start() as u32), block);
            assert_eq!(Block::containing(range.end() as u32), block);
        }
        assert_eq!(Block::containing(0), Block::new(0).unwrap());
    }

    #[test]
    fn neighbours_stay_in_range() {
        let first = Block::new(0).unwrap();
        assert!(first.backward(1).is_none());
        assert_eq!(first.forward(10).map(Block::index), Some(10));

        let last = Block::new(MAX_BLOCK as u64).unwrap();
        assert!(last.forward(1).is_none());
        assert_eq!(last.backward(10).map(Block::index), Some(989));
    }
}
