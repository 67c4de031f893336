//! Rank descriptors: the ordered value sequence tiles climb through.

use crate::error::BoardError;
use std::fmt;

/// Default number of ranks: 2, 4, ..., 131072 (the largest tile a 4x4 board can hold).
pub const DEFAULT_RANK_COUNT: u8 = 17;

/// Index into the rank table. Rank 0 is the spawn value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Rank(u8);

impl Rank {
    pub const ZERO: Self = Self(0);

    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Displayable value and score for one rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankDescriptor {
    pub value: u32,
    pub points: u32,
}

/// Ordered, immutable sequence of rank descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankTable {
    ranks: Vec<RankDescriptor>,
}

impl RankTable {
    /// Powers of two starting at 2: rank r has value and points `2^(r+1)`.
    pub fn powers_of_two(count: u8) -> Result<Self, BoardError> {
        if count == 0 {
            return Err(BoardError::EmptyRankTable);
        }
        Ok(Self::doubling(count))
    }

    fn doubling(count: u8) -> Self {
        // 2^32 does not fit a u32 value; cap the table there.
        let ranks = (0..count.min(31))
            .map(|r| {
                let value = 2u32 << r;
                RankDescriptor { value, points: value }
            })
            .collect();
        Self { ranks }
    }

    pub fn max_rank(&self) -> Rank {
        Rank((self.ranks.len() - 1) as u8)
    }

    /// Descriptor for `rank`, clamped to the last defined rank.
    pub fn descriptor(&self, rank: Rank) -> RankDescriptor {
        self.ranks[rank.index().min(self.ranks.len() - 1)]
    }

    /// The rank one step above `rank`, clamped at the maximum.
    pub fn next(&self, rank: Rank) -> Rank {
        Rank(rank.0.saturating_add(1)).min(self.max_rank())
    }
}

impl Default for RankTable {
    fn default() -> Self {
        Self::doubling(DEFAULT_RANK_COUNT)
    }
}
