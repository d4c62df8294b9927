// blocks/block.rs
//! Half-open address intervals.
//!
//! A [`Block`] is either a regular block, which the aggregator may merge with
//! its neighbours, or a prohibited block, which marks addresses that must
//! never be covered by a merged range.

use core::cmp::Ordering;
use core::fmt;

use crate::{Error, Result};

/// Distinguishes mergeable blocks from prohibited ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockKind {
    Regular,
    Prohibited,
}

/// An immutable half-open interval `[start, end)`.
///
/// Ordered by `start`, then by `end`, then by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    start: u64,
    end: u64,
    kind: BlockKind,
}

impl Block {
    /// Creates a regular block. Requires `start < end`.
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if start >= end {
            return Err(Error::InvalidBlock { start, end });
        }
        Ok(Block {
            start,
            end,
            kind: BlockKind::Regular,
        })
    }

    /// Creates a prohibited block. Requires `start <= end`; a zero-length
    /// prohibited block acts as a barrier at `start`.
    pub fn prohibited(start: u64, end: u64) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidBlock { start, end });
        }
        Ok(Block {
            start,
            end,
            kind: BlockKind::Prohibited,
        })
    }

    #[inline]
    pub fn start(&self) -> u64 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> u64 {
        self.end
    }

    #[inline]
    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    #[inline]
    pub fn is_prohibited(&self) -> bool {
        self.kind == BlockKind::Prohibited
    }

    /// Number of addresses covered by the block.
    #[inline]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if `other` lies entirely inside this block.
    #[inline]
    pub fn contains(&self, other: &Block) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns true if the two blocks share at least one address, or if one
    /// of them is an empty barrier strictly inside the other.
    #[inline]
    pub fn intersects(&self, other: &Block) -> bool {
        other.start < self.end && other.end > self.start
    }

    /// Returns true if `other` overlaps, touches, or lies at most `gap`
    /// addresses away from this block.
    #[inline]
    pub fn is_mergeable_with(&self, other: &Block, gap: u64) -> bool {
        other.start <= self.end.saturating_add(gap) && other.end >= self.start.saturating_sub(gap)
    }
}

impl PartialOrd for Block {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Block {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then(self.end.cmp(&other.end))
            .then(self.kind.cmp(&other.kind))
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            BlockKind::Regular => write!(f, "[{}, {})", self.start, self.end),
            BlockKind::Prohibited => write!(f, "![{}, {})", self.start, self.end),
        }
    }
}

/// Builds values covering a merged `[start, end)` range.
///
/// Implemented for every `FnMut(u64, u64) -> T`, so plain closures can be
/// passed wherever a factory is expected.
pub trait BlockFactory<T> {
    fn build(&mut self, start: u64, end: u64) -> T;
}

impl<T, F> BlockFactory<T> for F
where
    F: FnMut(u64, u64) -> T,
{
    fn build(&mut self, start: u64, end: u64) -> T {
        self(start, end)
    }
}
