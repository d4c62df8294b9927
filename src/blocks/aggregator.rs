// blocks/aggregator.rs
//! Merging of regular blocks into the fewest contiguous ranges.
//!
//! The aggregator sweeps the regular blocks in ascending order and keeps one
//! open window. A block that starts at most `minimum_gap_size` addresses after
//! the window end extends it; anything further away closes the window and
//! opens a new one. Every closed window is checked against the prohibited
//! blocks: if one of them falls inside the window, the aggregation is
//! unfeasible and [`Error::AggregationUnfeasible`] is reported.
//!
//! ```
//! use fieldbus_blocks::{Block, BlockAggregator, Result};
//!
//! fn main() -> Result<()> {
//!     let blocks = vec![
//!         Block::new(0, 1)?,
//!         Block::new(2, 3)?,
//!         Block::new(6, 7)?,
//!         Block::new(8, 9)?,
//!     ];
//!     let merged = BlockAggregator::new(blocks)
//!         .with_minimum_gap_size(2)
//!         .aggregate(|start: u64, end: u64| (start, end))
//!         .collect::<Result<Vec<_>>>()?;
//!     assert_eq!(merged, vec![(0, 3), (6, 9)]);
//!     Ok(())
//! }
//! ```

use core::iter::Peekable;
use std::vec;

use super::block::{Block, BlockFactory};
use crate::{Error, Result};

/// Collects regular and prohibited blocks and merges them on demand.
#[derive(Debug, Clone, Default)]
pub struct BlockAggregator {
    blocks: Vec<Block>,
    minimum_gap_size: u64,
}

impl BlockAggregator {
    /// Creates an aggregator over `blocks`, which may mix regular and
    /// prohibited blocks in any order.
    pub fn new(blocks: Vec<Block>) -> Self {
        BlockAggregator {
            blocks,
            minimum_gap_size: 0,
        }
    }

    /// Sets the largest distance between two blocks that is still bridged.
    pub fn with_minimum_gap_size(mut self, minimum_gap_size: u64) -> Self {
        self.minimum_gap_size = minimum_gap_size;
        self
    }

    pub fn set_minimum_gap_size(&mut self, minimum_gap_size: u64) {
        self.minimum_gap_size = minimum_gap_size;
    }

    pub fn minimum_gap_size(&self) -> u64 {
        self.minimum_gap_size
    }

    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Consumes the aggregator and returns a lazy iterator of merged ranges,
    /// each one built by `factory`.
    ///
    /// The iterator yields `Ok` values in ascending address order. After the
    /// first `Err` it yields nothing more.
    pub fn aggregate<T, F>(self, factory: F) -> Aggregate<T, F>
    where
        F: BlockFactory<T>,
    {
        let (mut regular, mut prohibited): (Vec<Block>, Vec<Block>) =
            self.blocks.into_iter().partition(|b| !b.is_prohibited());
        regular.sort();
        prohibited.sort();

        Aggregate {
            regular: regular.into_iter().peekable(),
            prohibited,
            minimum_gap_size: self.minimum_gap_size,
            factory,
            done: false,
            _marker: core::marker::PhantomData,
        }
    }
}

/// Lazy, non-restartable sequence of merged ranges produced by
/// [`BlockAggregator::aggregate`].
pub struct Aggregate<T, F> {
    regular: Peekable<vec::IntoIter<Block>>,
    prohibited: Vec<Block>,
    minimum_gap_size: u64,
    factory: F,
    done: bool,
    _marker: core::marker::PhantomData<fn() -> T>,
}

impl<T, F> Aggregate<T, F> {
    fn check_prohibited(&self, start: u64, end: u64) -> Result<()> {
        // Sorted by start: nothing at or after `end` can intersect the window.
        let window = self
            .prohibited
            .iter()
            .take_while(|p| p.start() < end)
            .find(|p| p.end() > start);

        match window {
            Some(p) => Err(Error::AggregationUnfeasible {
                start,
                end,
                prohibited_start: p.start(),
                prohibited_end: p.end(),
            }),
            None => Ok(()),
        }
    }
}

impl<T, F> Iterator for Aggregate<T, F>
where
    F: BlockFactory<T>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let Some(first) = self.regular.next() else {
            self.done = true;
            return None;
        };

        let start = first.start();
        let mut end = first.end();
        let limit_gap = self.minimum_gap_size;

        while let Some(next) = self
            .regular
            .next_if(|b| b.start() <= end.saturating_add(limit_gap))
        {
            end = end.max(next.end());
        }

        if let Err(e) = self.check_prohibited(start, end) {
            self.done = true;
            return Some(Err(e));
        }

        Some(Ok(self.factory.build(start, end)))
    }
}

impl<T, F> core::iter::FusedIterator for Aggregate<T, F> where F: BlockFactory<T> {}
