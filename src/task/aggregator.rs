// task/aggregator.rs
//! Builds top-level tasks over channel tasks.
//!
//! Plain aggregation merges tasks that all belong to the same side (all
//! [`Mode::Read`] or all [`Mode::Write`]). Update aggregation accepts any mix
//! and runs the interval merge twice: read and update tasks form the read
//! side, write and update tasks form the write side. Every update task ends
//! up with one parent on each side.

use log::debug;

use super::list::{Leaf, TaskList};
use super::{ChannelTask, Mode, ProcessBuffer, ToplevelBlockTask};
use crate::{Block, BlockAggregator, BlockFactory, Error, Result};

/// Collects channel tasks and prohibited blocks for one domain.
///
/// Each task is added together with a caller-chosen index, usually the
/// position of its [`ChannelRecord`](crate::ChannelRecord), which
/// [`TaskList::run`] uses to report results.
#[derive(Debug, Default)]
pub struct BlockTaskAggregator {
    leaves: Vec<Leaf>,
    prohibited: Vec<Block>,
    minimum_gap_size: u64,
}

impl BlockTaskAggregator {
    pub fn new() -> Self {
        BlockTaskAggregator::default()
    }

    pub fn with_minimum_gap_size(mut self, minimum_gap_size: u64) -> Self {
        self.minimum_gap_size = minimum_gap_size;
        self
    }

    /// Gap bridged by plain aggregation and by the read side of update
    /// aggregation. The write side never bridges gaps.
    pub fn set_minimum_gap_size(&mut self, minimum_gap_size: u64) {
        self.minimum_gap_size = minimum_gap_size;
    }

    pub fn minimum_gap_size(&self) -> u64 {
        self.minimum_gap_size
    }

    pub fn add_task(&mut self, record: usize, task: Box<dyn ChannelTask>) {
        self.leaves.push(Leaf::new(record, task));
    }

    /// Adds a block no merged range may cover. Regular blocks are treated as
    /// prohibited ones with the same bounds.
    pub fn add_prohibited_block(&mut self, block: Block) -> Result<()> {
        let block = if block.is_prohibited() {
            block
        } else {
            Block::prohibited(block.start(), block.end())?
        };
        self.prohibited.push(block);
        Ok(())
    }

    pub fn prohibited_blocks(&self) -> &[Block] {
        &self.prohibited
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// True if any task needs read-modify-write, which calls for
    /// [`aggregate_update`](Self::aggregate_update).
    pub fn has_update_tasks(&self) -> bool {
        self.leaves.iter().any(|l| l.task.mode() == Mode::Update)
    }

    /// Merges tasks that all share one side.
    ///
    /// Fails with [`Error::InvalidConfiguration`] if the tasks mix reads and
    /// writes or contain update tasks, and with
    /// [`Error::AggregationUnfeasible`] if a prohibited block is in the way.
    pub fn aggregate<F>(self, factory: F) -> Result<TaskList>
    where
        F: BlockFactory<Box<dyn ProcessBuffer>>,
    {
        let mut modes = self.leaves.iter().map(|l| l.task.mode());
        let mode = match modes.next() {
            None => return Ok(TaskList::new(self.leaves, Vec::new(), 0)),
            Some(Mode::Update) => return Err(mixed_modes()),
            Some(first) => first,
        };
        if modes.any(|m| m != mode) {
            return Err(mixed_modes());
        }

        let mut toplevels = merge_side(
            &self.leaves,
            &self.prohibited,
            self.minimum_gap_size,
            mode,
            factory,
        )?;
        let mut leaves = self.leaves;
        attach(&mut leaves, &mut toplevels, mode);
        debug!(
            "aggregated {} {} tasks into {} blocks",
            leaves.len(),
            mode,
            toplevels.len()
        );

        let read_side = if mode == Mode::Read { toplevels.len() } else { 0 };
        Ok(TaskList::new(leaves, toplevels, read_side))
    }

    /// Merges a mix of read, write and update tasks.
    ///
    /// Read-side blocks are built by `read_factory` with the configured
    /// minimum gap, write-side blocks by `write_factory` with no gap. If
    /// either side is unfeasible the whole aggregation fails.
    pub fn aggregate_update<R, W>(self, read_factory: R, write_factory: W) -> Result<TaskList>
    where
        R: BlockFactory<Box<dyn ProcessBuffer>>,
        W: BlockFactory<Box<dyn ProcessBuffer>>,
    {
        let mut reads = merge_side(
            &self.leaves,
            &self.prohibited,
            self.minimum_gap_size,
            Mode::Read,
            read_factory,
        )?;
        let mut writes = merge_side(&self.leaves, &self.prohibited, 0, Mode::Write, write_factory)?;

        let mut leaves = self.leaves;
        attach(&mut leaves, &mut reads, Mode::Read);
        attach(&mut leaves, &mut writes, Mode::Write);
        debug!(
            "aggregated {} tasks into {} read and {} write blocks",
            leaves.len(),
            reads.len(),
            writes.len()
        );

        let read_side = reads.len();
        reads.append(&mut writes);
        Ok(TaskList::new(leaves, reads, read_side))
    }
}

fn mixed_modes() -> Error {
    Error::InvalidConfiguration(
        "plain aggregation needs tasks of a single mode, use update aggregation".into(),
    )
}

fn on_side(task: &dyn ChannelTask, side: Mode) -> bool {
    match side {
        Mode::Read => task.mode().reads(),
        _ => task.mode().writes(),
    }
}

/// Merges the blocks of every task on `side` and builds one top-level task
/// per merged range, ordered by start address.
fn merge_side<F>(
    leaves: &[Leaf],
    prohibited: &[Block],
    minimum_gap_size: u64,
    side: Mode,
    mut factory: F,
) -> Result<Vec<ToplevelBlockTask>>
where
    F: BlockFactory<Box<dyn ProcessBuffer>>,
{
    let mut blocks = prohibited.to_vec();
    blocks.extend(
        leaves
            .iter()
            .filter(|l| on_side(l.task.as_ref(), side))
            .map(|l| l.task.block()),
    );

    BlockAggregator::new(blocks)
        .with_minimum_gap_size(minimum_gap_size)
        .aggregate(|start: u64, end: u64| -> Result<ToplevelBlockTask> {
            let block = Block::new(start, end)?;
            Ok(ToplevelBlockTask::new(block, side, factory.build(start, end)))
        })
        .map(|item| item.and_then(|toplevel| toplevel))
        .collect()
}

/// Adds every task on `side` as a child of the top-level task containing it
/// and records that parent on the task. Parent indices are relative to the
/// side's own list.
fn attach(leaves: &mut [Leaf], toplevels: &mut [ToplevelBlockTask], side: Mode) {
    for (index, leaf) in leaves.iter_mut().enumerate() {
        if !on_side(leaf.task.as_ref(), side) {
            continue;
        }
        let block = leaf.task.block();
        let position = toplevels.partition_point(|t| t.block().start() <= block.start());
        let Some(parent) = position.checked_sub(1) else {
            continue;
        };
        if !toplevels[parent].block().contains(&block) {
            continue;
        }
        toplevels[parent].push_child(index);
        match side {
            Mode::Read => leaf.read_parent = Some(parent),
            _ => leaf.write_parent = Some(parent),
        }
    }
}
