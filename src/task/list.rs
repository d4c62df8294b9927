// task/list.rs
use log::{trace, warn};

use super::{ChannelTask, Mode, ToplevelBlockTask};
use crate::{ChannelRecord, Error, Result};

/// A channel task plus its links into the owning [`TaskList`].
#[derive(Debug)]
pub(crate) struct Leaf {
    pub(crate) record: usize,
    pub(crate) task: Box<dyn ChannelTask>,
    /// Index into the read-side top-level tasks.
    pub(crate) read_parent: Option<usize>,
    /// Index into the write-side top-level tasks.
    pub(crate) write_parent: Option<usize>,
}

impl Leaf {
    pub(crate) fn new(record: usize, task: Box<dyn ChannelTask>) -> Self {
        Leaf {
            record,
            task,
            read_parent: None,
            write_parent: None,
        }
    }
}

/// The result of aggregating one domain: channel tasks and the top-level
/// tasks that serve them.
///
/// Read-side top-level tasks come first, write-side ones after. A list can
/// be [`run`](TaskList::run) any number of times; every run transfers fresh
/// data through the same top-level tasks.
#[derive(Debug)]
pub struct TaskList {
    leaves: Vec<Leaf>,
    toplevels: Vec<ToplevelBlockTask>,
    read_side: usize,
}

impl TaskList {
    pub(crate) fn new(
        leaves: Vec<Leaf>,
        toplevels: Vec<ToplevelBlockTask>,
        read_side: usize,
    ) -> Self {
        TaskList {
            leaves,
            toplevels,
            read_side,
        }
    }

    /// All top-level tasks, read side first.
    pub fn toplevels(&self) -> &[ToplevelBlockTask] {
        &self.toplevels
    }

    pub fn read_toplevels(&self) -> &[ToplevelBlockTask] {
        &self.toplevels[..self.read_side]
    }

    pub fn write_toplevels(&self) -> &[ToplevelBlockTask] {
        &self.toplevels[self.read_side..]
    }

    /// Number of channel tasks.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn task(&self, index: usize) -> Option<&dyn ChannelTask> {
        self.leaves.get(index).map(|l| l.task.as_ref())
    }

    /// Record index a channel task reports to.
    pub fn record_of(&self, index: usize) -> Option<usize> {
        self.leaves.get(index).map(|l| l.record)
    }

    /// Read-side and write-side parents of a channel task, each relative to
    /// [`read_toplevels`](Self::read_toplevels) and
    /// [`write_toplevels`](Self::write_toplevels).
    pub fn parents_of(&self, index: usize) -> Option<(Option<usize>, Option<usize>)> {
        self.leaves
            .get(index)
            .map(|l| (l.read_parent, l.write_parent))
    }

    /// Runs every top-level task and stores the outcome of each channel task
    /// on `records[record]`.
    ///
    /// Read-side tasks run first: each fills its buffer, then its read
    /// children decode. Write-side tasks then copy the bytes of their update
    /// children from the read side, let every child encode, and flush. A
    /// failed transfer fails all children of that top-level task; a failed
    /// child fails only its own record.
    pub fn run(&mut self, records: &mut [ChannelRecord]) {
        let TaskList {
            leaves,
            toplevels,
            read_side,
        } = self;
        let (reads, writes) = toplevels.split_at_mut(*read_side);

        let mut read_failed = vec![false; reads.len()];
        for (position, toplevel) in reads.iter_mut().enumerate() {
            if let Err(e) = toplevel.process_buffer() {
                warn!("read of {} failed: {e}", toplevel.block());
                read_failed[position] = true;
                fail_children(leaves, toplevel, records, &e.to_string());
                continue;
            }
            for &child in toplevel.children() {
                let leaf = &leaves[child];
                if leaf.task.mode() != Mode::Read {
                    continue;
                }
                let outcome = toplevel
                    .child_range(&leaf.task.block())
                    .and_then(|data| leaf.task.read(data));
                let Some(record) = records.get_mut(leaf.record) else {
                    continue;
                };
                match outcome {
                    Ok(value) => record.set_value(value),
                    Err(e) => {
                        trace!("channel {} failed: {e}", record.name());
                        record.set_read_failure(e.to_string());
                    }
                }
            }
        }

        for toplevel in writes.iter_mut() {
            let unread = toplevel.children().iter().find_map(|&child| {
                leaves[child]
                    .read_parent
                    .filter(|&parent| read_failed[parent])
                    .map(|parent| reads[parent].block().to_string())
            });
            if let Some(block) = unread {
                warn!("skipping write of {}: read of {block} failed", toplevel.block());
                let message = format!("read-modify-write aborted, read of {block} failed");
                fail_children(leaves, toplevel, records, &message);
                continue;
            }

            let outcomes = encode_children(leaves, toplevel, reads, records);
            let flushed = toplevel.process_buffer();
            if let Err(e) = &flushed {
                warn!("write of {} failed: {e}", toplevel.block());
            }
            for (record, outcome) in outcomes {
                let Some(record) = records.get_mut(record) else {
                    continue;
                };
                let outcome = outcome.and_then(|()| match &flushed {
                    Ok(()) => Ok(()),
                    Err(e) => Err(e.to_string()),
                });
                match outcome {
                    Ok(()) => record.set_success(),
                    Err(message) => {
                        trace!("channel {} failed: {message}", record.name());
                        record.set_failure(message);
                    }
                }
            }
        }
    }
}

/// Seeds the bytes of every update child from its read parent, then lets
/// every child encode its value. Seeding happens before any child encodes so
/// that channels sharing a byte do not overwrite each other.
fn encode_children(
    leaves: &[Leaf],
    toplevel: &mut ToplevelBlockTask,
    reads: &[ToplevelBlockTask],
    records: &[ChannelRecord],
) -> Vec<(usize, core::result::Result<(), String>)> {
    let children = toplevel.children().to_vec();
    let seeded: Vec<Result<()>> = children
        .iter()
        .map(|&child| {
            let leaf = &leaves[child];
            match leaf.read_parent {
                Some(parent) => seed(toplevel, &reads[parent], leaf.task.as_ref()),
                None => Ok(()),
            }
        })
        .collect();

    children
        .iter()
        .zip(seeded)
        .map(|(&child, seeded)| {
            let leaf = &leaves[child];
            let outcome = seeded.and_then(|()| {
                let value = records
                    .get(leaf.record)
                    .and_then(|r| r.value())
                    .ok_or_else(|| Error::Encode("no value to write".into()))?;
                let data = toplevel.child_range_mut(&leaf.task.block())?;
                leaf.task.write(data, value)
            });
            (leaf.record, outcome.map_err(|e| e.to_string()))
        })
        .collect()
}

fn seed(
    target: &mut ToplevelBlockTask,
    source: &ToplevelBlockTask,
    task: &dyn ChannelTask,
) -> Result<()> {
    let block = task.block();
    let bytes = source.child_range(&block)?;
    target.child_range_mut(&block)?.copy_from_slice(bytes);
    Ok(())
}

fn fail_children(
    leaves: &[Leaf],
    toplevel: &ToplevelBlockTask,
    records: &mut [ChannelRecord],
    message: &str,
) {
    for &child in toplevel.children() {
        let leaf = &leaves[child];
        let Some(record) = records.get_mut(leaf.record) else {
            continue;
        };
        trace!("channel {} failed: {message}", record.name());
        // Only read records carry a value produced by the transfer.
        if leaf.task.mode() == Mode::Read {
            record.set_read_failure(message);
        } else {
            record.set_failure(message);
        }
    }
}
