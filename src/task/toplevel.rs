// task/toplevel.rs
use core::fmt;

use super::Mode;
use crate::{Block, Result, binary::Buffer};

/// Transport side of a top-level task.
///
/// Implementations own the buffer of one merged block and move it to or from
/// the device. The buffer must be at least `block.len()` bytes long, with
/// offset `0` mapping to `block.start()`.
pub trait ProcessBuffer {
    fn buffer(&self) -> &dyn Buffer;

    fn buffer_mut(&mut self) -> &mut dyn Buffer;

    /// Performs the transfer.
    ///
    /// In [`Mode::Read`] this fills the buffer before the children decode it.
    /// In [`Mode::Write`] it is called after the children have encoded their
    /// values and must push the buffer to the device.
    fn process_buffer(&mut self, block: &Block, mode: Mode) -> Result<()>;
}

/// One merged block, its buffer, and the channel tasks it serves.
///
/// Children are indices into the owning [`TaskList`](super::TaskList), kept
/// in the order the tasks were added to the aggregator.
pub struct ToplevelBlockTask {
    block: Block,
    mode: Mode,
    children: Vec<usize>,
    io: Box<dyn ProcessBuffer>,
}

impl ToplevelBlockTask {
    pub(crate) fn new(block: Block, mode: Mode, io: Box<dyn ProcessBuffer>) -> Self {
        ToplevelBlockTask {
            block,
            mode,
            children: Vec::new(),
            io,
        }
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    /// Either [`Mode::Read`] or [`Mode::Write`].
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn buffer(&self) -> &dyn Buffer {
        self.io.buffer()
    }

    pub(crate) fn push_child(&mut self, leaf: usize) {
        self.children.push(leaf);
    }

    pub(crate) fn process_buffer(&mut self) -> Result<()> {
        self.io.process_buffer(&self.block, self.mode)
    }

    /// Bytes of `child` inside this task's buffer.
    pub(crate) fn child_range(&self, child: &Block) -> Result<&[u8]> {
        let offset = (child.start() - self.block.start()) as usize;
        self.io.buffer().range(offset, child.len() as usize)
    }

    pub(crate) fn child_range_mut(&mut self, child: &Block) -> Result<&mut [u8]> {
        let offset = (child.start() - self.block.start()) as usize;
        self.io.buffer_mut().range_mut(offset, child.len() as usize)
    }
}

impl fmt::Debug for ToplevelBlockTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToplevelBlockTask")
            .field("block", &self.block)
            .field("mode", &self.mode)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}
