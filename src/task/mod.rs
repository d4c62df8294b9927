//! Channel tasks and their aggregation into top-level transfers.
//!
//! A [`ChannelTask`] covers the address range of a single channel and knows
//! how to decode or encode that channel's value. The
//! [`BlockTaskAggregator`] merges channel tasks into [`ToplevelBlockTask`]s,
//! each owning one contiguous buffer, and returns them as a [`TaskList`]
//! ready to run.
//!
//! | Type | Role |
//! |------|------|
//! | [`Mode`] | read, write, or read-modify-write |
//! | [`ChannelTask`] | leaf codec bound to one channel |
//! | [`ToplevelBlockTask`] / [`ProcessBuffer`] | one device transfer and its buffer |
//! | [`BlockTaskAggregator`] | builds a [`TaskList`] for one domain |
//! | [`channel_tasks`] | ready-made leaf tasks over the [`binary`](crate::binary) codecs |

mod aggregator;
pub mod channel_tasks;
mod list;
mod toplevel;

pub use aggregator::BlockTaskAggregator;
pub use channel_tasks::{BinaryDataTask, BitTask, ByteArrayTask, StringTask, UnsignedBitsTask};
pub use list::TaskList;
pub use toplevel::{ProcessBuffer, ToplevelBlockTask};

use core::fmt;

use crate::{Block, Result, TypedValue};

/// What a task does with its address range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    Read,
    Write,
    /// Read the containing range, merge in the channel's bits, write it back.
    Update,
}

impl Mode {
    /// True for tasks that take part in read-side aggregation.
    #[inline]
    pub fn reads(&self) -> bool {
        matches!(self, Mode::Read | Mode::Update)
    }

    /// True for tasks that take part in write-side aggregation.
    #[inline]
    pub fn writes(&self) -> bool {
        matches!(self, Mode::Write | Mode::Update)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Read => write!(f, "READ"),
            Mode::Write => write!(f, "WRITE"),
            Mode::Update => write!(f, "UPDATE"),
        }
    }
}

/// A leaf task bound to one channel.
///
/// The task never owns a buffer. When its parent top-level task runs, it is
/// handed the bytes of its own [`block`](ChannelTask::block), so offset `0`
/// of `data` is the block start.
///
/// `Update` tasks are only ever asked to [`write`](ChannelTask::write): the
/// bytes they receive already hold what the read side fetched, so writing
/// only the channel's own bits completes the read-modify-write.
pub trait ChannelTask: fmt::Debug {
    fn block(&self) -> Block;

    fn mode(&self) -> Mode;

    /// Decodes the channel value from `data`.
    fn read(&self, data: &[u8]) -> Result<TypedValue>;

    /// Encodes `value` into `data`.
    fn write(&self, data: &mut [u8], value: &TypedValue) -> Result<()>;
}
