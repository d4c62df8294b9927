//! Error types for block aggregation, codec and driver operations.
//!
//! This module defines the [`Error`] enum which represents every failure that
//! can occur while merging blocks, encoding or decoding channel values, or
//! moving buffers through a transport.
//!
//! Most of these errors never reach the caller of
//! [`BlockDriver::read`](crate::driver::BlockDriver::read) or
//! [`BlockDriver::write`](crate::driver::BlockDriver::write): they are
//! recorded on the affected [`ChannelRecord`](crate::ChannelRecord)s instead.
//!
//! # Example
//!
//! ```
//! use fieldbus_blocks::{Block, BlockAggregator, Error};
//!
//! let mut aggregator = BlockAggregator::new(vec![Block::new(0, 2).unwrap()]);
//! aggregator.add_block(Block::prohibited(1, 2).unwrap());
//!
//! let merged: Result<Vec<_>, Error> = aggregator.aggregate(|start: u64, end: u64| (start, end)).collect();
//! match merged {
//!     Err(Error::AggregationUnfeasible { start, end, .. }) => {
//!         assert_eq!((start, end), (0, 2));
//!     }
//!     other => panic!("unexpected result: {other:?}"),
//! }
//! ```

use core::fmt;

/// Errors that can occur while aggregating blocks or running block tasks.
#[derive(Debug)]
pub enum Error {
    /// A block was constructed with `start > end`, or a regular block was
    /// constructed with zero length.
    InvalidBlock {
        /// Requested start address
        start: u64,
        /// Requested end address
        end: u64,
    },

    /// A merged range could not be produced without covering a prohibited block.
    ///
    /// Reported for the whole domain being aggregated: every channel in it
    /// is marked as failed.
    AggregationUnfeasible {
        /// Start of the merged range that hit the prohibited block
        start: u64,
        /// End of the merged range that hit the prohibited block
        end: u64,
        /// Start of the prohibited block
        prohibited_start: u64,
        /// End of the prohibited block
        prohibited_end: u64,
    },

    /// Buffer provided for decoding or encoding was too small.
    TooShortBuffer {
        /// Actual number of bytes available
        actual: usize,
        /// Minimum number of bytes required
        expected: usize,
        /// Source file where the error was detected
        file: &'static str,
        /// Line number where the error was detected
        line: u32,
    },

    /// The I/O step of a top-level task failed.
    ///
    /// Every child of the failing top-level task is marked as failed.
    Transport(String),

    /// Connecting to the device failed.
    Connection(String),

    /// A channel value could not be decoded from its buffer range.
    Decode(String),

    /// A channel value could not be encoded into its buffer range, for example
    /// because it is out of range for the scalar kind.
    Encode(String),

    /// Malformed configuration or caller input, such as an odd-length
    /// prohibited-block list.
    InvalidConfiguration(String),

    /// An I/O error occurred while loading or saving configuration.
    IOError(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidBlock { start, end } => {
                write!(f, "Invalid block bounds: start={start}, end={end}")
            }
            Error::AggregationUnfeasible {
                start,
                end,
                prohibited_start,
                prohibited_end,
            } => write!(
                f,
                "Unfeasible aggregation: range [{start}, {end}) overlaps prohibited block [{prohibited_start}, {prohibited_end})"
            ),
            Error::TooShortBuffer {
                actual,
                expected,
                file,
                line,
            } => write!(
                f,
                "Buffer too small at {file}:{line}: need at least {expected} bytes, got {actual}"
            ),
            Error::Transport(s) => write!(f, "Transport failure: {s}"),
            Error::Connection(s) => write!(f, "Connection failure: {s}"),
            Error::Decode(s) => write!(f, "Channel decode failure: {s}"),
            Error::Encode(s) => write!(f, "Channel encode failure: {s}"),
            Error::InvalidConfiguration(s) => write!(f, "Invalid configuration: {s}"),
            Error::IOError(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IOError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IOError(err)
    }
}

/// A specialized Result type for block operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Fails with [`Error::TooShortBuffer`] when `bytes` holds fewer than `expected` bytes.
#[inline]
pub(crate) fn validate_buffer_size(bytes: &[u8], expected: usize) -> Result<()> {
    if bytes.len() < expected {
        return Err(Error::TooShortBuffer {
            actual: bytes.len(),
            expected,
            file: file!(),
            line: line!(),
        });
    }
    Ok(())
}
