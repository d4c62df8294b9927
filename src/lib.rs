#![forbid(unsafe_code)]

//! # fieldbus-blocks
//!
//! Block aggregation and task composition for drivers of register- or
//! byte-addressed field devices.
//!
//! Reading forty registers one transaction at a time is slow. This crate
//! lets a driver describe each channel as a small block of addresses, merges
//! the blocks into the fewest contiguous transfers, runs those transfers and
//! hands every channel its own result.
//!
//! ## Features
//!
//! - **Aggregation**: merge half-open blocks with a configurable minimum gap,
//!   never covering prohibited ranges
//! - **Read-modify-write**: channels narrower than the writable unit (single
//!   bits, bit fields) are written on top of freshly read data
//! - **Binary codecs**: fixed-width integers and floats in either byte order,
//!   bits, bit fields, ASCII strings and byte arrays
//! - **Partial failure**: one bad channel, transfer or domain never fails the
//!   others
//!
//! ## Quick Start
//!
//! ### Merging blocks
//!
//! ```
//! use fieldbus_blocks::{Block, BlockAggregator, Result};
//!
//! fn main() -> Result<()> {
//!     let mut aggregator = BlockAggregator::new(vec![
//!         Block::new(0, 1)?,
//!         Block::new(1, 2)?,
//!         Block::new(3, 4)?,
//!     ]);
//!     aggregator.add_block(Block::prohibited(2, 3)?);
//!
//!     let merged = aggregator
//!         .aggregate(|start: u64, end: u64| (start, end))
//!         .collect::<Result<Vec<_>>>()?;
//!     assert_eq!(merged, vec![(0, 2), (3, 4)]);
//!     Ok(())
//! }
//! ```
//!
//! ### Writing a driver
//!
//! A driver implements [`BlockDriver`]: it maps each [`ChannelRecord`] to a
//! domain and a [`ChannelTask`](task::ChannelTask), and provides a factory
//! for the [`ProcessBuffer`](task::ProcessBuffer) that moves one merged
//! block to or from the device. [`BlockDriver::read`],
//! [`BlockDriver::write`] and [`BlockDriver::prepare_read`] come for free.
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`blocks`] | Blocks, prohibited blocks and the [`BlockAggregator`] |
//! | [`binary`] | Scalar, bit, string and byte-array codecs |
//! | [`task`] | Channel tasks, top-level transfers and task aggregation |
//! | [`driver`] | The [`BlockDriver`] trait and [`PreparedRead`] |
//! | [`options`] | [`DriverOptions`] configuration |
//! | [`error`] | Error types and [`Result`] alias |
//!
//! ## Error Handling
//!
//! Fallible operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. Driver calls record channel-level
//! failures on the [`ChannelRecord`]s instead of returning them.

pub mod binary;
pub mod blocks;
pub mod driver;
pub mod error;
pub mod options;
pub mod task;

mod channel;
mod types;

// Re-export commonly used types at the crate root
pub use blocks::{Block, BlockAggregator, BlockFactory, BlockKind};
pub use channel::{ChannelFlag, ChannelRecord, ChannelStatus};
pub use driver::{BlockDriver, ExecutionPlan, PreparedRead};
pub use error::{Error, Result};
pub use options::DriverOptions;
pub use task::Mode;
pub use types::{DataType, TypedValue};
