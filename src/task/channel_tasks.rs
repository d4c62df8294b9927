//! Ready-made channel tasks over the [`binary`](crate::binary) codecs.
//!
//! Every task is built from the channel's start address and the codec that
//! describes its layout; the covered [`Block`] follows from the codec size.
//!
//! ```
//! use fieldbus_blocks::binary::BinaryData;
//! use fieldbus_blocks::task::{BinaryDataTask, ChannelTask, Mode};
//! use fieldbus_blocks::{DataType, Result, TypedValue};
//!
//! fn main() -> Result<()> {
//!     let task = BinaryDataTask::new(4, BinaryData::UINT16_BE, DataType::Integer, Mode::Read)?;
//!     assert_eq!((task.block().start(), task.block().end()), (4, 6));
//!     assert_eq!(task.read(&[0x01, 0x02])?, TypedValue::Integer(0x0102));
//!     Ok(())
//! }
//! ```

use super::{ChannelTask, Mode};
use crate::binary::adapter::{
    GainOffset, numeric_to_typed, read_ascii, read_byte_array, to_boolean, typed_to_numeric,
    write_ascii, write_byte_array,
};
use crate::binary::{BinaryData, NumericValue, UnsignedBits, read_bit, write_bit};
use crate::{Block, DataType, Error, Result, TypedValue};

fn block_at(start: u64, len: usize) -> Result<Block> {
    let end = start.checked_add(len as u64).ok_or_else(|| {
        Error::InvalidConfiguration(format!("block at {start} of {len} bytes overflows"))
    })?;
    Block::new(start, end)
}

/// Sub-byte tasks cannot write without reading the rest of their bytes.
fn sub_byte_mode(mode: Mode) -> Mode {
    match mode {
        Mode::Write => Mode::Update,
        other => other,
    }
}

fn to_bool(value: &TypedValue) -> Result<bool> {
    match value {
        TypedValue::Boolean(b) => Ok(*b),
        other => typed_to_numeric(other).map(to_boolean),
    }
}

/// A fixed-width scalar converted to the channel's [`DataType`].
#[derive(Debug, Clone)]
pub struct BinaryDataTask {
    block: Block,
    mode: Mode,
    data: BinaryData,
    value_type: DataType,
    scale: Option<GainOffset>,
}

impl BinaryDataTask {
    pub fn new(start: u64, data: BinaryData, value_type: DataType, mode: Mode) -> Result<Self> {
        Ok(BinaryDataTask {
            block: block_at(start, data.size())?,
            mode,
            data,
            value_type,
            scale: None,
        })
    }

    /// Applies `value * gain + offset` on both read and write.
    pub fn with_gain_offset(mut self, scale: GainOffset) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn data(&self) -> BinaryData {
        self.data
    }

    fn scaled(&self, value: NumericValue) -> NumericValue {
        match &self.scale {
            Some(scale) => scale.apply_numeric(value),
            None => value,
        }
    }
}

impl ChannelTask for BinaryDataTask {
    fn block(&self) -> Block {
        self.block
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn read(&self, data: &[u8]) -> Result<TypedValue> {
        let raw = self.data.read(data, 0)?;
        numeric_to_typed(self.scaled(raw), self.value_type)
    }

    fn write(&self, data: &mut [u8], value: &TypedValue) -> Result<()> {
        let raw = typed_to_numeric(value)?;
        self.data.write(data, 0, self.scaled(raw))
    }
}

/// One bit of one byte, read as [`TypedValue::Boolean`].
///
/// Created with [`Mode::Write`] it becomes an [`Mode::Update`] task, so the
/// other seven bits are preserved.
#[derive(Debug, Clone)]
pub struct BitTask {
    block: Block,
    mode: Mode,
    bit: u8,
}

impl BitTask {
    pub fn new(start: u64, bit: u8, mode: Mode) -> Result<Self> {
        if bit > 7 {
            return Err(Error::InvalidConfiguration(format!(
                "bit index {bit} is outside 0..=7"
            )));
        }
        Ok(BitTask {
            block: block_at(start, 1)?,
            mode: sub_byte_mode(mode),
            bit,
        })
    }

    pub fn bit(&self) -> u8 {
        self.bit
    }
}

impl ChannelTask for BitTask {
    fn block(&self) -> Block {
        self.block
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn read(&self, data: &[u8]) -> Result<TypedValue> {
        read_bit(data, 0, self.bit).map(TypedValue::Boolean)
    }

    fn write(&self, data: &mut [u8], value: &TypedValue) -> Result<()> {
        write_bit(data, 0, self.bit, to_bool(value)?)
    }
}

/// An unsigned bit field; writes are promoted to [`Mode::Update`] like
/// [`BitTask`].
#[derive(Debug, Clone)]
pub struct UnsignedBitsTask {
    block: Block,
    mode: Mode,
    bits: UnsignedBits,
    value_type: DataType,
}

impl UnsignedBitsTask {
    pub fn new(start: u64, bits: UnsignedBits, value_type: DataType, mode: Mode) -> Result<Self> {
        Ok(UnsignedBitsTask {
            block: block_at(start, bits.size())?,
            mode: sub_byte_mode(mode),
            bits,
            value_type,
        })
    }
}

impl ChannelTask for UnsignedBitsTask {
    fn block(&self) -> Block {
        self.block
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn read(&self, data: &[u8]) -> Result<TypedValue> {
        let raw = self.bits.read(data, 0)?;
        numeric_to_typed(NumericValue::Unsigned(raw), self.value_type)
    }

    fn write(&self, data: &mut [u8], value: &TypedValue) -> Result<()> {
        let raw = typed_to_numeric(value)?;
        let raw = raw
            .as_i128()
            .and_then(|v| u64::try_from(v).ok())
            .ok_or_else(|| Error::Encode(format!("{raw} is not an unsigned integer")))?;
        self.bits.write(data, 0, raw)
    }
}

/// A fixed-length ASCII string.
#[derive(Debug, Clone)]
pub struct StringTask {
    block: Block,
    mode: Mode,
}

impl StringTask {
    pub fn new(start: u64, len: usize, mode: Mode) -> Result<Self> {
        Ok(StringTask {
            block: block_at(start, len)?,
            mode,
        })
    }
}

impl ChannelTask for StringTask {
    fn block(&self) -> Block {
        self.block
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn read(&self, data: &[u8]) -> Result<TypedValue> {
        read_ascii(data, 0, data.len()).map(TypedValue::String)
    }

    fn write(&self, data: &mut [u8], value: &TypedValue) -> Result<()> {
        let len = data.len();
        match value {
            TypedValue::String(s) => write_ascii(data, 0, len, s),
            TypedValue::ByteArray(_) => Err(Error::Encode(
                "cannot write BYTE_ARRAY to a string channel".into(),
            )),
            other => write_ascii(data, 0, len, &other.to_string()),
        }
    }
}

/// A fixed-length raw byte range.
#[derive(Debug, Clone)]
pub struct ByteArrayTask {
    block: Block,
    mode: Mode,
}

impl ByteArrayTask {
    pub fn new(start: u64, len: usize, mode: Mode) -> Result<Self> {
        Ok(ByteArrayTask {
            block: block_at(start, len)?,
            mode,
        })
    }
}

impl ChannelTask for ByteArrayTask {
    fn block(&self) -> Block {
        self.block
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn read(&self, data: &[u8]) -> Result<TypedValue> {
        Ok(TypedValue::ByteArray(read_byte_array(data, 0, data.len())))
    }

    fn write(&self, data: &mut [u8], value: &TypedValue) -> Result<()> {
        match value {
            TypedValue::ByteArray(bytes) => write_byte_array(data, 0, data.len(), bytes),
            other => Err(Error::Encode(format!(
                "cannot write {} to a byte array channel",
                other.data_type()
            ))),
        }
    }
}
