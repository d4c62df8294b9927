// binary/bits.rs
//! Sub-byte and arbitrary-width bit field access.

use super::{Endianness, checked_end};
use crate::{Error, Result, error::validate_buffer_size};

fn validate_bit_index(bit: u8) -> Result<()> {
    if bit > 7 {
        return Err(Error::InvalidConfiguration(format!(
            "bit index {bit} is outside 0..=7"
        )));
    }
    Ok(())
}

/// Reads bit `bit` (0 = least significant) of the byte at `offset`.
pub fn read_bit(buf: &[u8], offset: usize, bit: u8) -> Result<bool> {
    validate_bit_index(bit)?;
    validate_buffer_size(buf, checked_end(offset, 1)?)?;
    Ok((buf[offset] >> bit) & 0x01 != 0)
}

/// Sets or clears bit `bit` of the byte at `offset`, leaving the other seven
/// bits untouched.
pub fn write_bit(buf: &mut [u8], offset: usize, bit: u8, value: bool) -> Result<()> {
    validate_bit_index(bit)?;
    validate_buffer_size(buf, checked_end(offset, 1)?)?;
    if value {
        buf[offset] |= 1 << bit;
    } else {
        buf[offset] &= !(1 << bit);
    }
    Ok(())
}

/// An unsigned integer of `bit_count` bits starting `bit_offset` bits into
/// the byte at the read offset.
///
/// With little-endian numbering bit `8 * i + j` is bit `j` of byte `i` of
/// the covered span. Big-endian numbering folds the span most significant
/// byte first and counts `bit_offset` from the least significant bit of the
/// last byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnsignedBits {
    bit_count: u8,
    bit_offset: u8,
    endianness: Endianness,
}

impl UnsignedBits {
    /// Requires `1 <= bit_count <= 64` and `bit_offset <= 7`.
    pub fn new(bit_count: u8, bit_offset: u8, endianness: Endianness) -> Result<Self> {
        if bit_count == 0 || bit_count > 64 {
            return Err(Error::InvalidConfiguration(format!(
                "bit count {bit_count} is outside 1..=64"
            )));
        }
        validate_bit_index(bit_offset)?;
        Ok(UnsignedBits {
            bit_count,
            bit_offset,
            endianness,
        })
    }

    pub fn bit_count(&self) -> u8 {
        self.bit_count
    }

    pub fn bit_offset(&self) -> u8 {
        self.bit_offset
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Number of bytes touched by the field.
    pub fn size(&self) -> usize {
        (self.bit_offset as usize + self.bit_count as usize).div_ceil(8)
    }

    fn mask(&self) -> u128 {
        (1u128 << self.bit_count) - 1
    }

    pub fn read(&self, buf: &[u8], offset: usize) -> Result<u64> {
        let end = checked_end(offset, self.size())?;
        validate_buffer_size(buf, end)?;
        let raw = self.endianness.fold(&buf[offset..end]);
        Ok(((raw >> self.bit_offset) & self.mask()) as u64)
    }

    /// Replaces the covered bits with `value`, keeping every other bit.
    pub fn write(&self, buf: &mut [u8], offset: usize, value: u64) -> Result<()> {
        let mask = self.mask();
        if value as u128 > mask {
            return Err(Error::Encode(format!(
                "{value} does not fit in {} bits",
                self.bit_count
            )));
        }
        let end = checked_end(offset, self.size())?;
        validate_buffer_size(buf, end)?;
        let span = &mut buf[offset..end];
        let raw = self.endianness.fold(span);
        let cleared = raw & !(mask << self.bit_offset);
        let updated = cleared | ((value as u128) << self.bit_offset);
        self.endianness.store(updated, span);
        Ok(())
    }
}
