//! Endianness-aware scalar codecs over flat byte buffers.
//!
//! This module provides:
//! - [`Endianness`]: byte order of multi-byte scalars
//! - [`Buffer`]: the byte storage owned by a top-level task
//! - [`BinaryData`] / [`ScalarKind`]: fixed-width integer and float codecs
//! - [`UnsignedBits`] and the bit helpers: sub-byte and arbitrary-width fields
//! - [`adapter`]: conversions between raw scalars and logical [`TypedValue`]s
//!
//! [`TypedValue`]: crate::TypedValue

pub mod adapter;
mod bits;
mod data;

pub use bits::{UnsignedBits, read_bit, write_bit};
pub use data::{BinaryData, NumericValue, ScalarKind};

use crate::{Error, Result, error::validate_buffer_size};

/// Byte order of a multi-byte value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endianness {
    BigEndian,
    LittleEndian,
}

impl Endianness {
    /// Folds up to 16 bytes into an unsigned integer honoring this byte order.
    #[inline]
    pub(crate) fn fold(&self, bytes: &[u8]) -> u128 {
        debug_assert!(bytes.len() <= 16);
        match self {
            Endianness::BigEndian => bytes.iter().fold(0u128, |acc, &b| (acc << 8) | b as u128),
            Endianness::LittleEndian => bytes
                .iter()
                .rev()
                .fold(0u128, |acc, &b| (acc << 8) | b as u128),
        }
    }

    /// Stores the low `out.len()` bytes of `value` honoring this byte order.
    #[inline]
    pub(crate) fn store(&self, value: u128, out: &mut [u8]) {
        debug_assert!(out.len() <= 16);
        let n = out.len();
        match self {
            Endianness::BigEndian => {
                let bytes = value.to_be_bytes();
                out.copy_from_slice(&bytes[16 - n..]);
            }
            Endianness::LittleEndian => {
                let bytes = value.to_le_bytes();
                out.copy_from_slice(&bytes[..n]);
            }
        }
    }
}

/// Byte storage bound to a top-level task.
///
/// Offsets are relative to the start of the buffer, which corresponds to the
/// start address of the task's merged block.
pub trait Buffer {
    fn as_slice(&self) -> &[u8];

    fn as_mut_slice(&mut self) -> &mut [u8];

    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrows `len` bytes starting at `offset`.
    fn range(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let end = checked_end(offset, len)?;
        let bytes = self.as_slice();
        validate_buffer_size(bytes, end)?;
        Ok(&bytes[offset..end])
    }

    /// Mutably borrows `len` bytes starting at `offset`.
    fn range_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8]> {
        let end = checked_end(offset, len)?;
        let bytes = self.as_mut_slice();
        validate_buffer_size(bytes, end)?;
        Ok(&mut bytes[offset..end])
    }
}

impl Buffer for Vec<u8> {
    fn as_slice(&self) -> &[u8] {
        self
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        self
    }
}

impl Buffer for Box<[u8]> {
    fn as_slice(&self) -> &[u8] {
        self
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        self
    }
}

#[inline]
pub(crate) fn checked_end(offset: usize, len: usize) -> Result<usize> {
    offset.checked_add(len).ok_or_else(|| {
        Error::InvalidConfiguration(format!("range {offset}+{len} overflows the address space"))
    })
}
