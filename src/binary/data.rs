// binary/data.rs
//! Fixed-width scalar codecs.
//!
//! A [`BinaryData`] pairs a [`ScalarKind`] with an [`Endianness`]. Reads
//! produce a [`NumericValue`] using two's complement for signed integers,
//! IEEE-754 for floats and plain zero-extension for unsigned integers. Writes
//! accept any [`NumericValue`] and fail with [`Error::Encode`] when it does
//! not fit the target kind.

use core::fmt;
use core::str::FromStr;

use super::{Endianness, checked_end};
use crate::{Error, Result, error::validate_buffer_size};

/// A raw numeric value as extracted from, or stored into, a buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericValue {
    Unsigned(u64),
    Signed(i64),
    Float(f32),
    Double(f64),
}

impl NumericValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            NumericValue::Unsigned(v) => *v as f64,
            NumericValue::Signed(v) => *v as f64,
            NumericValue::Float(v) => *v as f64,
            NumericValue::Double(v) => *v,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            NumericValue::Unsigned(v) => *v == 0,
            NumericValue::Signed(v) => *v == 0,
            NumericValue::Float(v) => *v == 0.0,
            NumericValue::Double(v) => *v == 0.0,
        }
    }

    /// Integer view used for range checks; floats are truncated toward zero.
    ///
    /// Returns `None` for non-finite floats and floats beyond the `i128` range.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            NumericValue::Unsigned(v) => Some(*v as i128),
            NumericValue::Signed(v) => Some(*v as i128),
            NumericValue::Float(v) => float_to_i128(*v as f64),
            NumericValue::Double(v) => float_to_i128(*v),
        }
    }
}

fn float_to_i128(v: f64) -> Option<i128> {
    // 2^127 is exactly representable; anything at or beyond it does not fit.
    const LIMIT: f64 = 170141183460469231731687303715884105728.0;
    if !v.is_finite() || v.trunc() >= LIMIT || v.trunc() < -LIMIT {
        return None;
    }
    Some(v.trunc() as i128)
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericValue::Unsigned(v) => write!(f, "{v}"),
            NumericValue::Signed(v) => write!(f, "{v}"),
            NumericValue::Float(v) => write!(f, "{v}"),
            NumericValue::Double(v) => write!(f, "{v}"),
        }
    }
}

/// Width and interpretation of a fixed-size scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScalarKind {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl ScalarKind {
    /// Size in bytes.
    pub fn size(&self) -> usize {
        match self {
            ScalarKind::UInt8 | ScalarKind::Int8 => 1,
            ScalarKind::UInt16 | ScalarKind::Int16 => 2,
            ScalarKind::UInt32 | ScalarKind::Int32 | ScalarKind::Float32 => 4,
            ScalarKind::UInt64 | ScalarKind::Int64 | ScalarKind::Float64 => 8,
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            ScalarKind::Int8 | ScalarKind::Int16 | ScalarKind::Int32 | ScalarKind::Int64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ScalarKind::Float32 | ScalarKind::Float64)
    }

    /// Inclusive integer range representable by an integer kind.
    fn integer_range(&self) -> (i128, i128) {
        match self {
            ScalarKind::UInt8 => (0, u8::MAX as i128),
            ScalarKind::UInt16 => (0, u16::MAX as i128),
            ScalarKind::UInt32 => (0, u32::MAX as i128),
            ScalarKind::UInt64 => (0, u64::MAX as i128),
            ScalarKind::Int8 => (i8::MIN as i128, i8::MAX as i128),
            ScalarKind::Int16 => (i16::MIN as i128, i16::MAX as i128),
            ScalarKind::Int32 => (i32::MIN as i128, i32::MAX as i128),
            ScalarKind::Int64 => (i64::MIN as i128, i64::MAX as i128),
            ScalarKind::Float32 | ScalarKind::Float64 => (i128::MIN, i128::MAX),
        }
    }
}

/// A scalar codec: kind plus byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BinaryData {
    pub kind: ScalarKind,
    pub endianness: Endianness,
}

impl BinaryData {
    pub const UINT8: BinaryData = BinaryData::new(ScalarKind::UInt8, Endianness::LittleEndian);
    pub const UINT16_LE: BinaryData =
        BinaryData::new(ScalarKind::UInt16, Endianness::LittleEndian);
    pub const UINT16_BE: BinaryData = BinaryData::new(ScalarKind::UInt16, Endianness::BigEndian);
    pub const UINT32_LE: BinaryData =
        BinaryData::new(ScalarKind::UInt32, Endianness::LittleEndian);
    pub const UINT32_BE: BinaryData = BinaryData::new(ScalarKind::UInt32, Endianness::BigEndian);
    pub const UINT64_LE: BinaryData =
        BinaryData::new(ScalarKind::UInt64, Endianness::LittleEndian);
    pub const UINT64_BE: BinaryData = BinaryData::new(ScalarKind::UInt64, Endianness::BigEndian);
    pub const INT8: BinaryData = BinaryData::new(ScalarKind::Int8, Endianness::LittleEndian);
    pub const INT16_LE: BinaryData = BinaryData::new(ScalarKind::Int16, Endianness::LittleEndian);
    pub const INT16_BE: BinaryData = BinaryData::new(ScalarKind::Int16, Endianness::BigEndian);
    pub const INT32_LE: BinaryData = BinaryData::new(ScalarKind::Int32, Endianness::LittleEndian);
    pub const INT32_BE: BinaryData = BinaryData::new(ScalarKind::Int32, Endianness::BigEndian);
    pub const INT64_LE: BinaryData = BinaryData::new(ScalarKind::Int64, Endianness::LittleEndian);
    pub const INT64_BE: BinaryData = BinaryData::new(ScalarKind::Int64, Endianness::BigEndian);
    pub const FLOAT_LE: BinaryData =
        BinaryData::new(ScalarKind::Float32, Endianness::LittleEndian);
    pub const FLOAT_BE: BinaryData = BinaryData::new(ScalarKind::Float32, Endianness::BigEndian);
    pub const DOUBLE_LE: BinaryData =
        BinaryData::new(ScalarKind::Float64, Endianness::LittleEndian);
    pub const DOUBLE_BE: BinaryData = BinaryData::new(ScalarKind::Float64, Endianness::BigEndian);

    pub const fn new(kind: ScalarKind, endianness: Endianness) -> Self {
        BinaryData { kind, endianness }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.kind.size()
    }

    /// Reads the scalar located at `offset`.
    pub fn read(&self, buf: &[u8], offset: usize) -> Result<NumericValue> {
        let end = checked_end(offset, self.size())?;
        validate_buffer_size(buf, end)?;
        let raw = self.endianness.fold(&buf[offset..end]) as u64;

        Ok(match self.kind {
            ScalarKind::UInt8 | ScalarKind::UInt16 | ScalarKind::UInt32 | ScalarKind::UInt64 => {
                NumericValue::Unsigned(raw)
            }
            ScalarKind::Int8 => NumericValue::Signed(raw as u8 as i8 as i64),
            ScalarKind::Int16 => NumericValue::Signed(raw as u16 as i16 as i64),
            ScalarKind::Int32 => NumericValue::Signed(raw as u32 as i32 as i64),
            ScalarKind::Int64 => NumericValue::Signed(raw as i64),
            ScalarKind::Float32 => NumericValue::Float(f32::from_bits(raw as u32)),
            ScalarKind::Float64 => NumericValue::Double(f64::from_bits(raw)),
        })
    }

    /// Encodes `value` at `offset`, converting it to this scalar kind.
    ///
    /// Integer kinds truncate fractional values toward zero and reject values
    /// outside their range. `Float32` rejects finite values beyond `f32::MAX`.
    pub fn write(&self, buf: &mut [u8], offset: usize, value: NumericValue) -> Result<()> {
        let raw = self.to_raw(value)?;
        let end = checked_end(offset, self.size())?;
        validate_buffer_size(buf, end)?;
        self.endianness.store(raw as u128, &mut buf[offset..end]);
        Ok(())
    }

    fn to_raw(&self, value: NumericValue) -> Result<u64> {
        match self.kind {
            ScalarKind::Float32 => {
                let v = match value {
                    NumericValue::Float(f) => f,
                    other => {
                        let d = other.as_f64();
                        if d.is_finite() && d.abs() > f32::MAX as f64 {
                            return Err(Error::Encode(format!(
                                "{other} is out of range for {}",
                                self
                            )));
                        }
                        d as f32
                    }
                };
                Ok(v.to_bits() as u64)
            }
            ScalarKind::Float64 => Ok(value.as_f64().to_bits()),
            kind => {
                let v = value.as_i128().ok_or_else(|| {
                    Error::Encode(format!("{value} cannot be represented as {self}"))
                })?;
                let (min, max) = kind.integer_range();
                if v < min || v > max {
                    return Err(Error::Encode(format!(
                        "{value} is out of range for {self} [{min}, {max}]"
                    )));
                }
                let mask = if kind.size() == 8 {
                    u64::MAX
                } else {
                    (1u64 << (kind.size() * 8)) - 1
                };
                // Low 64 bits of the two's complement representation.
                Ok((v as u64) & mask)
            }
        }
    }
}

impl fmt::Display for BinaryData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.kind {
            ScalarKind::UInt8 => return write!(f, "UINT8"),
            ScalarKind::Int8 => return write!(f, "INT8"),
            ScalarKind::UInt16 => "UINT16",
            ScalarKind::UInt32 => "UINT32",
            ScalarKind::UInt64 => "UINT64",
            ScalarKind::Int16 => "INT16",
            ScalarKind::Int32 => "INT32",
            ScalarKind::Int64 => "INT64",
            ScalarKind::Float32 => "FLOAT",
            ScalarKind::Float64 => "DOUBLE",
        };
        match self.endianness {
            Endianness::BigEndian => write!(f, "{name}_BE"),
            Endianness::LittleEndian => write!(f, "{name}_LE"),
        }
    }
}

impl FromStr for BinaryData {
    type Err = Error;

    /// Parses names such as `UINT8`, `INT16_BE` or `DOUBLE_LE`.
    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        let (name, endianness) = match upper.rsplit_once('_') {
            Some((name, "BE")) => (name, Endianness::BigEndian),
            Some((name, "LE")) => (name, Endianness::LittleEndian),
            _ => (upper.as_str(), Endianness::LittleEndian),
        };
        let kind = match name {
            "UINT8" => ScalarKind::UInt8,
            "UINT16" => ScalarKind::UInt16,
            "UINT32" => ScalarKind::UInt32,
            "UINT64" => ScalarKind::UInt64,
            "INT8" => ScalarKind::Int8,
            "INT16" => ScalarKind::Int16,
            "INT32" => ScalarKind::Int32,
            "INT64" => ScalarKind::Int64,
            "FLOAT" => ScalarKind::Float32,
            "DOUBLE" => ScalarKind::Float64,
            _ => {
                return Err(Error::InvalidConfiguration(format!(
                    "unknown binary data type {s:?}"
                )));
            }
        };
        Ok(BinaryData::new(kind, endianness))
    }
}
