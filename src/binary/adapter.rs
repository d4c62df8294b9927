//! Conversions between raw scalars and logical channel values.
//!
//! Reads go `buffer -> NumericValue -> TypedValue`, writes go the other way.
//! Strings render numbers with their `Display` form, which does not depend
//! on the process locale.

use super::{NumericValue, checked_end};
use crate::{DataType, Error, Result, TypedValue, error::validate_buffer_size};

/// Converts a decoded scalar into a value of the requested logical type.
///
/// Integer targets accept any integral value that fits and truncate finite
/// floats toward zero. Anything that does not fit is a decode failure.
pub fn numeric_to_typed(value: NumericValue, target: DataType) -> Result<TypedValue> {
    match target {
        DataType::Boolean => Ok(TypedValue::Boolean(to_boolean(value))),
        DataType::Integer => {
            let v = fitting_integer(value, i32::MIN as i128, i32::MAX as i128, target)?;
            Ok(TypedValue::Integer(v as i32))
        }
        DataType::Long => {
            let v = fitting_integer(value, i64::MIN as i128, i64::MAX as i128, target)?;
            Ok(TypedValue::Long(v as i64))
        }
        DataType::Float => Ok(TypedValue::Float(match value {
            NumericValue::Float(f) => f,
            other => other.as_f64() as f32,
        })),
        DataType::Double => Ok(TypedValue::Double(value.as_f64())),
        DataType::String => Ok(TypedValue::String(value.to_string())),
        DataType::ByteArray => Err(Error::Decode(format!(
            "cannot convert numeric value {value} to {target}"
        ))),
    }
}

fn fitting_integer(value: NumericValue, min: i128, max: i128, target: DataType) -> Result<i128> {
    match value.as_i128() {
        Some(v) if v >= min && v <= max => Ok(v),
        _ => Err(Error::Decode(format!("{value} does not fit in {target}"))),
    }
}

/// Converts a logical value into a raw scalar ready for encoding.
///
/// Booleans become `0`/`1`, strings are parsed as an integer first and as a
/// float otherwise. Range checks against the target scalar kind happen when
/// the value is written.
pub fn typed_to_numeric(value: &TypedValue) -> Result<NumericValue> {
    match value {
        TypedValue::Boolean(b) => Ok(NumericValue::Unsigned(*b as u64)),
        TypedValue::Integer(v) => Ok(NumericValue::Signed(*v as i64)),
        TypedValue::Long(v) => Ok(NumericValue::Signed(*v)),
        TypedValue::Float(v) => Ok(NumericValue::Float(*v)),
        TypedValue::Double(v) => Ok(NumericValue::Double(*v)),
        TypedValue::String(s) => {
            let s = s.trim();
            if let Ok(v) = s.parse::<i64>() {
                Ok(NumericValue::Signed(v))
            } else if let Ok(v) = s.parse::<u64>() {
                Ok(NumericValue::Unsigned(v))
            } else if let Ok(v) = s.parse::<f64>() {
                Ok(NumericValue::Double(v))
            } else {
                Err(Error::Encode(format!("{s:?} is not a number")))
            }
        }
        TypedValue::ByteArray(_) => Err(Error::Encode(
            "cannot convert BYTE_ARRAY to a numeric value".into(),
        )),
    }
}

/// Any non-zero value is `true`.
#[inline]
pub fn to_boolean(value: NumericValue) -> bool {
    !value.is_zero()
}

/// Linear scaling `value * gain + offset`.
///
/// The same transform is applied on read and on write.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GainOffset {
    pub gain: f64,
    pub offset: f64,
}

impl Default for GainOffset {
    fn default() -> Self {
        GainOffset::identity()
    }
}

impl GainOffset {
    pub fn new(gain: f64, offset: f64) -> Self {
        GainOffset { gain, offset }
    }

    pub fn identity() -> Self {
        GainOffset {
            gain: 1.0,
            offset: 0.0,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.gain == 1.0 && self.offset == 0.0
    }

    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        value * self.gain + self.offset
    }

    /// Scales a decoded scalar; the result is always a double.
    pub fn apply_numeric(&self, value: NumericValue) -> NumericValue {
        NumericValue::Double(self.apply(value.as_f64()))
    }
}

/// Decodes `len` bytes at `offset` as an ASCII string, without trimming.
pub fn read_ascii(buf: &[u8], offset: usize, len: usize) -> Result<String> {
    let end = checked_end(offset, len)?;
    validate_buffer_size(buf, end)?;
    let bytes = &buf[offset..end];
    if let Some(pos) = bytes.iter().position(|b| !b.is_ascii()) {
        return Err(Error::Decode(format!(
            "non-ASCII byte {:#04x} at position {pos}",
            bytes[pos]
        )));
    }
    // ASCII is valid UTF-8.
    Ok(bytes.iter().map(|&b| b as char).collect())
}

/// Encodes `value` into the `len` bytes at `offset`, zero padding the rest.
pub fn write_ascii(buf: &mut [u8], offset: usize, len: usize, value: &str) -> Result<()> {
    if !value.is_ascii() {
        return Err(Error::Encode(format!("{value:?} is not ASCII")));
    }
    if value.len() > len {
        return Err(Error::Encode(format!(
            "string of {} bytes does not fit in {len} bytes",
            value.len()
        )));
    }
    let end = checked_end(offset, len)?;
    validate_buffer_size(buf, end)?;
    let target = &mut buf[offset..end];
    target[..value.len()].copy_from_slice(value.as_bytes());
    target[value.len()..].fill(0);
    Ok(())
}

/// Copies up to `len` bytes starting at `offset`; a shorter buffer yields
/// whatever is available.
pub fn read_byte_array(buf: &[u8], offset: usize, len: usize) -> Vec<u8> {
    let start = offset.min(buf.len());
    let end = offset.saturating_add(len).min(buf.len());
    buf[start..end].to_vec()
}

/// Copies `min(value.len(), len)` bytes of `value` to `offset`.
pub fn write_byte_array(buf: &mut [u8], offset: usize, len: usize, value: &[u8]) -> Result<()> {
    let n = value.len().min(len);
    let end = checked_end(offset, n)?;
    validate_buffer_size(buf, end)?;
    buf[offset..end].copy_from_slice(&value[..n]);
    Ok(())
}
