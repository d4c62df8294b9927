//! Logical channel value types.
//!
//! A channel is read and written as a [`TypedValue`] whose shape is described
//! by a [`DataType`]. The binary layer converts between these values and the
//! raw scalars stored in device buffers.

use core::fmt;

/// Logical type of a channel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    Boolean,
    ByteArray,
    Float,
    Double,
    Integer,
    Long,
    String,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::ByteArray => write!(f, "BYTE_ARRAY"),
            DataType::Float => write!(f, "FLOAT"),
            DataType::Double => write!(f, "DOUBLE"),
            DataType::Integer => write!(f, "INTEGER"),
            DataType::Long => write!(f, "LONG"),
            DataType::String => write!(f, "STRING"),
        }
    }
}

/// A channel value tagged with its logical type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypedValue {
    Boolean(bool),
    ByteArray(Vec<u8>),
    Float(f32),
    Double(f64),
    Integer(i32),
    Long(i64),
    String(String),
}

impl TypedValue {
    /// Returns the [`DataType`] describing this value.
    pub fn data_type(&self) -> DataType {
        match self {
            TypedValue::Boolean(_) => DataType::Boolean,
            TypedValue::ByteArray(_) => DataType::ByteArray,
            TypedValue::Float(_) => DataType::Float,
            TypedValue::Double(_) => DataType::Double,
            TypedValue::Integer(_) => DataType::Integer,
            TypedValue::Long(_) => DataType::Long,
            TypedValue::String(_) => DataType::String,
        }
    }

    /// Attempts to convert to f64, useful for numeric operations.
    ///
    /// Booleans map to `0.0`/`1.0`; strings are parsed. Byte arrays yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            TypedValue::Float(v) => Some(*v as f64),
            TypedValue::Double(v) => Some(*v),
            TypedValue::Integer(v) => Some(*v as f64),
            TypedValue::Long(v) => Some(*v as f64),
            TypedValue::String(s) => s.trim().parse().ok(),
            TypedValue::ByteArray(_) => None,
        }
    }

    /// Returns true if this is a numeric value (integer, long, float or double).
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TypedValue::Float(_)
                | TypedValue::Double(_)
                | TypedValue::Integer(_)
                | TypedValue::Long(_)
        )
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Boolean(v) => write!(f, "{v}"),
            TypedValue::ByteArray(v) => {
                for (i, b) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            TypedValue::Float(v) => write!(f, "{v}"),
            TypedValue::Double(v) => write!(f, "{v}"),
            TypedValue::Integer(v) => write!(f, "{v}"),
            TypedValue::Long(v) => write!(f, "{v}"),
            TypedValue::String(v) => write!(f, "{v}"),
        }
    }
}
