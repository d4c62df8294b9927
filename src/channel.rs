use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::{DataType, TypedValue};

/// Outcome flag of the last operation performed on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelFlag {
    Success,
    Failure,
}

/// Flag plus an optional human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelStatus {
    pub flag: ChannelFlag,
    pub message: Option<String>,
}

impl ChannelStatus {
    pub fn success() -> Self {
        ChannelStatus {
            flag: ChannelFlag::Success,
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ChannelStatus {
            flag: ChannelFlag::Failure,
            message: Some(message.into()),
        }
    }
}

/// A single channel read or write request and its result.
///
/// Read records carry the expected [`DataType`] and receive a value once the
/// read completes. Write records carry the value to write. In both cases the
/// [`ChannelStatus`] reports how the operation went.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelRecord {
    name: String,
    value_type: DataType,
    value: Option<TypedValue>,
    status: Option<ChannelStatus>,
    /// Milliseconds since the Unix epoch of the last status change.
    timestamp: u64,
}

impl ChannelRecord {
    /// Creates a record requesting a read of `name` as `value_type`.
    pub fn read(name: impl Into<String>, value_type: DataType) -> Self {
        ChannelRecord {
            name: name.into(),
            value_type,
            value: None,
            status: None,
            timestamp: 0,
        }
    }

    /// Creates a record requesting `value` to be written to `name`.
    pub fn write(name: impl Into<String>, value: TypedValue) -> Self {
        ChannelRecord {
            name: name.into(),
            value_type: value.data_type(),
            value: Some(value),
            status: None,
            timestamp: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> DataType {
        self.value_type
    }

    pub fn value(&self) -> Option<&TypedValue> {
        self.value.as_ref()
    }

    /// Status of the last operation, `None` if the record was never processed.
    pub fn status(&self) -> Option<&ChannelStatus> {
        self.status.as_ref()
    }

    /// Shorthand for the flag of [`status`](Self::status).
    pub fn flag(&self) -> Option<ChannelFlag> {
        self.status.as_ref().map(|s| s.flag)
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Stores a successfully read value.
    pub fn set_value(&mut self, value: TypedValue) {
        self.value = Some(value);
        self.set_status(ChannelStatus::success());
    }

    /// Marks a write as successful, keeping the written value.
    pub fn set_success(&mut self) {
        self.set_status(ChannelStatus::success());
    }

    /// Marks the record as failed with a diagnostic message.
    pub fn set_failure(&mut self, message: impl Into<String>) {
        self.set_status(ChannelStatus::failure(message));
    }

    /// Marks a read as failed and drops any value left by an earlier read.
    pub fn set_read_failure(&mut self, message: impl Into<String>) {
        self.value = None;
        self.set_failure(message);
    }

    pub fn set_status(&mut self, status: ChannelStatus) {
        self.status = Some(status);
        self.timestamp = now_millis();
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
