//! Driver configuration.
//!
//! [`DriverOptions`] holds the settings a block driver typically exposes to
//! its users: the minimum gap bridged by read aggregation and a flat list of
//! prohibited address ranges.
//!
//! ```
//! use fieldbus_blocks::DriverOptions;
//!
//! let options = DriverOptions::new(4, vec![10, 20, 30, 30]);
//! let blocks = options.prohibited_blocks().unwrap();
//! assert_eq!(blocks.len(), 2);
//! assert!(blocks.iter().all(|b| b.is_prohibited()));
//!
//! // Odd-length lists are rejected.
//! assert!(DriverOptions::new(0, vec![1]).prohibited_blocks().is_err());
//! ```

use crate::{Block, Error, Result};

/// Settings shared by block drivers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DriverOptions {
    /// Largest gap between two read blocks that is still merged.
    pub read_minimum_gap_size: u64,
    /// Prohibited ranges as `start, end, start, end, ...`.
    pub prohibited_blocks: Vec<u64>,
}

impl DriverOptions {
    pub fn new(read_minimum_gap_size: u64, prohibited_blocks: Vec<u64>) -> Self {
        DriverOptions {
            read_minimum_gap_size,
            prohibited_blocks,
        }
    }

    /// Converts the flat range list into prohibited [`Block`]s.
    ///
    /// Fails with [`Error::InvalidConfiguration`] if the list has an odd
    /// length or a pair has `start > end`.
    pub fn prohibited_blocks(&self) -> Result<Vec<Block>> {
        if self.prohibited_blocks.len() % 2 != 0 {
            return Err(Error::InvalidConfiguration(format!(
                "prohibited block list must hold start/end pairs, got {} values",
                self.prohibited_blocks.len()
            )));
        }
        self.prohibited_blocks
            .chunks_exact(2)
            .map(|pair| {
                Block::prohibited(pair[0], pair[1]).map_err(|_| {
                    Error::InvalidConfiguration(format!(
                        "prohibited block start {} is after its end {}",
                        pair[0], pair[1]
                    ))
                })
            })
            .collect()
    }

    /// Parses options from a JSON document. Missing fields take their
    /// default values.
    #[cfg(all(feature = "serde", feature = "serde_json"))]
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            Error::InvalidConfiguration(format!("JSON deserialization failed: {}", e))
        })
    }

    #[cfg(all(feature = "serde", feature = "serde_json"))]
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            Error::InvalidConfiguration(format!("JSON serialization failed: {}", e))
        })
    }

    /// Loads options from a JSON file.
    #[cfg(all(feature = "serde", feature = "serde_json"))]
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(Error::IOError)?;
        Self::from_json_str(&json)
    }

    /// Saves options as pretty-printed JSON.
    #[cfg(all(feature = "serde", feature = "serde_json"))]
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = self.to_json_string()?;
        std::fs::write(path, json).map_err(Error::IOError)?;
        Ok(())
    }
}
