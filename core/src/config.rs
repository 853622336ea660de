// Reader configuration
// Policies for behaviour that FAT16 readers disagree on

use crate::error::{FatError, FatResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How `SeekOrigin::End` treats its delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndSeekPolicy {
    /// New position is `size + delta`
    Relative,
    /// Always land exactly at `size`, ignoring the delta
    ClampToEnd,
}

/// What to do with long-name code units above U+00FF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LongNamePolicy {
    /// Replace each such code unit with `?` and log a warning
    Substitute,
    /// Fail with `FatError::UnrepresentableCharacter`
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub end_seek: EndSeekPolicy,
    pub long_names: LongNamePolicy,
    /// Drop long-name runs whose checksum does not match their short entry
    pub verify_lfn_checksum: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            end_seek: EndSeekPolicy::Relative,
            long_names: LongNamePolicy::Substitute,
            verify_lfn_checksum: true,
        }
    }
}

impl ReaderConfig {
    /// Parse a JSON document; absent fields keep their defaults
    pub fn from_json_str(json: &str) -> FatResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> FatResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            FatError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }
}
