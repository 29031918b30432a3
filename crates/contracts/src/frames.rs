//! FramePair - the (source, target) frames a sampler tracks

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ContractError;

/// Canonical form of a frame id: one leading `/` is dropped
///
/// `/odom` and `odom` name the same frame.
pub fn normalize_frame_id(frame: &str) -> &str {
    frame.strip_prefix('/').unwrap_or(frame)
}

/// Pair of coordinate frames
///
/// `source_frame` is the observation frame the twist is expressed in,
/// `target_frame` is the frame whose motion is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FramePair {
    pub source_frame: String,
    pub target_frame: String,
}

impl FramePair {
    /// Create a frame pair, rejecting empty identifiers
    ///
    /// Ids are normalized with [`normalize_frame_id`]. `source == target` is
    /// allowed; lookups then yield a zero twist.
    pub fn new(
        source_frame: impl Into<String>,
        target_frame: impl Into<String>,
    ) -> Result<Self, ContractError> {
        let source_frame = source_frame.into();
        let target_frame = target_frame.into();
        let pair = Self {
            source_frame: normalize_frame_id(&source_frame).to_string(),
            target_frame: normalize_frame_id(&target_frame).to_string(),
        };
        if pair.source_frame.trim().is_empty() {
            return Err(ContractError::config_validation(
                "source_frame",
                "frame id cannot be empty",
            ));
        }
        if pair.target_frame.trim().is_empty() {
            return Err(ContractError::config_validation(
                "target_frame",
                "frame id cannot be empty",
            ));
        }
        Ok(pair)
    }
}

impl fmt::Display for FramePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source_frame, self.target_frame)
    }
}
