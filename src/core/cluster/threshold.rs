//! Validated similarity threshold.

use crate::error::ClusterError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Largest meaningful distance between two 64-bit hashes
pub const MAX_THRESHOLD: u32 = 64;

/// Maximum Hamming distance from a seed for an image to join its cluster.
///
/// Always within 0..=64; out-of-range values are rejected, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Threshold(u32);

impl Threshold {
    /// Validate a raw threshold
    pub fn new(value: u32) -> Result<Self, ClusterError> {
        if value > MAX_THRESHOLD {
            return Err(ClusterError::InvalidThreshold { value });
        }
        Ok(Self(value))
    }

    /// The raw distance
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Whether a distance is close enough to join a cluster
    pub fn admits(&self, distance: u32) -> bool {
        distance <= self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        ThresholdPreset::Normal.threshold()
    }
}

impl TryFrom<u32> for Threshold {
    type Error = ClusterError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Threshold> for u32 {
    fn from(threshold: Threshold) -> Self {
        threshold.0
    }
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Named thresholds offered to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPreset {
    /// Distance 2: near-identical only
    Strict,
    /// Distance 5: the default
    Normal,
    /// Distance 10: catches resized and recompressed copies
    Loose,
}

impl ThresholdPreset {
    pub fn threshold(&self) -> Threshold {
        match self {
            ThresholdPreset::Strict => Threshold(2),
            ThresholdPreset::Normal => Threshold(5),
            ThresholdPreset::Loose => Threshold(10),
        }
    }
}

impl FromStr for ThresholdPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(ThresholdPreset::Strict),
            "normal" => Ok(ThresholdPreset::Normal),
            "loose" => Ok(ThresholdPreset::Loose),
            other => Err(format!("unknown preset {other:?} (expected strict, normal or loose)")),
        }
    }
}
