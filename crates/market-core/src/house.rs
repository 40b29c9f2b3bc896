//! House Values
//!
//! Immutable resources that agents compete for.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Unique identifier for a house within a run
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HouseId(pub String);

impl HouseId {
    /// Conventional name for the `n`th generated house (1-based)
    pub fn numbered(n: usize) -> Self {
        HouseId(format!("house_{}", n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HouseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A house offered on the market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct House {
    pub id: HouseId,
    pub quality: f64,
}

impl House {
    pub fn new(id: impl Into<String>, quality: f64) -> Self {
        Self {
            id: HouseId(id.into()),
            quality,
        }
    }
}

/// Closed interval of admissible house qualities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityRange {
    pub min: f64,
    pub max: f64,
}

impl QualityRange {
    /// The 1-10 scale used by the clamped generators
    pub const STANDARD: QualityRange = QualityRange { min: 1.0, max: 10.0 };

    pub fn new(min: f64, max: f64) -> SimResult<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(SimError::invalid(format!(
                "quality range bounds must be finite, got [{}, {}]",
                min, max
            )));
        }
        if min > max {
            return Err(SimError::invalid(format!(
                "quality range min {} exceeds max {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, quality: f64) -> bool {
        quality >= self.min && quality <= self.max
    }

    pub fn clamp(&self, quality: f64) -> f64 {
        quality.clamp(self.min, self.max)
    }
}

impl Default for QualityRange {
    fn default() -> Self {
        Self::STANDARD
    }
}
