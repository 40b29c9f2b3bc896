//! House Generators
//!
//! Produce the house sequence for a run from a named quality distribution.
//! Every generator draws from a caller-supplied RNG so runs stay reproducible.

use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::house::{House, HouseId, QualityRange};

/// Quality distribution and house count for one market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "distribution", rename_all = "snake_case")]
pub enum HouseGenerator {
    /// Qualities drawn uniformly from `[min_quality, max_quality]`
    Uniform {
        #[serde(default = "default_n_houses")]
        n_houses: usize,
        #[serde(default = "default_min_quality")]
        min_quality: f64,
        #[serde(default = "default_max_quality")]
        max_quality: f64,
    },
    /// Gaussian qualities clamped to the standard range
    Normal {
        #[serde(default = "default_n_houses")]
        n_houses: usize,
        #[serde(default = "default_mean_quality")]
        mean_quality: f64,
        #[serde(default = "default_std_quality")]
        std_quality: f64,
    },
    /// Mixture of a low and a high quality market, clamped to the standard range
    Bimodal {
        #[serde(default = "default_n_houses")]
        n_houses: usize,
        #[serde(default = "default_low_mean")]
        low_mean: f64,
        #[serde(default = "default_high_mean")]
        high_mean: f64,
        #[serde(default = "default_bimodal_std")]
        std: f64,
        #[serde(default = "default_high_prob")]
        high_prob: f64,
    },
}

fn default_n_houses() -> usize {
    20
}
fn default_min_quality() -> f64 {
    1.0
}
fn default_max_quality() -> f64 {
    10.0
}
fn default_mean_quality() -> f64 {
    5.5
}
fn default_std_quality() -> f64 {
    2.0
}
fn default_low_mean() -> f64 {
    3.0
}
fn default_high_mean() -> f64 {
    8.0
}
fn default_bimodal_std() -> f64 {
    1.0
}
fn default_high_prob() -> f64 {
    0.3
}

impl Default for HouseGenerator {
    fn default() -> Self {
        HouseGenerator::uniform(default_n_houses())
    }
}

impl HouseGenerator {
    /// Uniform generator over the standard 1-10 range
    pub fn uniform(n_houses: usize) -> Self {
        HouseGenerator::Uniform {
            n_houses,
            min_quality: default_min_quality(),
            max_quality: default_max_quality(),
        }
    }

    pub fn normal(n_houses: usize) -> Self {
        HouseGenerator::Normal {
            n_houses,
            mean_quality: default_mean_quality(),
            std_quality: default_std_quality(),
        }
    }

    pub fn bimodal(n_houses: usize) -> Self {
        HouseGenerator::Bimodal {
            n_houses,
            low_mean: default_low_mean(),
            high_mean: default_high_mean(),
            std: default_bimodal_std(),
            high_prob: default_high_prob(),
        }
    }

    pub fn n_houses(&self) -> usize {
        match self {
            HouseGenerator::Uniform { n_houses, .. }
            | HouseGenerator::Normal { n_houses, .. }
            | HouseGenerator::Bimodal { n_houses, .. } => *n_houses,
        }
    }

    /// Short name of the distribution
    pub fn distribution_name(&self) -> &'static str {
        match self {
            HouseGenerator::Uniform { .. } => "uniform",
            HouseGenerator::Normal { .. } => "normal",
            HouseGenerator::Bimodal { .. } => "bimodal",
        }
    }

    /// Check parameters without drawing anything
    pub fn validate(&self) -> SimResult<()> {
        match *self {
            HouseGenerator::Uniform {
                min_quality,
                max_quality,
                ..
            } => {
                QualityRange::new(min_quality, max_quality)?;
                if !(max_quality - min_quality).is_finite() {
                    return Err(SimError::invalid(format!(
                        "uniform quality range [{}, {}] is too wide to sample",
                        min_quality, max_quality
                    )));
                }
                Ok(())
            }
            HouseGenerator::Normal {
                mean_quality,
                std_quality,
                ..
            } => {
                check_normal(mean_quality, std_quality)?;
                Ok(())
            }
            HouseGenerator::Bimodal {
                low_mean,
                high_mean,
                std,
                high_prob,
                ..
            } => {
                check_normal(low_mean, std)?;
                check_normal(high_mean, std)?;
                if !(0.0..=1.0).contains(&high_prob) {
                    return Err(SimError::invalid(format!(
                        "bimodal high_prob must be in [0, 1], got {}",
                        high_prob
                    )));
                }
                Ok(())
            }
        }
    }

    /// Draw a fresh house sequence named `house_1..house_n`
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> SimResult<Vec<House>> {
        self.validate()?;
        let range = QualityRange::STANDARD;

        let qualities: Vec<f64> = match *self {
            HouseGenerator::Uniform {
                n_houses,
                min_quality,
                max_quality,
            } => {
                let dist = Uniform::new_inclusive(min_quality, max_quality);
                (0..n_houses).map(|_| dist.sample(rng)).collect()
            }
            HouseGenerator::Normal {
                n_houses,
                mean_quality,
                std_quality,
            } => {
                let dist = check_normal(mean_quality, std_quality)?;
                (0..n_houses).map(|_| range.clamp(dist.sample(rng))).collect()
            }
            HouseGenerator::Bimodal {
                n_houses,
                low_mean,
                high_mean,
                std,
                high_prob,
            } => {
                let low = check_normal(low_mean, std)?;
                let high = check_normal(high_mean, std)?;
                (0..n_houses)
                    .map(|_| {
                        let q = if rng.gen::<f64>() < high_prob {
                            high.sample(rng)
                        } else {
                            low.sample(rng)
                        };
                        range.clamp(q)
                    })
                    .collect()
            }
        };

        Ok(qualities
            .into_iter()
            .enumerate()
            .map(|(i, quality)| House {
                id: HouseId::numbered(i + 1),
                quality,
            })
            .collect())
    }
}

fn check_normal(mean: f64, std: f64) -> SimResult<Normal<f64>> {
    if !mean.is_finite() {
        return Err(SimError::invalid(format!("mean quality must be finite, got {}", mean)));
    }
    if !std.is_finite() || std < 0.0 {
        return Err(SimError::invalid(format!(
            "quality standard deviation must be finite and non-negative, got {}",
            std
        )));
    }
    Normal::new(mean, std).map_err(|e| SimError::invalid(format!("normal distribution: {}", e)))
}
