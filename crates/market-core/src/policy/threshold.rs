//! Threshold policy: accept any house at least as good as a fixed bar.

use crate::error::{SimError, SimResult};
use crate::house::{House, QualityRange};

use super::{Decision, DecisionContext, Policy};

#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    threshold: f64,
    settle_on_final_offer: bool,
}

impl Threshold {
    /// Threshold on the standard 1-10 quality scale
    pub fn new(threshold: f64) -> SimResult<Self> {
        Self::with_range(threshold, QualityRange::STANDARD)
    }

    pub fn with_range(threshold: f64, range: QualityRange) -> SimResult<Self> {
        if !threshold.is_finite() || !range.contains(threshold) {
            return Err(SimError::invalid(format!(
                "threshold {} outside quality range [{}, {}]",
                threshold, range.min, range.max
            )));
        }
        Ok(Self {
            threshold,
            settle_on_final_offer: false,
        })
    }

    /// Accept whatever arrives when it is the last offer the agent can get.
    pub fn settle_on_final_offer(mut self, settle: bool) -> Self {
        self.settle_on_final_offer = settle;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Policy for Threshold {
    fn name(&self) -> &str {
        "threshold"
    }

    fn decide(&self, _history: &[f64], offer: &House, ctx: &DecisionContext) -> Decision {
        if self.settle_on_final_offer && ctx.is_final_offer() {
            return Decision::Accept;
        }
        Decision::from(offer.quality >= self.threshold)
    }
}
