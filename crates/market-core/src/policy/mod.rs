//! Decision Policies
//!
//! A policy looks at what one agent has observed so far plus the offer in
//! front of it and answers accept or reject. Policies hold configuration
//! only: all per-agent progress lives in the agent's history, so a single
//! instance can be shared by any number of agents.

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SimResult;
use crate::house::{House, QualityRange};

pub mod greedy;
pub mod optimal_stopping;
pub mod threshold;

pub use greedy::Greedy;
pub use optimal_stopping::{CutoffBasis, OptimalStopping};
pub use threshold::Threshold;

/// Outcome of a single policy evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn is_accept(self) -> bool {
        self == Decision::Accept
    }
}

impl From<bool> for Decision {
    fn from(accept: bool) -> Self {
        if accept {
            Decision::Accept
        } else {
            Decision::Reject
        }
    }
}

/// Public market information available to a policy when it decides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionContext {
    /// Global round, 1-based
    pub round: u64,
    /// Offers this agent received before the current one
    pub offer_index: usize,
    pub total_rounds: Option<u64>,
    pub total_houses: Option<usize>,
    /// Houses still on offer at the start of the round, current offer included:
    /// not yet presented in a shared market, unclaimed in a private stream
    pub houses_left: usize,
    pub total_agents: usize,
    /// Active agents at the start of the round
    pub agents_left: usize,
    /// Most offers this agent can receive over the whole run, as far as the
    /// environment knows at decision time
    pub offer_horizon: Option<usize>,
}

impl DecisionContext {
    /// True when no further offer can reach this agent after the current one.
    pub fn is_final_offer(&self) -> bool {
        self.offer_horizon
            .map(|horizon| horizon <= self.offer_index + 1)
            .unwrap_or(false)
    }
}

/// Accept/reject decision rule.
pub trait Policy: Debug + Send + Sync {
    /// Short label used in logs
    fn name(&self) -> &str;

    /// Decide on `offer` given the qualities this agent has seen so far.
    fn decide(&self, history: &[f64], offer: &House, ctx: &DecisionContext) -> Decision;
}

/// Serializable description of a policy, validated when built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyConfig {
    Greedy,
    Threshold {
        threshold: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quality_range: Option<QualityRange>,
        #[serde(default)]
        settle_on_final_offer: bool,
    },
    OptimalStopping {
        exploration_fraction: f64,
        #[serde(default)]
        basis: CutoffBasis,
        #[serde(default)]
        settle_on_final_offer: bool,
    },
}

impl PolicyConfig {
    pub fn build(&self) -> SimResult<Arc<dyn Policy>> {
        let policy: Arc<dyn Policy> = match *self {
            PolicyConfig::Greedy => Arc::new(Greedy),
            PolicyConfig::Threshold {
                threshold,
                quality_range,
                settle_on_final_offer,
            } => {
                let range = quality_range.unwrap_or_default();
                Arc::new(
                    Threshold::with_range(threshold, range)?
                        .settle_on_final_offer(settle_on_final_offer),
                )
            }
            PolicyConfig::OptimalStopping {
                exploration_fraction,
                basis,
                settle_on_final_offer,
            } => Arc::new(
                OptimalStopping::new(exploration_fraction, basis)?
                    .settle_on_final_offer(settle_on_final_offer),
            ),
        };
        Ok(policy)
    }
}
