//! Optimal stopping (secretary rule)
//!
//! Observe the first `floor(N * fraction)` offers without accepting, then take
//! the first offer strictly better than anything seen while observing.
//! What `N` means is configurable, see [`CutoffBasis`].

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::house::House;

use super::{Decision, DecisionContext, Policy};

/// Guards `floor` against products like `100 * 0.29 = 28.999999999999996`.
const CUTOFF_EPSILON: f64 = 1e-9;

/// Length the exploration fraction is applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CutoffBasis {
    /// Global number of houses in the market
    HouseCount,
    /// The agent's own offer horizon; falls back to offers observed so far
    #[default]
    OfferStream,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimalStopping {
    exploration_fraction: f64,
    basis: CutoffBasis,
    settle_on_final_offer: bool,
}

impl OptimalStopping {
    pub fn new(exploration_fraction: f64, basis: CutoffBasis) -> SimResult<Self> {
        if !(0.0..=1.0).contains(&exploration_fraction) {
            return Err(SimError::invalid(format!(
                "exploration fraction must be in [0, 1], got {}",
                exploration_fraction
            )));
        }
        Ok(Self {
            exploration_fraction,
            basis,
            settle_on_final_offer: false,
        })
    }

    /// The classical 1/e rule against the agent's own offer stream
    pub fn classic() -> Self {
        Self {
            exploration_fraction: std::f64::consts::E.recip(),
            basis: CutoffBasis::OfferStream,
            settle_on_final_offer: false,
        }
    }

    /// Accept whatever arrives when it is the last offer the agent can get.
    pub fn settle_on_final_offer(mut self, settle: bool) -> Self {
        self.settle_on_final_offer = settle;
        self
    }

    pub fn exploration_fraction(&self) -> f64 {
        self.exploration_fraction
    }

    pub fn basis(&self) -> CutoffBasis {
        self.basis
    }

    /// Number of offers to observe before accepting anything
    pub fn cutoff(&self, observed: usize, ctx: &DecisionContext) -> usize {
        let observed_with_current = observed + 1;
        let length = match self.basis {
            CutoffBasis::HouseCount => ctx
                .total_houses
                .or(ctx.offer_horizon)
                .unwrap_or(observed_with_current),
            CutoffBasis::OfferStream => ctx.offer_horizon.unwrap_or(observed_with_current),
        };
        (length as f64 * self.exploration_fraction + CUTOFF_EPSILON).floor() as usize
    }
}

impl Policy for OptimalStopping {
    fn name(&self) -> &str {
        "optimal_stopping"
    }

    fn decide(&self, history: &[f64], offer: &House, ctx: &DecisionContext) -> Decision {
        if self.settle_on_final_offer && ctx.is_final_offer() {
            return Decision::Accept;
        }

        let cutoff = self.cutoff(history.len(), ctx);
        if history.len() < cutoff {
            return Decision::Reject;
        }

        let best_explored = history[..cutoff]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        Decision::from(offer.quality > best_explored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::tests::solo_context;

    #[test]
    fn test_fraction_validation() {
        assert!(OptimalStopping::new(-0.1, CutoffBasis::HouseCount).is_err());
        assert!(OptimalStopping::new(1.01, CutoffBasis::OfferStream).is_err());
        assert!(OptimalStopping::new(f64::NAN, CutoffBasis::OfferStream).is_err());
        assert!(OptimalStopping::new(0.0, CutoffBasis::OfferStream).is_ok());
        assert!(OptimalStopping::new(1.0, CutoffBasis::HouseCount).is_ok());
    }

    #[test]
    fn test_cutoff_uses_floor() {
        let policy = OptimalStopping::new(0.37, CutoffBasis::HouseCount).unwrap();
        assert_eq!(policy.cutoff(0, &solo_context(0, 10)), 3);
        assert_eq!(policy.cutoff(0, &solo_context(0, 100)), 37);

        let policy = OptimalStopping::new(0.29, CutoffBasis::HouseCount).unwrap();
        assert_eq!(policy.cutoff(0, &solo_context(0, 100)), 29);
    }

    #[test]
    fn test_explores_then_beats_best() {
        let policy = OptimalStopping::new(0.3, CutoffBasis::HouseCount).unwrap();
        let qualities = [4.0, 8.0, 6.0, 7.0, 9.0, 10.0, 2.0, 3.0, 5.0, 1.0];

        let mut history = Vec::new();
        let mut accepted_at = None;
        for (i, &q) in qualities.iter().enumerate() {
            let house = House::new(format!("house_{}", i + 1), q);
            if policy.decide(&history, &house, &solo_context(i, qualities.len())).is_accept() {
                accepted_at = Some(i);
                break;
            }
            history.push(q);
        }

        // explores 4, 8, 6; 7 is not better than 8; 9 is
        assert_eq!(accepted_at, Some(4));
    }

    #[test]
    fn test_never_accepts_during_exploration() {
        let policy = OptimalStopping::new(0.5, CutoffBasis::HouseCount).unwrap();
        let best = House::new("best", 10.0);
        for i in 0..5 {
            let history = vec![1.0; i];
            assert_eq!(
                policy.decide(&history, &best, &solo_context(i, 10)),
                Decision::Reject
            );
        }
        assert_eq!(
            policy.decide(&[1.0; 5], &best, &solo_context(5, 10)),
            Decision::Accept
        );
    }

    #[test]
    fn test_zero_fraction_accepts_first_offer() {
        let policy = OptimalStopping::new(0.0, CutoffBasis::HouseCount).unwrap();
        let house = House::new("house_1", 1.0);
        assert!(policy.decide(&[], &house, &solo_context(0, 10)).is_accept());
    }

    #[test]
    fn test_full_fraction_never_accepts() {
        let policy = OptimalStopping::new(1.0, CutoffBasis::HouseCount).unwrap();
        let house = House::new("house_10", 10.0);
        assert!(!policy.decide(&[1.0; 9], &house, &solo_context(9, 10)).is_accept());
    }

    #[test]
    fn test_bases_differ_when_horizon_is_shorter() {
        // 20 houses globally, but this agent can only ever get 4 offers
        let ctx = DecisionContext {
            offer_horizon: Some(4),
            ..solo_context(2, 20)
        };
        let by_houses = OptimalStopping::new(0.5, CutoffBasis::HouseCount).unwrap();
        let by_stream = OptimalStopping::new(0.5, CutoffBasis::OfferStream).unwrap();

        assert_eq!(by_houses.cutoff(2, &ctx), 10);
        assert_eq!(by_stream.cutoff(2, &ctx), 2);

        let house = House::new("house_3", 9.0);
        assert!(!by_houses.decide(&[3.0, 5.0], &house, &ctx).is_accept());
        assert!(by_stream.decide(&[3.0, 5.0], &house, &ctx).is_accept());
    }

    #[test]
    fn test_stream_basis_without_horizon_counts_observed() {
        let ctx = DecisionContext {
            offer_horizon: None,
            total_houses: None,
            ..solo_context(3, 10)
        };
        let policy = OptimalStopping::new(0.5, CutoffBasis::OfferStream).unwrap();
        // 3 seen + current = 4 offers, cutoff 2
        assert_eq!(policy.cutoff(3, &ctx), 2);
        let house = House::new("h", 6.0);
        assert!(policy.decide(&[5.0, 2.0, 9.0], &house, &ctx).is_accept());
    }

    #[test]
    fn test_settle_on_final_offer() {
        let policy = OptimalStopping::new(0.5, CutoffBasis::HouseCount)
            .unwrap()
            .settle_on_final_offer(true);
        let poor = House::new("last", 1.0);
        assert!(policy.decide(&[9.0; 9], &poor, &solo_context(9, 10)).is_accept());
    }

    #[test]
    fn test_classic_fraction() {
        let policy = OptimalStopping::classic();
        assert!((policy.exploration_fraction() - 0.3679).abs() < 1e-3);
        assert_eq!(policy.basis(), CutoffBasis::OfferStream);
    }
}
