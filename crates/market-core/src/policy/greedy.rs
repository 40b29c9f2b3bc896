//! Greedy policy: take the first house offered.

use crate::house::House;

use super::{Decision, DecisionContext, Policy};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Greedy;

impl Policy for Greedy {
    fn name(&self) -> &str {
        "greedy"
    }

    fn decide(&self, _history: &[f64], _offer: &House, _ctx: &DecisionContext) -> Decision {
        Decision::Accept
    }
}
