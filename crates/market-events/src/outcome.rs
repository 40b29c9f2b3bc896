//! Run Outcomes
//!
//! Final, read-only results of a single market run.

use serde::{Deserialize, Serialize};

use crate::event::MarketEvent;

/// Result for one agent at the end of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutcome {
    pub agent_id: String,
    /// Name of the specification entry this agent was expanded from
    pub group: String,
    pub matched: bool,
    pub house_id: Option<String>,
    pub quality: Option<f64>,
    pub round_matched: Option<u64>,
    /// Offers presented to the agent, including the one it matched on
    pub offers_seen: usize,
}

impl AgentOutcome {
    pub fn unmatched(agent_id: impl Into<String>, group: impl Into<String>, offers_seen: usize) -> Self {
        Self {
            agent_id: agent_id.into(),
            group: group.into(),
            matched: false,
            house_id: None,
            quality: None,
            round_matched: None,
            offers_seen,
        }
    }
}

/// Complete outcome of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// One entry per agent, in population order
    pub agents: Vec<AgentOutcome>,
    /// Houses nobody claimed, in presentation order
    pub unmatched_houses: Vec<String>,
    pub total_rounds: u64,
    pub total_houses: usize,
    /// Sum of matched house qualities
    pub achieved_quality: f64,
    /// Sum of the best `min(agents, houses)` house qualities
    pub max_quality: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<MarketEvent>,
}

impl RunOutcome {
    /// Achieved quality over the perfect-foresight maximum, 0 when the maximum is not positive
    pub fn efficiency_score(&self) -> f64 {
        if self.max_quality > 0.0 {
            self.achieved_quality / self.max_quality
        } else {
            0.0
        }
    }

    pub fn matched_count(&self) -> usize {
        self.agents.iter().filter(|a| a.matched).count()
    }

    /// Matched agents over total agents
    pub fn match_rate(&self) -> f64 {
        if self.agents.is_empty() {
            return 0.0;
        }
        self.matched_count() as f64 / self.agents.len() as f64
    }

    pub fn matched(&self) -> impl Iterator<Item = &AgentOutcome> {
        self.agents.iter().filter(|a| a.matched)
    }

    pub fn unmatched(&self) -> impl Iterator<Item = &AgentOutcome> {
        self.agents.iter().filter(|a| !a.matched)
    }

    pub fn agent(&self, agent_id: &str) -> Option<&AgentOutcome> {
        self.agents.iter().find(|a| a.agent_id == agent_id)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Sum of the `n` highest qualities.
pub fn top_quality_sum(qualities: &[f64], n: usize) -> f64 {
    let mut sorted = qualities.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    sorted.iter().take(n).sum()
}
