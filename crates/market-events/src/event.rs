//! Event Types
//!
//! Per-round records emitted by the market environment.

use serde::{Deserialize, Serialize};

/// Primary event type categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A house was shown to an agent and the agent rejected it
    Rejected,
    /// A house was shown to an agent and the agent accepted it
    Accepted,
    /// An agent was bound to a house
    Matched,
    /// An agent accepted a house but another acceptor won the tie-break
    LostTieBreak,
    /// The run ended while the agent was still active
    Exhausted,
}

impl EventKind {
    /// Returns all event kind variants.
    pub fn all() -> &'static [EventKind] {
        &[
            EventKind::Rejected,
            EventKind::Accepted,
            EventKind::Matched,
            EventKind::LostTieBreak,
            EventKind::Exhausted,
        ]
    }

    /// True for kinds that end an agent's participation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventKind::Matched | EventKind::Exhausted)
    }
}

/// A single event in the market log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    /// Round in which the event happened (1-based; 0 for events at termination of an empty run)
    pub round: u64,
    pub kind: EventKind,
    pub agent_id: String,
    /// House involved, absent for `Exhausted`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
}

impl MarketEvent {
    pub fn new(
        round: u64,
        kind: EventKind,
        agent_id: impl Into<String>,
        house: Option<(&str, f64)>,
    ) -> Self {
        let (house_id, quality) = match house {
            Some((id, q)) => (Some(id.to_string()), Some(q)),
            None => (None, None),
        };
        Self {
            round,
            kind,
            agent_id: agent_id.into(),
            house_id,
            quality,
        }
    }

    /// Serialize to a single JSONL line
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from a single JSONL line
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}
