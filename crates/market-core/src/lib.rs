//! Multi-agent optimal stopping market.
//!
//! Agents driven by decision policies walk a sequence of houses and must
//! accept or reject each offer on the spot, competing for houses that can
//! each go to one agent only.
//!
//! # Modules
//!
//! - [`house`]: house values and quality ranges
//! - [`generators`]: seeded house-sequence generators
//! - [`policy`]: the decision protocol and the built-in policies
//! - [`agent`]: per-run agent state and population specifications
//! - [`environment`]: the round-based orchestrator

pub mod agent;
pub mod environment;
pub mod error;
pub mod generators;
pub mod house;
pub mod policy;

pub use agent::{spawn_agents, Agent, AgentId, AgentSpec, Match, PolicySource};
pub use environment::{Environment, EnvironmentConfig, PresentationMode, RunState, TieBreak};
pub use error::{SimError, SimResult};
pub use generators::HouseGenerator;
pub use house::{House, HouseId, QualityRange};
pub use policy::{
    CutoffBasis, Decision, DecisionContext, Greedy, OptimalStopping, Policy, PolicyConfig,
    Threshold,
};

// Outcome types come from the shared events crate
pub use market_events::{AgentOutcome, EventKind, MarketEvent, RunOutcome};
