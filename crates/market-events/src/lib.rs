//! Shared event and outcome types for the housing market simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is a dependency for all other crates in the workspace.

pub mod event;
pub mod outcome;

// Re-export event types
pub use event::{EventKind, MarketEvent};

// Re-export outcome types
pub use outcome::{top_quality_sum, AgentOutcome, RunOutcome};
