//! Simulation errors.

use thiserror::Error;

/// Errors raised by market setup or by the orchestrator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Bad parameters, detected before any round runs
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// A house claimed twice or an agent matched twice; the run is aborted
    #[error("consistency violation: {0}")]
    ConsistencyViolation(String),
}

impl SimError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        SimError::InvalidConfiguration(msg.into())
    }

    pub fn violation(msg: impl Into<String>) -> Self {
        SimError::ConsistencyViolation(msg.into())
    }
}

pub type SimResult<T> = Result<T, SimError>;
