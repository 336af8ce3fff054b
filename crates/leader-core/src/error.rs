//! # error
//!
//! why: separate fatal setup failures from per-round failures
//! relations: ElectionError is returned by LeaderElection::start, RoundError by every round
//! what: SubstrateError, RoundError, ElectionError

use thiserror::Error;

use crate::{ConfigError, ElectionState, PayloadError};

/// Failure reported by the messaging substrate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubstrateError {
    #[error("session is not connected")]
    NotConnected,

    #[error("no callee registered for procedure {0}")]
    NoSuchProcedure(String),

    #[error("procedure {0} is already registered with an incompatible policy")]
    ProcedureAlreadyExists(String),

    #[error("call failed: {0}")]
    CallFailed(String),
}

/// One election round did not produce a leader
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    #[error("endpoint call failed: {0}")]
    Call(#[from] SubstrateError),

    #[error("endpoint call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("leader returned an unusable result: {0}")]
    Payload(#[from] PayloadError),
}

impl RoundError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Election setup failed; the election stays in `Failed`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElectionError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("election already started (state: {state})")]
    AlreadyStarted { state: ElectionState },

    #[error("endpoint registration failed: {0}")]
    Registration(SubstrateError),

    #[error("bootstrap round failed: {0}")]
    Bootstrap(RoundError),

    #[error("leave subscription failed: {0}")]
    Subscription(SubstrateError),
}
