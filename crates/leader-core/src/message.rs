//! # message
//!
//! why: pin down the payload shapes exchanged with the substrate
//! relations: used by election.rs to read round results, watcher.rs to read leave events
//! what: well-known topic, registration options, invocation policy, identity decoding

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::PeerId;

/// Meta topic the substrate publishes on whenever a session leaves the realm
pub const SESSION_ON_LEAVE_TOPIC: &str = "wamp.session.on_leave";

/// How the substrate picks a callee among several registrants of one procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvokePolicy {
    /// Only one registrant allowed
    #[default]
    Single,
    /// First live registrant answers, later ones are backups
    First,
    /// Most recent registrant answers
    Last,
    RoundRobin,
}

/// Options sent along with a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegisterOptions {
    pub invoke: InvokePolicy,
}

impl RegisterOptions {
    /// Options the election endpoint is registered with
    pub fn invoke_first() -> Self {
        Self {
            invoke: InvokePolicy::First,
        }
    }
}

/// Why an argument list did not carry a peer identity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("payload is empty")]
    Empty,

    #[error("first argument is not a session id: {0}")]
    NotAnId(Value),
}

/// Reads the peer identity from the first positional argument
pub fn peer_id_from_args(args: &[Value]) -> Result<PeerId, PayloadError> {
    let first = args.first().ok_or(PayloadError::Empty)?;
    first
        .as_u64()
        .map(PeerId)
        .ok_or_else(|| PayloadError::NotAnId(first.clone()))
}

/// Builds the single-element result an endpoint answers with
pub fn peer_id_args(id: PeerId) -> Vec<Value> {
    vec![Value::from(id.0)]
}
