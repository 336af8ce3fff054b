//! # types
//!
//! why: name the identities and lifecycle states the election works with
//! relations: used by every other module; PeerId is decoded by message.rs
//! what: PeerId, GroupId, ElectionState, NotifyMode, TimeoutPolicy

use serde::{Deserialize, Serialize};
use std::fmt;

/// Substrate-assigned identity of a connected peer (its session id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PeerId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Name of one independent election group
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Procedure name every member of the group registers and calls
    pub fn endpoint(&self) -> String {
        format!("ee.leader.{}", self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for GroupId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Setup phase of one peer's election
///
/// `Steady` and `Failed` are terminal for setup; only the leader belief keeps
/// changing once `Steady` is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionState {
    /// Constructed, nothing sent to the substrate yet
    #[default]
    Uninitialized,
    /// Registering the group endpoint
    Registering,
    /// Running the mandatory first round
    Bootstrapping,
    /// Watching for leader departures
    Steady,
    /// Setup aborted, needs an external restart
    Failed,
}

impl fmt::Display for ElectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Registering => "registering",
            Self::Bootstrapping => "bootstrapping",
            Self::Steady => "steady",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// When the leadership notifier fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyMode {
    /// Every round that resolves to this peer, re-confirmations included
    #[default]
    EveryRound,
    /// Only when the belief moves to this peer from anything else
    OnTransition,
}

/// What a re-election round does after its call timed out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TimeoutPolicy {
    /// Give up and keep the stale belief until the next leave event
    #[default]
    Leaderless,
    /// Run the round again, at most `attempts` more times
    Retry { attempts: u32 },
}
