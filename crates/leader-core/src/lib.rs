//! # leader-core
//!
//! why: elect one leader per group on top of a realm with first-registrant-wins rpc
//! relations: substrate implemented by leader-router (in-process) or a real session
//! what: election rounds, leader belief, leave watching, setup state machine

pub mod belief;
pub mod config;
pub mod election;
pub mod error;
pub mod message;
pub mod notifier;
pub mod stats;
pub mod substrate;
pub mod types;
pub mod watcher;

#[cfg(test)]
mod testing;

pub use belief::LeaderBelief;
pub use config::{ConfigError, ElectionConfig};
pub use election::{elect_leader, ElectionClient, LeaderElection};
pub use error::{ElectionError, RoundError, SubstrateError};
pub use message::{
    peer_id_args, peer_id_from_args, InvokePolicy, PayloadError, RegisterOptions,
    SESSION_ON_LEAVE_TOPIC,
};
pub use notifier::{ChannelNotifier, LeadershipNotifier};
pub use stats::{ElectionStats, StatsSnapshot};
pub use substrate::{EventHandler, InvocationHandler, Substrate};
pub use types::{ElectionState, GroupId, NotifyMode, PeerId, TimeoutPolicy};
pub use watcher::LeaveWatcher;
