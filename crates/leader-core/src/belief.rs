//! # belief
//!
//! why: hold this peer's opinion of who leads, shared between setup and re-election tasks
//! relations: written by election.rs after each round, read by watcher.rs per leave event
//! what: LeaderBelief handle, synchronized install/read

use parking_lot::Mutex;
use std::sync::Arc;

use crate::PeerId;

/// Locally cached leader identity
///
/// Cloning yields another handle to the same value. Writes are last-write-wins:
/// overlapping rounds carry no sequence numbers, so a slow round for an older
/// leave event may overwrite the result of a newer one.
#[derive(Debug, Clone, Default)]
pub struct LeaderBelief {
    current: Arc<Mutex<Option<PeerId>>>,
}

impl LeaderBelief {
    /// Create a belief in the "unknown" state
    pub fn new() -> Self {
        Self::default()
    }

    /// Current leader, `None` before the first round completes
    pub fn get(&self) -> Option<PeerId> {
        *self.current.lock()
    }

    /// Replace the belief and return what it held before
    pub fn install(&self, leader: PeerId) -> Option<PeerId> {
        self.current.lock().replace(leader)
    }

    /// Whether `peer` is the believed leader right now
    pub fn matches(&self, peer: PeerId) -> bool {
        self.get() == Some(peer)
    }
}
