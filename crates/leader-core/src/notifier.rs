//! # notifier
//!
//! why: tell the application that this peer now leads
//! relations: invoked by election.rs when a round resolves to the local session
//! what: LeadershipNotifier capability, closure and channel implementations

use tokio::sync::mpsc::UnboundedSender;

use crate::PeerId;

/// Receives "this peer is the leader" signals
///
/// Fires once per qualifying round, not once per process: see `NotifyMode`.
pub trait LeadershipNotifier: Send + Sync {
    fn became_leader(&self);
}

impl<F: Fn() + Send + Sync> LeadershipNotifier for F {
    fn became_leader(&self) {
        self()
    }
}

/// Channel-backed notifier that emits the local peer id for the caller to drain
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    peer: PeerId,
    tx: UnboundedSender<PeerId>,
}

impl ChannelNotifier {
    pub fn new(peer: PeerId, tx: UnboundedSender<PeerId>) -> Self {
        Self { peer, tx }
    }
}

impl LeadershipNotifier for ChannelNotifier {
    fn became_leader(&self) {
        // receiver gone means nobody is interested any more
        let _ = self.tx.send(self.peer);
    }
}
