//! # watcher
//!
//! why: re-elect when, and only when, the believed leader leaves the realm
//! relations: installed by election.rs after the bootstrap round, runs rounds via ElectionClient
//! what: LeaveWatcher, leave-event filtering, re-election dispatch

use serde_json::Value;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::message::peer_id_from_args;
use crate::{
    ElectionClient, EventHandler, PeerId, RoundError, Substrate, SubstrateError,
    SESSION_ON_LEAVE_TOPIC,
};

/// Watches session departures for one election
///
/// The substrate calls event handlers synchronously on a path shared with other
/// traffic, so matching events only spawn the re-election round; the call itself
/// runs on the runtime captured at construction.
pub struct LeaveWatcher<S: Substrate> {
    client: Arc<ElectionClient<S>>,
    runtime: Handle,
}

impl<S: Substrate> LeaveWatcher<S> {
    /// Must be called from within a tokio runtime
    pub fn new(client: Arc<ElectionClient<S>>) -> Self {
        Self {
            client,
            runtime: Handle::current(),
        }
    }

    /// Subscribe to the session leave topic
    pub async fn install(self) -> Result<(), SubstrateError> {
        let substrate = self.client.substrate().clone();
        let handler: EventHandler = Arc::new(move |args: &[Value]| {
            self.handle_event(args);
        });
        substrate.subscribe(SESSION_ON_LEAVE_TOPIC, handler).await
    }

    /// Handle one leave event; returns the re-election task when one was started.
    ///
    /// Malformed payloads and departures of anyone but the believed leader are
    /// dropped without surfacing an error.
    pub fn handle_event(&self, args: &[Value]) -> Option<JoinHandle<Result<PeerId, RoundError>>> {
        let group = self.client.group();
        let departed = match peer_id_from_args(args) {
            Ok(peer) => peer,
            Err(e) => {
                debug!(group = %group, error = %e, "ignoring malformed leave event");
                self.client.stats().record_ignored_event();
                return None;
            }
        };

        if !self.client.belief().matches(departed) {
            debug!(group = %group, departed = %departed, "non-leader left");
            self.client.stats().record_ignored_event();
            return None;
        }

        info!(group = %group, departed = %departed, "leader left, re-electing");
        self.client.stats().record_reelection();

        let client = self.client.clone();
        Some(self.runtime.spawn(async move {
            let result = client.reelect().await;
            if let Err(e) = &result {
                warn!(
                    group = %client.group(),
                    departed = %departed,
                    stale_leader = ?client.belief().get(),
                    error = %e,
                    "re-election failed, group leaderless until next leader departure"
                );
            }
            result
        }))
    }
}
