//! # election
//!
//! why: decide who leads a group by asking the first-registrant endpoint
//! relations: uses substrate.rs for calls, belief.rs for state, watcher.rs for re-election
//! what: ElectionClient (one round), LeaderElection (setup state machine), elect_leader

use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::message::{peer_id_args, peer_id_from_args};
use crate::{
    ElectionConfig, ElectionError, ElectionState, ElectionStats, GroupId, InvocationHandler,
    LeaderBelief, LeadershipNotifier, LeaveWatcher, NotifyMode, PeerId, RegisterOptions,
    RoundError, StatsSnapshot, Substrate, SubstrateError, TimeoutPolicy,
};

/// Runs election rounds for one group on one session
pub struct ElectionClient<S: Substrate> {
    substrate: Arc<S>,
    group: GroupId,
    endpoint: String,
    config: ElectionConfig,
    belief: LeaderBelief,
    notifier: Arc<dyn LeadershipNotifier>,
    stats: Arc<ElectionStats>,
}

impl<S: Substrate> ElectionClient<S> {
    pub fn new(
        substrate: Arc<S>,
        group: GroupId,
        config: ElectionConfig,
        notifier: Arc<dyn LeadershipNotifier>,
    ) -> Self {
        Self {
            endpoint: group.endpoint(),
            substrate,
            group,
            config,
            belief: LeaderBelief::new(),
            notifier,
            stats: Arc::new(ElectionStats::new()),
        }
    }

    pub fn local_id(&self) -> PeerId {
        self.substrate.session_id()
    }

    pub fn group(&self) -> &GroupId {
        &self.group
    }

    pub fn belief(&self) -> &LeaderBelief {
        &self.belief
    }

    pub fn stats(&self) -> &ElectionStats {
        &self.stats
    }

    pub(crate) fn substrate(&self) -> &Arc<S> {
        &self.substrate
    }

    /// Register the endpoint that answers with this session's id.
    ///
    /// Only the first live registrant is ever invoked; this session becomes a
    /// backup if another peer got there first.
    pub async fn register_endpoint(&self) -> Result<(), SubstrateError> {
        let local = self.local_id();
        let handler: InvocationHandler = Arc::new(move |_args: &[Value]| peer_id_args(local));
        self.substrate
            .register(&self.endpoint, RegisterOptions::invoke_first(), handler)
            .await
    }

    /// Run one round: ask the endpoint who answers, record it, notify if self.
    ///
    /// On success the belief already holds the returned leader, and the notifier
    /// has fired for this round when that leader is the local session. On failure
    /// the belief is untouched.
    pub async fn run_round(&self) -> Result<PeerId, RoundError> {
        self.stats.record_round();

        let leader = match self.query_leader().await {
            Ok(leader) => leader,
            Err(e) => {
                self.stats.record_failed_round();
                return Err(e);
            }
        };

        let previous = self.belief.install(leader);
        if previous != Some(leader) {
            info!(group = %self.group, leader = %leader, previous = ?previous, "leader changed");
        }

        if leader == self.local_id() && self.should_notify(previous, leader) {
            self.stats.record_notification();
            self.notifier.became_leader();
        }

        Ok(leader)
    }

    /// A round triggered by the leader leaving; timeouts follow the configured policy
    pub async fn reelect(&self) -> Result<PeerId, RoundError> {
        let mut retries = match self.config.timeout_policy {
            TimeoutPolicy::Leaderless => 0,
            TimeoutPolicy::Retry { attempts } => attempts,
        };

        loop {
            match self.run_round().await {
                Err(e) if e.is_timeout() && retries > 0 => {
                    retries -= 1;
                    debug!(group = %self.group, retries_left = retries, "re-election timed out, retrying");
                }
                result => return result,
            }
        }
    }

    async fn query_leader(&self) -> Result<PeerId, RoundError> {
        let call = self.substrate.call(&self.endpoint, Vec::new());
        let args = tokio::time::timeout(self.config.call_timeout(), call)
            .await
            .map_err(|_| RoundError::Timeout {
                timeout_ms: self.config.call_timeout_ms,
            })??;

        Ok(peer_id_from_args(&args)?)
    }

    fn should_notify(&self, previous: Option<PeerId>, leader: PeerId) -> bool {
        match self.config.notify_mode {
            NotifyMode::EveryRound => true,
            NotifyMode::OnTransition => previous != Some(leader),
        }
    }
}

/// A peer's membership in one election group
///
/// Created in `Uninitialized`; [`LeaderElection::start`] registers the endpoint,
/// runs the bootstrap round and installs the leave watcher.
pub struct LeaderElection<S: Substrate> {
    client: Arc<ElectionClient<S>>,
    state: Mutex<ElectionState>,
}

impl<S: Substrate> LeaderElection<S> {
    /// Create an election with the default configuration
    pub fn new(
        substrate: Arc<S>,
        group: impl Into<GroupId>,
        notifier: impl LeadershipNotifier + 'static,
    ) -> Self {
        Self::with_config(substrate, group, notifier, ElectionConfig::default())
    }

    pub fn with_config(
        substrate: Arc<S>,
        group: impl Into<GroupId>,
        notifier: impl LeadershipNotifier + 'static,
        config: ElectionConfig,
    ) -> Self {
        let client = ElectionClient::new(substrate, group.into(), config, Arc::new(notifier));
        Self {
            client: Arc::new(client),
            state: Mutex::new(ElectionState::Uninitialized),
        }
    }

    /// Register, run the bootstrap round, then watch for leader departures.
    ///
    /// Any failure leaves the election in `Failed`; setup never runs twice.
    pub async fn start(&self) -> Result<(), ElectionError> {
        {
            let mut state = self.state.lock();
            if *state != ElectionState::Uninitialized {
                return Err(ElectionError::AlreadyStarted { state: *state });
            }
            *state = ElectionState::Registering;
        }

        match self.setup().await {
            Ok(()) => {
                self.transition(ElectionState::Steady);
                Ok(())
            }
            Err(e) => {
                error!(group = %self.client.group(), error = %e, "election setup failed");
                self.transition(ElectionState::Failed);
                Err(e)
            }
        }
    }

    async fn setup(&self) -> Result<(), ElectionError> {
        self.client.config.validate()?;

        self.client
            .register_endpoint()
            .await
            .map_err(ElectionError::Registration)?;

        self.transition(ElectionState::Bootstrapping);
        let leader = self
            .client
            .run_round()
            .await
            .map_err(ElectionError::Bootstrap)?;

        LeaveWatcher::new(self.client.clone())
            .install()
            .await
            .map_err(ElectionError::Subscription)?;

        info!(
            group = %self.client.group(),
            peer = %self.client.local_id(),
            leader = %leader,
            "election running"
        );
        Ok(())
    }

    fn transition(&self, next: ElectionState) {
        let mut state = self.state.lock();
        let from = *state;
        debug!(group = %self.client.group(), from = %from, to = %next, "election state");
        *state = next;
    }

    pub fn state(&self) -> ElectionState {
        *self.state.lock()
    }

    /// Believed leader, `None` until the bootstrap round succeeds
    pub fn leader(&self) -> Option<PeerId> {
        self.client.belief().get()
    }

    pub fn is_leader(&self) -> bool {
        self.client.belief().matches(self.client.local_id())
    }

    pub fn local_id(&self) -> PeerId {
        self.client.local_id()
    }

    pub fn group(&self) -> &GroupId {
        self.client.group()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.client.stats().snapshot()
    }
}

/// Join the election for `group` and run setup with the default configuration
pub async fn elect_leader<S: Substrate>(
    substrate: Arc<S>,
    group: impl Into<GroupId>,
    notifier: impl LeadershipNotifier + 'static,
) -> Result<LeaderElection<S>, ElectionError> {
    let election = LeaderElection::new(substrate, group, notifier);
    election.start().await?;
    Ok(election)
}
