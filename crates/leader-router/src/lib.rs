//! # leader-router
//!
//! why: provide a realm that keeps the election's substrate contract without a network
//! relations: implements leader_core::Substrate; used by integration tests and embedders
//! what: Router (shared realm), Session (one peer), CallFault injection, call spying

use async_trait::async_trait;
use leader_core::{
    EventHandler, InvocationHandler, InvokePolicy, PeerId, RegisterOptions, Substrate,
    SubstrateError, SESSION_ON_LEAVE_TOPIC,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// Fault applied to the next call routed through the realm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallFault {
    /// Call fails with a substrate error
    Error,
    /// Callee answers with an empty result list
    Empty,
    /// Callee answers with something that is not a session id
    Malformed,
    /// Call never completes
    Stall,
}

struct Procedure {
    policy: InvokePolicy,
    /// registration order; failover walks this list
    callees: Vec<(PeerId, InvocationHandler)>,
    next: usize,
}

impl Procedure {
    fn select(&mut self) -> Option<(PeerId, InvocationHandler)> {
        let picked = match self.policy {
            InvokePolicy::Single | InvokePolicy::First => self.callees.first(),
            InvokePolicy::Last => self.callees.last(),
            InvokePolicy::RoundRobin => {
                if self.callees.is_empty() {
                    None
                } else {
                    let idx = self.next % self.callees.len();
                    self.next = self.next.wrapping_add(1);
                    self.callees.get(idx)
                }
            }
        };
        picked.cloned()
    }

    fn responder(&self) -> Option<PeerId> {
        match self.policy {
            InvokePolicy::Single | InvokePolicy::First => self.callees.first().map(|(id, _)| *id),
            InvokePolicy::Last => self.callees.last().map(|(id, _)| *id),
            InvokePolicy::RoundRobin => self
                .callees
                .get(self.next % self.callees.len().max(1))
                .map(|(id, _)| *id),
        }
    }
}

#[derive(Default)]
struct Realm {
    last_session: u64,
    sessions: HashSet<PeerId>,
    procedures: HashMap<String, Procedure>,
    subscriptions: HashMap<String, Vec<(PeerId, EventHandler)>>,
    call_counts: HashMap<String, u64>,
    faults: VecDeque<CallFault>,
}

impl Realm {
    fn ensure_connected(&self, peer: PeerId) -> Result<(), SubstrateError> {
        if self.sessions.contains(&peer) {
            Ok(())
        } else {
            Err(SubstrateError::NotConnected)
        }
    }

    fn handlers_for(&self, topic: &str) -> Vec<EventHandler> {
        self.subscriptions
            .get(topic)
            .map(|subs| subs.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default()
    }
}

/// In-process realm shared by every session that joins it
///
/// Cloning yields another handle to the same realm.
#[derive(Clone, Default)]
pub struct Router {
    realm: Arc<Mutex<Realm>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session with a fresh id (ids start at 1 and never repeat)
    pub fn join(&self) -> Session {
        let mut realm = self.realm.lock();
        realm.last_session += 1;
        let id = PeerId(realm.last_session);
        realm.sessions.insert(id);
        debug!(peer = %id, "session joined");
        Session {
            id,
            router: self.clone(),
        }
    }

    /// Publish `args` on `topic` to every subscriber, synchronously
    pub fn publish(&self, topic: &str, args: &[Value]) {
        let handlers = self.realm.lock().handlers_for(topic);
        for handler in handlers {
            handler(args);
        }
    }

    /// Number of calls routed to `procedure` so far
    pub fn call_count(&self, procedure: &str) -> u64 {
        self.realm
            .lock()
            .call_counts
            .get(procedure)
            .copied()
            .unwrap_or(0)
    }

    /// Session the next call to `procedure` would be delivered to
    pub fn responder(&self, procedure: &str) -> Option<PeerId> {
        self.realm
            .lock()
            .procedures
            .get(procedure)
            .and_then(Procedure::responder)
    }

    /// Sessions registered for `procedure`, in failover order
    pub fn registrants(&self, procedure: &str) -> Vec<PeerId> {
        self.realm
            .lock()
            .procedures
            .get(procedure)
            .map(|p| p.callees.iter().map(|(id, _)| *id).collect())
            .unwrap_or_default()
    }

    pub fn is_connected(&self, peer: PeerId) -> bool {
        self.realm.lock().sessions.contains(&peer)
    }

    /// Queue a fault for the next call, whichever procedure it targets
    pub fn inject_fault(&self, fault: CallFault) {
        self.realm.lock().faults.push_back(fault);
    }

    fn leave(&self, peer: PeerId) {
        let handlers = {
            let mut realm = self.realm.lock();
            if !realm.sessions.remove(&peer) {
                return;
            }

            realm.procedures.retain(|name, procedure| {
                let was_responder = procedure.responder() == Some(peer);
                procedure.callees.retain(|(id, _)| *id != peer);
                if was_responder {
                    if let Some(next) = procedure.responder() {
                        debug!(procedure = %name, responder = %next, "registration failed over");
                    }
                }
                !procedure.callees.is_empty()
            });
            for subs in realm.subscriptions.values_mut() {
                subs.retain(|(id, _)| *id != peer);
            }

            realm.handlers_for(SESSION_ON_LEAVE_TOPIC)
        };

        debug!(peer = %peer, subscribers = handlers.len(), "session left");
        let args = [Value::from(peer.0)];
        for handler in handlers {
            handler(&args);
        }
    }
}

/// One peer's connection to a [`Router`]
pub struct Session {
    id: PeerId,
    router: Router,
}

impl Session {
    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Leave the realm: drop this session's registrations and subscriptions,
    /// then publish its id on the session leave topic. Leaving twice is a no-op.
    pub fn leave(&self) {
        self.router.leave(self.id);
    }
}

#[async_trait]
impl Substrate for Session {
    fn session_id(&self) -> PeerId {
        self.id
    }

    async fn register(
        &self,
        procedure: &str,
        options: RegisterOptions,
        handler: InvocationHandler,
    ) -> Result<(), SubstrateError> {
        let mut realm = self.router.realm.lock();
        realm.ensure_connected(self.id)?;

        match realm.procedures.get_mut(procedure) {
            None => {
                realm.procedures.insert(
                    procedure.to_string(),
                    Procedure {
                        policy: options.invoke,
                        callees: vec![(self.id, handler)],
                        next: 0,
                    },
                );
            }
            Some(existing) => {
                let shared = existing.policy == options.invoke
                    && existing.policy != InvokePolicy::Single
                    && existing.callees.iter().all(|(id, _)| *id != self.id);
                if !shared {
                    return Err(SubstrateError::ProcedureAlreadyExists(procedure.to_string()));
                }
                existing.callees.push((self.id, handler));
            }
        }

        debug!(peer = %self.id, procedure = %procedure, policy = ?options.invoke, "registered");
        Ok(())
    }

    async fn call(&self, procedure: &str, args: Vec<Value>) -> Result<Vec<Value>, SubstrateError> {
        let (fault, callee) = {
            let mut realm = self.router.realm.lock();
            realm.ensure_connected(self.id)?;
            *realm.call_counts.entry(procedure.to_string()).or_insert(0) += 1;
            let fault = realm.faults.pop_front();
            let callee = realm
                .procedures
                .get_mut(procedure)
                .and_then(Procedure::select);
            (fault, callee)
        };

        match fault {
            Some(CallFault::Error) => {
                return Err(SubstrateError::CallFailed("injected fault".to_string()))
            }
            Some(CallFault::Empty) => return Ok(Vec::new()),
            Some(CallFault::Malformed) => return Ok(vec![Value::from("not-a-session")]),
            Some(CallFault::Stall) => std::future::pending::<()>().await,
            None => {}
        }

        let (_, handler) =
            callee.ok_or_else(|| SubstrateError::NoSuchProcedure(procedure.to_string()))?;
        Ok(handler(&args))
    }

    async fn subscribe(&self, topic: &str, handler: EventHandler) -> Result<(), SubstrateError> {
        let mut realm = self.router.realm.lock();
        realm.ensure_connected(self.id)?;
        realm
            .subscriptions
            .entry(topic.to_string())
            .or_default()
            .push((self.id, handler));
        Ok(())
    }
}
