//! # testing
//!
//! why: drive rounds and leave events deterministically in unit tests
//! relations: used by election.rs and watcher.rs tests only
//! what: ScriptedSubstrate with queued call replies, counting notifier

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::{
    EventHandler, InvocationHandler, LeadershipNotifier, PeerId, RegisterOptions, Substrate,
    SubstrateError,
};

/// Scripted answer for the next call
pub enum Reply {
    Ok(Vec<Value>),
    Err(SubstrateError),
    Stall,
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Reply>,
    calls: Vec<String>,
    registrations: Vec<(String, RegisterOptions)>,
    handlers: Vec<InvocationHandler>,
    subscriptions: Vec<(String, EventHandler)>,
    register_error: Option<SubstrateError>,
    subscribe_error: Option<SubstrateError>,
}

pub struct ScriptedSubstrate {
    id: PeerId,
    script: Mutex<Script>,
}

impl ScriptedSubstrate {
    pub fn new(id: u64) -> Self {
        Self {
            id: PeerId(id),
            script: Mutex::new(Script::default()),
        }
    }

    pub fn push(&self, reply: Reply) {
        self.script.lock().replies.push_back(reply);
    }

    pub fn fail_register(&self, err: SubstrateError) {
        self.script.lock().register_error = Some(err);
    }

    pub fn fail_subscribe(&self, err: SubstrateError) {
        self.script.lock().subscribe_error = Some(err);
    }

    pub fn calls(&self) -> Vec<String> {
        self.script.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.script.lock().calls.len()
    }

    pub fn registrations(&self) -> Vec<(String, RegisterOptions)> {
        self.script.lock().registrations.clone()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        let script = self.script.lock();
        script.subscriptions.iter().map(|(topic, _)| topic.clone()).collect()
    }

    /// Call the first registered endpoint handler directly
    pub fn invoke_registered(&self, args: &[Value]) -> Vec<Value> {
        let handler = self.script.lock().handlers.first().cloned();
        handler.map(|h| h(args)).unwrap_or_default()
    }

    /// Deliver an event to every subscriber, as the substrate's dispatch path would
    pub fn deliver(&self, args: &[Value]) {
        let handlers: Vec<EventHandler> = {
            let script = self.script.lock();
            script.subscriptions.iter().map(|(_, h)| h.clone()).collect()
        };
        for handler in handlers {
            handler(args);
        }
    }
}

#[async_trait]
impl Substrate for ScriptedSubstrate {
    fn session_id(&self) -> PeerId {
        self.id
    }

    async fn register(
        &self,
        procedure: &str,
        options: RegisterOptions,
        handler: InvocationHandler,
    ) -> Result<(), SubstrateError> {
        let mut script = self.script.lock();
        if let Some(err) = script.register_error.take() {
            return Err(err);
        }
        script.registrations.push((procedure.to_string(), options));
        script.handlers.push(handler);
        Ok(())
    }

    async fn call(&self, procedure: &str, _args: Vec<Value>) -> Result<Vec<Value>, SubstrateError> {
        let reply = {
            let mut script = self.script.lock();
            script.calls.push(procedure.to_string());
            script.replies.pop_front()
        };
        match reply {
            Some(Reply::Ok(args)) => Ok(args),
            Some(Reply::Err(err)) => Err(err),
            Some(Reply::Stall) => std::future::pending().await,
            None => Err(SubstrateError::CallFailed("no scripted reply".into())),
        }
    }

    async fn subscribe(&self, topic: &str, handler: EventHandler) -> Result<(), SubstrateError> {
        let mut script = self.script.lock();
        if let Some(err) = script.subscribe_error.take() {
            return Err(err);
        }
        script.subscriptions.push((topic.to_string(), handler));
        Ok(())
    }
}

/// Notifier that counts how often it fired
pub fn counting_notifier() -> (Arc<AtomicUsize>, Arc<dyn LeadershipNotifier>) {
    let count = Arc::new(AtomicUsize::new(0));
    let count_clone = count.clone();
    let notifier: Arc<dyn LeadershipNotifier> = Arc::new(move || {
        count_clone.fetch_add(1, Ordering::SeqCst);
    });
    (count, notifier)
}
