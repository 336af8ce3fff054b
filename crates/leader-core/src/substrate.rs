//! # substrate
//!
//! why: the election only needs register / call / subscribe from the messaging layer
//! relations: implemented by leader-router (in-process realm) and by real clients
//! what: Substrate trait, handler types

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::{PeerId, RegisterOptions, SubstrateError};

/// Answers an invocation with a positional result list
pub type InvocationHandler = Arc<dyn Fn(&[Value]) -> Vec<Value> + Send + Sync>;

/// Receives one published event
///
/// Called on the substrate's delivery path, which is shared with other traffic:
/// implementations must return quickly and never await remote work inline.
pub type EventHandler = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// An established session on a shared RPC + pub/sub realm
#[async_trait]
pub trait Substrate: Send + Sync + 'static {
    /// Identity the realm assigned to this session
    fn session_id(&self) -> PeerId;

    /// Register `handler` under `procedure`
    async fn register(
        &self,
        procedure: &str,
        options: RegisterOptions,
        handler: InvocationHandler,
    ) -> Result<(), SubstrateError>;

    /// Invoke `procedure` and wait for its result list
    async fn call(&self, procedure: &str, args: Vec<Value>) -> Result<Vec<Value>, SubstrateError>;

    /// Deliver every event published on `topic` to `handler`
    async fn subscribe(&self, topic: &str, handler: EventHandler) -> Result<(), SubstrateError>;
}
