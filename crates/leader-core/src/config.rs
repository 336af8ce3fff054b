//! # config
//!
//! why: make the round timeout and notification behaviour tunable per election
//! relations: consumed by election.rs and watcher.rs
//! what: ElectionConfig, ConfigError

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::{NotifyMode, TimeoutPolicy};

/// Invalid election configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("call timeout must be greater than zero")]
    ZeroTimeout,

    #[error("retry policy needs at least one attempt")]
    ZeroRetries,

    #[error("malformed config: {0}")]
    Parse(String),
}

/// Election tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectionConfig {
    /// Upper bound on one endpoint call (ms)
    pub call_timeout_ms: u64,
    /// Handling of a re-election whose call timed out
    pub timeout_policy: TimeoutPolicy,
    /// Level- or edge-triggered leadership notifications
    pub notify_mode: NotifyMode,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: 5000,
            timeout_policy: TimeoutPolicy::Leaderless,
            notify_mode: NotifyMode::EveryRound,
        }
    }
}

impl ElectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.timeout_policy = policy;
        self
    }

    pub fn with_notify_mode(mut self, mode: NotifyMode) -> Self {
        self.notify_mode = mode;
        self
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.call_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.timeout_policy == (TimeoutPolicy::Retry { attempts: 0 }) {
            return Err(ConfigError::ZeroRetries);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = ElectionConfig::default();
        assert_eq!(config.call_timeout(), Duration::from_secs(5));
        assert_eq!(config.timeout_policy, TimeoutPolicy::Leaderless);
        assert_eq!(config.notify_mode, NotifyMode::EveryRound);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builders_override_defaults() {
        let config = ElectionConfig::new()
            .with_call_timeout(Duration::from_millis(250))
            .with_timeout_policy(TimeoutPolicy::Retry { attempts: 3 })
            .with_notify_mode(NotifyMode::OnTransition);
        assert_eq!(config.call_timeout_ms, 250);
        assert_eq!(config.timeout_policy, TimeoutPolicy::Retry { attempts: 3 });
        assert_eq!(config.notify_mode, NotifyMode::OnTransition);
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let config = ElectionConfig::new().with_call_timeout(Duration::ZERO);
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout));
    }

    #[test]
    fn retry_without_attempts_is_invalid() {
        let config = ElectionConfig::new().with_timeout_policy(TimeoutPolicy::Retry { attempts: 0 });
        assert_eq!(config.validate(), Err(ConfigError::ZeroRetries));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = ElectionConfig::from_json(r#"{ "notify_mode": "on_transition" }"#).unwrap();
        assert_eq!(config.notify_mode, NotifyMode::OnTransition);
        assert_eq!(config.call_timeout_ms, 5000);
    }

    #[test]
    fn invalid_json_config_is_rejected() {
        assert!(matches!(
            ElectionConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
        assert_eq!(
            ElectionConfig::from_json(r#"{ "call_timeout_ms": 0 }"#),
            Err(ConfigError::ZeroTimeout)
        );
    }
}
