//! # stats
//!
//! why: leaderless windows after a failed re-election must be visible to operators
//! relations: updated by election.rs and watcher.rs, exposed through LeaderElection::stats
//! what: ElectionStats counters, StatsSnapshot

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one election, safe to update from concurrent rounds
#[derive(Debug, Default)]
pub struct ElectionStats {
    rounds: AtomicU64,
    failed_rounds: AtomicU64,
    notifications: AtomicU64,
    ignored_events: AtomicU64,
    reelections: AtomicU64,
}

/// Point-in-time copy of [`ElectionStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Rounds started, bootstrap included
    pub rounds: u64,
    /// Rounds that ended without installing a leader
    pub failed_rounds: u64,
    /// Times the leadership notifier fired
    pub notifications: u64,
    /// Leave events dropped (malformed, or not about the leader)
    pub ignored_events: u64,
    /// Re-election tasks dispatched by the leave watcher
    pub reelections: u64,
}

impl ElectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_round(&self) {
        self.rounds.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed_round(&self) {
        self.failed_rounds.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_notification(&self) {
        self.notifications.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_ignored_event(&self) {
        self.ignored_events.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reelection(&self) {
        self.reelections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            rounds: self.rounds.load(Ordering::Relaxed),
            failed_rounds: self.failed_rounds.load(Ordering::Relaxed),
            notifications: self.notifications.load(Ordering::Relaxed),
            ignored_events: self.ignored_events.load(Ordering::Relaxed),
            reelections: self.reelections.load(Ordering::Relaxed),
        }
    }
}
