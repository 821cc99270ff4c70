//! Pending-decision ledger
//!
//! Holds withheld line terminators keyed by decision id. Removal is the only way
//! out of the ledger, and `DashMap::remove` is atomic, so each decision resolves once.

use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::engine::{DecisionId, WarningResult};

/// A held command line awaiting confirm or cancel
#[derive(Debug, Clone)]
pub struct PendingDecision {
    pub session_id: String,
    /// Exact bytes to write on confirm
    pub withheld: Vec<u8>,
    pub warning: WarningResult,
    pub created_at: Instant,
}

#[derive(Debug, Default)]
pub struct PendingLedger {
    entries: DashMap<DecisionId, PendingDecision>,
}

impl PendingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: DecisionId, decision: PendingDecision) {
        self.entries.insert(id, decision);
    }

    /// Remove and return a decision; `None` if unknown or already resolved
    pub fn take(&self, id: &DecisionId) -> Option<PendingDecision> {
        self.entries.remove(id).map(|(_, decision)| decision)
    }

    /// Owning session of a pending decision, without resolving it
    pub fn session_of(&self, id: &DecisionId) -> Option<String> {
        self.entries.get(id).map(|entry| entry.session_id.clone())
    }

    /// Remove every decision owned by a session
    pub fn take_session(&self, session_id: &str) -> Vec<(DecisionId, PendingDecision)> {
        let ids: Vec<DecisionId> = self
            .entries
            .iter()
            .filter(|entry| entry.value().session_id == session_id)
            .map(|entry| *entry.key())
            .collect();

        ids.into_iter()
            .filter_map(|id| self.take(&id).map(|decision| (id, decision)))
            .collect()
    }

    /// Ids of decisions pending longer than `max_age`
    pub fn expired(&self, max_age: Duration) -> Vec<DecisionId> {
        self.entries
            .iter()
            .filter(|entry| entry.value().created_at.elapsed() >= max_age)
            .map(|entry| *entry.key())
            .collect()
    }

    pub fn contains(&self, id: &DecisionId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
