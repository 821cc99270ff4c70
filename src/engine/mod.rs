//! Rule engine for shell-sentinel
//!
//! Classifies a single command line against the active rule set. Evaluation is
//! side-effect free and safe to share across sessions.

mod ruleset;
pub mod warning;

pub use ruleset::{RuleEntry, RuleStatus};
pub use warning::{DecisionId, WarningResult, ENGINE_FAULT_RULE_ID};

use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::EngineConfig;
use crate::error::RuleError;
use crate::rules::builtin::builtin_rules;
use crate::rules::{Rule, RuleSource};
use ruleset::RuleSet;

/// The main rule engine
pub struct RuleEngine {
    enabled: AtomicBool,
    rules: RwLock<RuleSet>,
    #[cfg(test)]
    fault: AtomicBool,
}

impl RuleEngine {
    /// Create a new engine: built-in rules first, then custom rules in configuration order
    pub fn new(config: &EngineConfig) -> Self {
        let mut set = RuleSet::new(config.disabled_rules.iter().cloned(), config.min_risk_level);

        for rule in builtin_rules() {
            if let Err(e) = set.push(rule, RuleSource::BuiltIn) {
                tracing::warn!(error = %e, "skipping built-in rule");
            }
        }
        for rule in &config.custom_rules {
            if let Err(e) = set.push(rule.clone(), RuleSource::Custom) {
                tracing::warn!(error = %e, "skipping custom rule");
            }
        }

        tracing::debug!(active = set.active_count(), "rule engine ready");

        Self {
            enabled: AtomicBool::new(config.enabled),
            rules: RwLock::new(set),
            #[cfg(test)]
            fault: AtomicBool::new(false),
        }
    }

    /// Evaluate one command line; returns the first matching rule's warning
    pub fn evaluate(&self, candidate: &str) -> Option<WarningResult> {
        if !self.is_enabled() {
            return None;
        }

        let candidate = candidate.trim();
        if candidate.is_empty() {
            return None;
        }

        #[cfg(test)]
        if self.fault.load(Ordering::SeqCst) {
            panic!("injected rule evaluation fault");
        }

        let rules = self.rules.read();
        let warning = rules
            .first_match(candidate)
            .map(|rule| WarningResult::new(rule, candidate));

        match &warning {
            Some(w) => tracing::debug!(rule_id = %w.rule_id, risk = %w.risk_level, "command matched"),
            None => tracing::trace!("command passed all rules"),
        }

        warning
    }

    /// Evaluate, turning an internal fault into a hold instead of a pass
    pub fn evaluate_guarded(&self, candidate: &str) -> Option<WarningResult> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.evaluate(candidate))) {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("rule evaluation panicked; holding command for review");
                Some(WarningResult::engine_fault(candidate.trim()))
            }
        }
    }

    /// Append a rule at the end of the evaluation order
    ///
    /// An invalid pattern is recorded as inactive and reported back, never raised.
    pub fn add_rule(&self, rule: Rule) -> Result<(), RuleError> {
        let result = self.rules.write().push(rule, RuleSource::Custom);
        if let Err(e) = &result {
            tracing::warn!(error = %e, "added rule is inactive");
        }
        result
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        tracing::info!(enabled, "rule engine toggled");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Snapshot of every rule with its status, in evaluation order
    pub fn list_rules(&self) -> Vec<RuleEntry> {
        self.rules.read().entries()
    }

    pub fn active_rule_count(&self) -> usize {
        self.rules.read().active_count()
    }

    /// Make every non-empty evaluation panic until switched off again
    #[cfg(test)]
    pub(crate) fn inject_fault(&self, on: bool) {
        self.fault.store(on, Ordering::SeqCst);
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
