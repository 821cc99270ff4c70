//! Compiled, ordered rule set

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::HashSet;

use crate::error::RuleError;
use crate::rules::{RiskLevel, Rule, RuleSource};

/// Upper bound on compiled program size for a single pattern
const MATCHER_SIZE_LIMIT: usize = 1 << 20;

/// Upper bound on the lazy DFA cache for a single pattern
const MATCHER_DFA_SIZE_LIMIT: usize = 1 << 20;

/// Whether a rule takes part in evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum RuleStatus {
    Active,
    /// Switched off by id in configuration
    Disabled,
    /// Risk level under the configured minimum
    BelowThreshold,
    /// Pattern failed to compile or the id collides with an earlier rule
    Invalid(String),
}

/// A rule as reported by [`crate::engine::RuleEngine::list_rules`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleEntry {
    #[serde(flatten)]
    pub rule: Rule,
    pub source: RuleSource,
    pub status: RuleStatus,
}

impl RuleEntry {
    pub fn is_active(&self) -> bool {
        self.status == RuleStatus::Active
    }
}

struct CompiledRule {
    entry: RuleEntry,
    matcher: Option<Regex>,
}

/// Rules in evaluation order: built-ins in catalog order, then customs in insertion order
pub(crate) struct RuleSet {
    rules: Vec<CompiledRule>,
    disabled: HashSet<String>,
    min_risk_level: RiskLevel,
}

impl RuleSet {
    pub(crate) fn new(disabled: impl IntoIterator<Item = String>, min_risk_level: RiskLevel) -> Self {
        Self {
            rules: Vec::new(),
            disabled: disabled.into_iter().collect(),
            min_risk_level,
        }
    }

    /// Compile and append a rule; failures leave it in the set as inactive
    pub(crate) fn push(&mut self, rule: Rule, source: RuleSource) -> Result<(), RuleError> {
        let (status, matcher, result) = match self.compile(&rule) {
            Ok(matcher) => (self.status_for(&rule, source), Some(matcher), Ok(())),
            Err(e) => (RuleStatus::Invalid(e.to_string()), None, Err(e)),
        };

        self.rules.push(CompiledRule {
            entry: RuleEntry {
                rule,
                source,
                status,
            },
            matcher,
        });

        result
    }

    fn status_for(&self, rule: &Rule, source: RuleSource) -> RuleStatus {
        if source == RuleSource::BuiltIn && self.disabled.contains(&rule.id) {
            RuleStatus::Disabled
        } else if !rule.risk_level.at_least(self.min_risk_level) {
            RuleStatus::BelowThreshold
        } else {
            RuleStatus::Active
        }
    }

    fn compile(&self, rule: &Rule) -> Result<Regex, RuleError> {
        if self.rules.iter().any(|r| r.entry.rule.id == rule.id) {
            return Err(RuleError::DuplicateId {
                id: rule.id.clone(),
            });
        }
        if rule.pattern.trim().is_empty() {
            return Err(RuleError::InvalidPattern {
                id: rule.id.clone(),
                reason: "empty pattern".to_string(),
            });
        }

        RegexBuilder::new(&rule.pattern)
            .case_insensitive(true)
            .size_limit(MATCHER_SIZE_LIMIT)
            .dfa_size_limit(MATCHER_DFA_SIZE_LIMIT)
            .build()
            .map_err(|e| RuleError::InvalidPattern {
                id: rule.id.clone(),
                reason: e.to_string(),
            })
    }

    /// First active rule whose pattern matches
    pub(crate) fn first_match(&self, candidate: &str) -> Option<&Rule> {
        self.rules
            .iter()
            .filter(|r| r.entry.is_active())
            .find(|r| r.matcher.as_ref().is_some_and(|m| m.is_match(candidate)))
            .map(|r| &r.entry.rule)
    }

    pub(crate) fn entries(&self) -> Vec<RuleEntry> {
        self.rules.iter().map(|r| r.entry.clone()).collect()
    }

    pub(crate) fn active_count(&self) -> usize {
        self.rules.iter().filter(|r| r.entry.is_active()).count()
    }
}
