//! Warning results produced when a command line matches a rule

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::rules::{RiskLevel, Rule};

/// Rule id reported when evaluation itself failed and the line is held anyway
pub const ENGINE_FAULT_RULE_ID: &str = "engine-fault";

/// Correlates a held command line with its eventual confirm or cancel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DecisionId(Uuid);

impl DecisionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier handed back by a confirmation surface
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for DecisionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DecisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The outcome of a rule match against one candidate line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarningResult {
    pub decision_id: DecisionId,
    pub rule_id: String,
    pub risk_level: RiskLevel,
    /// Trimmed command text that was evaluated
    pub command: String,
    pub description: String,
    pub remediation: String,
}

impl WarningResult {
    pub fn new(rule: &Rule, command: &str) -> Self {
        Self {
            decision_id: DecisionId::new(),
            rule_id: rule.id.clone(),
            risk_level: rule.risk_level,
            command: command.to_string(),
            description: rule.description.clone(),
            remediation: rule.remediation.clone(),
        }
    }

    /// Warning used when evaluation failed; holds the line for review instead of passing it
    pub fn engine_fault(command: &str) -> Self {
        Self {
            decision_id: DecisionId::new(),
            rule_id: ENGINE_FAULT_RULE_ID.to_string(),
            risk_level: RiskLevel::Critical,
            command: command.to_string(),
            description: "The command could not be checked".to_string(),
            remediation: "Review the command yourself before running it".to_string(),
        }
    }

    pub fn is_engine_fault(&self) -> bool {
        self.rule_id == ENGINE_FAULT_RULE_ID
    }
}
