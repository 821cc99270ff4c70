//! Risk rules for shell-sentinel
//!
//! A rule is a pattern plus the advisory text shown when a command line matches it.

pub mod builtin;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a rule, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Check if this level meets a minimum threshold
    pub fn at_least(&self, threshold: RiskLevel) -> bool {
        *self >= threshold
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            "critical" => Some(RiskLevel::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A risk rule definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique identifier for this rule
    pub id: String,

    /// Regex pattern, matched case-insensitively
    pub pattern: String,

    /// How dangerous a matching command is
    #[serde(alias = "level")]
    pub risk_level: RiskLevel,

    /// What the command does that makes it risky
    pub description: String,

    /// What to do instead
    #[serde(default)]
    pub remediation: String,
}

impl Rule {
    /// Create a new rule
    pub fn new(
        id: impl Into<String>,
        pattern: impl Into<String>,
        risk_level: RiskLevel,
        description: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            pattern: pattern.into(),
            risk_level,
            description: description.into(),
            remediation: remediation.into(),
        }
    }
}

/// Where a rule came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    BuiltIn,
    Custom,
}
