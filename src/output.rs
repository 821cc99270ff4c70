//! JSON verdicts for the command-line checker

use serde::Serialize;

use crate::engine::WarningResult;
use crate::rules::RiskLevel;

/// Verdict for a single command line
#[derive(Debug, Serialize)]
pub struct Verdict {
    /// "review" when a rule matched, "pass" otherwise
    pub decision: &'static str,

    pub command: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl Verdict {
    pub fn pass(command: &str) -> Self {
        Verdict {
            decision: "pass",
            command: command.trim().to_string(),
            rule_id: None,
            risk_level: None,
            description: None,
            remediation: None,
        }
    }

    pub fn review(warning: &WarningResult) -> Self {
        Verdict {
            decision: "review",
            command: warning.command.clone(),
            rule_id: Some(warning.rule_id.clone()),
            risk_level: Some(warning.risk_level),
            description: Some(warning.description.clone()),
            remediation: Some(warning.remediation.clone()).filter(|r| !r.is_empty()),
        }
    }

    pub fn from_evaluation(command: &str, warning: Option<&WarningResult>) -> Self {
        match warning {
            Some(w) => Verdict::review(w),
            None => Verdict::pass(command),
        }
    }

    pub fn needs_review(&self) -> bool {
        self.rule_id.is_some()
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// One-line human summary
    pub fn to_text(&self) -> String {
        match (&self.rule_id, self.risk_level, &self.description) {
            (Some(rule_id), Some(level), Some(description)) => {
                let mut text = format!("[sentinel:{}] {} risk: {}", rule_id, level, description);
                if let Some(remediation) = &self.remediation {
                    text.push_str(&format!(" ({})", remediation));
                }
                text
            }
            _ => format!("[sentinel] ok: {}", self.command),
        }
    }
}
