//! JSONL audit logging for shell-sentinel
//!
//! Records the lifecycle of every held command to a JSONL file for later analysis.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::engine::{DecisionId, WarningResult};
use crate::redact::{redact_secrets, secret_kinds};
use crate::rules::RiskLevel;

/// Longest command text stored in an entry
const MAX_COMMAND_LEN: usize = 200;

/// What happened to a held command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEvent {
    ReviewRequested,
    Confirmed,
    Cancelled,
    /// Replaced by a newer hold in the same session before it was resolved
    Superseded,
    Orphaned,
    Expired,
}

/// An audit log entry
#[derive(Debug, Serialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,

    pub event: AuditEvent,

    pub session_id: String,

    pub decision_id: DecisionId,

    pub rule_id: String,

    pub risk_level: RiskLevel,

    /// Command text with secrets redacted
    pub command: String,

    /// Kinds of secret that were redacted from the command
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<&'static str>,
}

impl AuditEntry {
    pub fn new(event: AuditEvent, session_id: &str, warning: &WarningResult) -> Self {
        let secrets = secret_kinds(&warning.command);
        let mut command = redact_secrets(&warning.command).into_owned();
        if command.len() > MAX_COMMAND_LEN {
            let mut cut = MAX_COMMAND_LEN;
            while !command.is_char_boundary(cut) {
                cut -= 1;
            }
            command.truncate(cut);
            command.push_str("...");
        }

        Self {
            timestamp: Utc::now(),
            event,
            session_id: session_id.to_string(),
            decision_id: warning.decision_id,
            rule_id: warning.rule_id.clone(),
            risk_level: warning.risk_level,
            command,
            secrets,
        }
    }
}

/// Audit logger
#[derive(Default)]
pub struct AuditLogger {
    writer: Option<BufWriter<File>>,
}

impl AuditLogger {
    /// Create a new audit logger; an unopenable path yields a disabled logger
    pub fn new(path: Option<&Path>) -> Self {
        let writer = path.and_then(|p| {
            if let Some(parent) = p.parent() {
                let _ = std::fs::create_dir_all(parent);
            }

            match OpenOptions::new().create(true).append(true).open(p) {
                Ok(file) => Some(BufWriter::new(file)),
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "audit log disabled");
                    None
                }
            }
        });

        Self { writer }
    }

    pub fn log(&mut self, entry: &AuditEntry) -> Result<(), std::io::Error> {
        if let Some(ref mut writer) = self.writer {
            let json = serde_json::to_string(entry)?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }
        Ok(())
    }

    pub fn record(
        &mut self,
        event: AuditEvent,
        session_id: &str,
        warning: &WarningResult,
    ) -> Result<(), std::io::Error> {
        let entry = AuditEntry::new(event, session_id, warning);
        self.log(&entry)
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }
}
