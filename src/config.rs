//! Configuration loading for shell-sentinel
//!
//! Supports TOML configuration with embedded defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::rules::{RiskLevel, Rule};

/// Default cap on the per-session line buffer
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Ctrl-U: kill the current input line
pub const DEFAULT_CANCEL_SEQUENCE: &str = "\u{15}";

/// Environment variable that disables the engine at startup
pub const DISABLE_ENV_VAR: &str = "SHELL_SENTINEL_DISABLED";

/// Rule engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// When false, every command passes without review
    pub enabled: bool,

    /// Rules below this level are loaded but never evaluated
    pub min_risk_level: RiskLevel,

    /// Built-in rule ids to switch off
    pub disabled_rules: Vec<String>,

    /// User-defined rules, appended after the built-ins in this order
    pub custom_rules: Vec<Rule>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_risk_level: RiskLevel::Low,
            disabled_rules: Vec::new(),
            custom_rules: Vec::new(),
        }
    }
}

/// Per-session stream handling
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum bytes kept in the logical line buffer
    pub buffer_capacity: usize,

    /// Bytes written to the shell when a held line is cancelled
    pub cancel_sequence: String,

    /// Cancel pending decisions older than this; unset means wait indefinitely
    pub pending_timeout_secs: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            cancel_sequence: DEFAULT_CANCEL_SEQUENCE.to_string(),
            pending_timeout_secs: None,
        }
    }
}

impl SessionConfig {
    pub fn pending_timeout(&self) -> Option<Duration> {
        self.pending_timeout_secs.map(Duration::from_secs)
    }
}

/// Audit log configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,

    /// Path to the JSONL audit log
    pub path: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: Some("~/.local/state/shell-sentinel/audit.jsonl".to_string()),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub session: SessionConfig,
    pub audit: AuditConfig,
}

impl Config {
    /// Load configuration from the first readable standard location, or use defaults
    pub fn load() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("shell-sentinel/config.toml")),
            Some(PathBuf::from("/etc/shell-sentinel/config.toml")),
        ];

        for path in config_paths.into_iter().flatten() {
            if path.exists() {
                match Self::load_from(&path) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!(error = %e, "ignoring config file"),
                }
            }
        }

        Config::default()
    }

    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) {
        if std::env::var_os(DISABLE_ENV_VAR).is_some() {
            self.engine.enabled = false;
        }
    }

    /// Expand ~ in path strings
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Get the audit log path (expanded) if auditing is on
    pub fn audit_path(&self) -> Option<PathBuf> {
        if !self.audit.enabled {
            return None;
        }
        self.audit.path.as_deref().map(Self::expand_path)
    }
}

/// Embedded example configuration
pub const EXAMPLE_CONFIG_TOML: &str = r#"
[engine]
enabled = true
min_risk_level = "low"
disabled_rules = ["history-clear"]

[[engine.custom_rules]]
id = "deploy-prod"
pattern = "\\bdeploy\\b.*\\bprod(uction)?\\b"
risk_level = "high"
description = "Deploying to production"
remediation = "Deploy to staging first"

[session]
buffer_capacity = 65536
cancel_sequence = "\u0015"

[audit]
enabled = false
path = "~/.local/state/shell-sentinel/audit.jsonl"
"#;
