//! Error types for shell-sentinel

use thiserror::Error;

/// Errors surfaced to callers of the interceptor and configuration loader.
#[derive(Debug, Error)]
pub enum SentinelError {
    /// Bytes arrived for a session that was never opened or has already ended
    #[error("unknown session: {0}")]
    UnknownSession(String),

    /// A session with this identifier is already open
    #[error("session already open: {0}")]
    SessionExists(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// A rule that could not be turned into a matcher.
///
/// Never returned from evaluation; kept on the rule entry as the reason it is inactive.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("rule {id}: invalid pattern: {reason}")]
    InvalidPattern { id: String, reason: String },

    #[error("rule {id}: duplicate rule id")]
    DuplicateId { id: String },
}

pub type Result<T, E = SentinelError> = std::result::Result<T, E>;
