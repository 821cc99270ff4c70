//! shell-sentinel - keystroke-level review of risky shell commands
//!
//! Sits between a terminal and the shell it drives. Keystrokes are forwarded as
//! they arrive; when the user submits a line that matches a risk rule, the line
//! terminator is held back until the user confirms or cancels the command.
//!
//! The review is advisory: it always lets an authorized user proceed, and it only
//! sees what is typed, not what the shell expands aliases or history into.
//!
//! # Features
//!
//! - **Line reconstruction**: rebuilds the submitted command from raw input,
//!   following backspace and skipping escape sequences
//! - **Rule engine**: ordered built-in and custom rules, first match wins
//! - **Hold and resume**: exactly-once confirm/cancel per held line
//! - **Audit logging**: JSONL log of every hold and its resolution
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use shell_sentinel::{Interceptor, ReviewRequest, RuleEngine};
//!
//! let interceptor = Interceptor::new(Arc::new(RuleEngine::default()), |_: &ReviewRequest| {});
//! let shell = Arc::new(Mutex::new(Vec::<u8>::new()));
//! interceptor.open_session("tty1", shell.clone()).unwrap();
//!
//! interceptor.process("tty1", b"rm -rf /\r").unwrap();
//! assert_eq!(shell.lock().as_slice(), b"rm -rf /");
//! assert_eq!(interceptor.pending_count(), 1);
//! ```

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod redact;
pub mod rules;
pub mod stream;

// Re-exports for convenience
pub use config::Config;
pub use engine::{DecisionId, RuleEngine, WarningResult};
pub use error::{ConfigError, RuleError, SentinelError};
pub use output::Verdict;
pub use rules::{RiskLevel, Rule};
pub use stream::{Action, Interceptor, Resolution, ReviewListener, ReviewRequest, ShellSink};
