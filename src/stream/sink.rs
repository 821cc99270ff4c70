//! Seams to the terminal process and the confirmation UI

use parking_lot::Mutex;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::mpsc;

use crate::engine::WarningResult;

/// Where forwarded bytes go: the real shell's input
pub trait ShellSink: Send + Sync {
    fn write(&self, bytes: &[u8]) -> io::Result<()>;
}

impl<W: Write + Send> ShellSink for Mutex<W> {
    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let mut writer = self.lock();
        writer.write_all(bytes)?;
        writer.flush()
    }
}

/// Emitted when a submitted line matched a rule and its terminator is being held
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRequest {
    pub session_id: String,
    #[serde(flatten)]
    pub warning: WarningResult,
}

/// Receives review requests; must not block waiting for the decision
pub trait ReviewListener: Send + Sync {
    fn review_requested(&self, request: &ReviewRequest);
}

impl<F> ReviewListener for F
where
    F: Fn(&ReviewRequest) + Send + Sync,
{
    fn review_requested(&self, request: &ReviewRequest) {
        self(request)
    }
}

/// Hands requests to a confirmation surface running on another thread
impl ReviewListener for mpsc::Sender<ReviewRequest> {
    fn review_requested(&self, request: &ReviewRequest) {
        if let Err(e) = self.send(request.clone()) {
            tracing::warn!(
                session_id = %request.session_id,
                decision_id = %request.warning.decision_id,
                error = %e,
                "review request dropped; receiver is gone"
            );
        }
    }
}
