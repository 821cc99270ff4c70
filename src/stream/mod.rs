//! Keystroke interception for shell-sentinel
//!
//! Every input byte is forwarded to the shell as it arrives, except a line
//! terminator that submits a risky command. That terminator is held in the
//! [`PendingLedger`] until [`Interceptor::confirm`] or [`Interceptor::cancel`]
//! is called for its decision id.
//!
//! While a terminator is held the command text is still sitting at the shell
//! prompt, so the session keeps it buffered. Any edit to that text withdraws the
//! pending decision, and the next terminator is reviewed against the whole line
//! the shell would run.
//!
//! # Concurrency
//!
//! Each session's line state sits behind its own mutex, so bytes for one session
//! are processed in arrival order while separate sessions run in parallel. The
//! rule engine is shared read-only. A decision only enters or leaves the ledger
//! while its session's lock is held, and leaving is a single atomic remove, so a
//! decision is confirmed, cancelled, expired, superseded or orphaned exactly once.

pub mod ledger;
pub mod line;
pub mod sink;

pub use ledger::{PendingDecision, PendingLedger};
pub use line::{ByteClass, LineReconstructor, Step};
pub use sink::{ReviewListener, ReviewRequest, ShellSink};

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::audit::{AuditEvent, AuditLogger};
use crate::config::{Config, SessionConfig};
use crate::engine::{DecisionId, RuleEngine, WarningResult};
use crate::error::{Result, SentinelError};

/// What happened to one input byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Forward(u8),
    HoldLineTerminator { decision_id: DecisionId, byte: u8 },
}

/// Outcome of a confirm or cancel call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Withheld bytes were written to the shell
    Confirmed,
    /// Withheld bytes were dropped and the shell's input line cleared
    Cancelled,
    /// Unknown or already-resolved decision; nothing changed
    NotPending,
}

struct SessionState {
    line: LineReconstructor,
    sink: Arc<dyn ShellSink>,
    pending: Option<DecisionId>,
    closed: bool,
}

impl SessionState {
    fn write(&self, session_id: &str, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        if let Err(e) = self.sink.write(bytes) {
            tracing::warn!(session_id, error = %e, "failed to write to shell");
        }
    }
}

/// Per-session byte processor with a shared rule engine and decision ledger
pub struct Interceptor {
    engine: Arc<RuleEngine>,
    sessions: DashMap<String, Arc<Mutex<SessionState>>>,
    ledger: PendingLedger,
    listener: Arc<dyn ReviewListener>,
    audit: Mutex<AuditLogger>,
    buffer_capacity: usize,
    cancel_sequence: Vec<u8>,
    pending_timeout: Option<Duration>,
}

impl Interceptor {
    pub fn new(engine: Arc<RuleEngine>, listener: impl ReviewListener + 'static) -> Self {
        let defaults = SessionConfig::default();
        Self {
            engine,
            sessions: DashMap::new(),
            ledger: PendingLedger::new(),
            listener: Arc::new(listener),
            audit: Mutex::new(AuditLogger::default()),
            buffer_capacity: defaults.buffer_capacity,
            pending_timeout: defaults.pending_timeout(),
            cancel_sequence: defaults.cancel_sequence.into_bytes(),
        }
    }

    /// Build the engine, session settings and audit log from a full configuration
    pub fn from_config(config: &Config, listener: impl ReviewListener + 'static) -> Self {
        let engine = Arc::new(RuleEngine::new(&config.engine));
        let audit = AuditLogger::new(config.audit_path().as_deref());
        Self::new(engine, listener)
            .with_session_config(&config.session)
            .with_audit(audit)
    }

    pub fn with_session_config(mut self, config: &SessionConfig) -> Self {
        self.buffer_capacity = config.buffer_capacity;
        self.cancel_sequence = config.cancel_sequence.clone().into_bytes();
        self.pending_timeout = config.pending_timeout();
        self
    }

    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = Mutex::new(audit);
        self
    }

    pub fn engine(&self) -> &Arc<RuleEngine> {
        &self.engine
    }

    /// Start tracking a session that forwards into `sink`
    pub fn open_session(&self, session_id: &str, sink: Arc<dyn ShellSink>) -> Result<()> {
        use dashmap::mapref::entry::Entry;

        match self.sessions.entry(session_id.to_string()) {
            Entry::Occupied(_) => Err(SentinelError::SessionExists(session_id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(SessionState {
                    line: LineReconstructor::new(self.buffer_capacity),
                    sink,
                    pending: None,
                    closed: false,
                })));
                tracing::debug!(session_id, "session opened");
                Ok(())
            }
        }
    }

    fn session(&self, session_id: &str) -> Option<Arc<Mutex<SessionState>>> {
        self.sessions.get(session_id).map(|s| Arc::clone(s.value()))
    }

    /// Process input bytes for a session in order
    ///
    /// Forwarded bytes are written to the session's sink before this returns.
    /// Review requests and audit records are emitted after the session lock is
    /// released, so a listener may resolve the decision from inside the callback.
    pub fn process(&self, session_id: &str, bytes: &[u8]) -> Result<Vec<Action>> {
        let session = self
            .session(session_id)
            .ok_or_else(|| SentinelError::UnknownSession(session_id.to_string()))?;

        let mut actions = Vec::with_capacity(bytes.len());
        let mut requests = Vec::new();
        let mut events = Vec::new();
        {
            let mut state = session.lock();
            if state.closed {
                return Err(SentinelError::UnknownSession(session_id.to_string()));
            }
            let mut forwarded = Vec::with_capacity(bytes.len());

            for &byte in bytes {
                let step = state.line.feed(byte);
                let warning = match step {
                    Step::Forward => None,
                    Step::Edit => {
                        // The held text is no longer what the shell would run
                        if let Some(retired) = self.retire_pending(&mut state) {
                            events.push((AuditEvent::Superseded, retired.warning));
                        }
                        None
                    }
                    Step::Submit(candidate) => {
                        if let Some(retired) = self.retire_pending(&mut state) {
                            events.push((AuditEvent::Superseded, retired.warning));
                        }
                        let warning = self.engine.evaluate_guarded(&candidate);
                        if warning.is_none() {
                            state.line.clear();
                        }
                        warning
                    }
                };

                match warning {
                    None => {
                        forwarded.push(byte);
                        actions.push(Action::Forward(byte));
                    }
                    Some(warning) => {
                        let decision_id = warning.decision_id;
                        self.hold(&mut state, session_id, byte, warning.clone());
                        actions.push(Action::HoldLineTerminator { decision_id, byte });
                        events.push((AuditEvent::ReviewRequested, warning.clone()));
                        requests.push(ReviewRequest {
                            session_id: session_id.to_string(),
                            warning,
                        });
                    }
                }
            }

            state.write(session_id, &forwarded);

            // Holds withdrawn later in this same batch need no review
            requests.retain(|r| state.pending == Some(r.warning.decision_id));
        }

        for (event, warning) in &events {
            if *event == AuditEvent::Superseded {
                tracing::info!(
                    session_id,
                    decision_id = %warning.decision_id,
                    "pending decision withdrawn by further input"
                );
            }
            self.audit(*event, session_id, warning);
        }
        for request in &requests {
            self.listener.review_requested(request);
        }

        Ok(actions)
    }

    /// Take the session's pending decision out of the ledger without writing anything
    fn retire_pending(&self, state: &mut SessionState) -> Option<PendingDecision> {
        let previous = state.pending.take()?;
        self.ledger.take(&previous)
    }

    fn hold(&self, state: &mut SessionState, session_id: &str, byte: u8, warning: WarningResult) {
        let decision_id = warning.decision_id;
        tracing::info!(
            session_id,
            %decision_id,
            rule_id = %warning.rule_id,
            risk = %warning.risk_level,
            "holding command for review"
        );

        self.ledger.insert(
            decision_id,
            PendingDecision {
                session_id: session_id.to_string(),
                withheld: vec![byte],
                warning,
                created_at: Instant::now(),
            },
        );
        state.pending = Some(decision_id);
    }

    /// Remove a decision from the ledger under its session's lock, then let `finish`
    /// write to the session
    ///
    /// Decisions of a session that is shutting down are left for
    /// [`Interceptor::on_session_end`] to orphan.
    fn resolve(
        &self,
        decision_id: &DecisionId,
        finish: impl FnOnce(&SessionState, &PendingDecision),
    ) -> Option<PendingDecision> {
        let session_id = self.ledger.session_of(decision_id)?;
        let session = self.session(&session_id)?;
        let mut state = session.lock();
        let decision = self.ledger.take(decision_id)?;

        if state.pending == Some(*decision_id) {
            state.pending = None;
        }
        state.line.clear();
        finish(&*state, &decision);
        Some(decision)
    }

    /// Approve a held command: its line terminator is written to the shell
    pub fn confirm(&self, decision_id: &DecisionId) -> Resolution {
        let resolved = self.resolve(decision_id, |state, decision| {
            state.write(&decision.session_id, &decision.withheld)
        });
        let Some(decision) = resolved else {
            tracing::warn!(%decision_id, "confirm for unknown or resolved decision");
            return Resolution::NotPending;
        };

        tracing::info!(%decision_id, "command confirmed");
        self.audit(AuditEvent::Confirmed, &decision.session_id, &decision.warning);
        Resolution::Confirmed
    }

    /// Reject a held command: its terminator is dropped and the shell's input line cleared
    pub fn cancel(&self, decision_id: &DecisionId) -> Resolution {
        if self.discard(decision_id, AuditEvent::Cancelled) {
            Resolution::Cancelled
        } else {
            tracing::warn!(%decision_id, "cancel for unknown or resolved decision");
            Resolution::NotPending
        }
    }

    fn discard(&self, decision_id: &DecisionId, event: AuditEvent) -> bool {
        let resolved = self.resolve(decision_id, |state, decision| {
            state.write(&decision.session_id, &self.cancel_sequence)
        });
        let Some(decision) = resolved else {
            return false;
        };

        tracing::info!(%decision_id, ?event, "command discarded");
        self.audit(event, &decision.session_id, &decision.warning);
        true
    }

    /// Drop a session and orphan any decision it still has pending
    ///
    /// Returns the number of orphaned decisions.
    pub fn on_session_end(&self, session_id: &str) -> usize {
        let session = self.sessions.remove(session_id).map(|(_, s)| s);

        // Holding the lock keeps an in-flight `process` call from adding a hold after cleanup
        let mut state = session.as_ref().map(|s| s.lock());
        if let Some(state) = state.as_mut() {
            state.closed = true;
            state.pending = None;
        }

        let orphaned = self.ledger.take_session(session_id);
        drop(state);
        for (decision_id, decision) in &orphaned {
            tracing::info!(session_id, %decision_id, "pending decision orphaned");
            self.audit(AuditEvent::Orphaned, session_id, &decision.warning);
        }
        tracing::debug!(session_id, "session closed");
        orphaned.len()
    }

    /// Cancel decisions older than the configured timeout
    pub fn expire_stale(&self) -> Vec<DecisionId> {
        let Some(timeout) = self.pending_timeout else {
            return Vec::new();
        };

        self.ledger
            .expired(timeout)
            .into_iter()
            .filter(|id| self.discard(id, AuditEvent::Expired))
            .collect()
    }

    /// Check a command line without touching any session
    pub fn evaluate(&self, candidate: &str) -> Option<WarningResult> {
        self.engine.evaluate(candidate)
    }

    pub fn is_pending(&self, decision_id: &DecisionId) -> bool {
        self.ledger.contains(decision_id)
    }

    pub fn pending_count(&self) -> usize {
        self.ledger.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn audit(&self, event: AuditEvent, session_id: &str, warning: &WarningResult) {
        if let Err(e) = self.audit.lock().record(event, session_id, warning) {
            tracing::warn!(error = %e, "failed to write audit log");
        }
    }
}
