//! Integration tests for the keystroke interception pipeline

use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;

use shell_sentinel::{
    Action, DecisionId, Interceptor, Resolution, ReviewRequest, RiskLevel, RuleEngine,
};

struct Harness {
    interceptor: Interceptor,
    shell: Arc<Mutex<Vec<u8>>>,
    requests: Arc<Mutex<Vec<ReviewRequest>>>,
}

impl Harness {
    fn new() -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let interceptor =
            Interceptor::new(Arc::new(RuleEngine::default()), move |r: &ReviewRequest| {
                seen.lock().push(r.clone())
            });
        let shell = Arc::new(Mutex::new(Vec::<u8>::new()));
        interceptor.open_session("tty1", shell.clone()).unwrap();
        Harness {
            interceptor,
            shell,
            requests,
        }
    }

    /// Feed bytes one call per byte, like a terminal in raw mode
    fn type_bytes(&self, bytes: &[u8]) -> Vec<Action> {
        bytes
            .iter()
            .flat_map(|b| self.interceptor.process("tty1", &[*b]).unwrap())
            .collect()
    }

    fn shell_output(&self) -> Vec<u8> {
        self.shell.lock().clone()
    }

    fn last_decision(&self) -> DecisionId {
        self.requests.lock().last().unwrap().warning.decision_id
    }
}

// ============================================================================
// Forwarding properties
// ============================================================================

#[test]
fn test_bytes_without_terminator_all_forwarded() {
    let h = Harness::new();
    let input = b"rm -rf / \x1b[D\x1b[C\x7f echo hi";
    let actions = h.type_bytes(input);

    assert_eq!(actions.len(), input.len());
    assert!(actions.iter().all(|a| matches!(a, Action::Forward(_))));
    assert_eq!(h.shell_output(), input.to_vec());
    assert!(h.requests.lock().is_empty());
}

#[test]
fn test_safe_lines_forwarded_in_order_without_duplication() {
    let h = Harness::new();
    let input = b"echo one\rls -la\ncargo test\r";
    h.interceptor.process("tty1", input).unwrap();
    assert_eq!(h.shell_output(), input.to_vec());
}

#[test]
fn test_empty_line_terminator_forwarded() {
    let h = Harness::new();
    h.type_bytes(b"   \r\r");
    assert_eq!(h.shell_output(), b"   \r\r".to_vec());
    assert_eq!(h.interceptor.pending_count(), 0);
}

#[test]
fn test_escape_sequences_do_not_touch_line() {
    let h = Harness::new();
    // Up arrow then Home then delete-key sequences typed around "ls"
    h.type_bytes(b"\x1b[Al\x1b[Hs\x1b[3~\r");
    assert!(h.requests.lock().is_empty());
    assert_eq!(h.shell_output(), b"\x1b[Al\x1b[Hs\x1b[3~\r".to_vec());
}

#[test]
fn test_interrupt_abandons_line() {
    let h = Harness::new();
    h.type_bytes(b"rm -rf /\x03\r");
    assert!(h.requests.lock().is_empty());
    assert_eq!(h.shell_output(), b"rm -rf /\x03\r".to_vec());
}

#[test]
fn test_oversized_paste_still_forwarded() {
    let h = Harness::new();
    let paste = vec![b'a'; 100 * 1024];
    h.interceptor.process("tty1", &paste).unwrap();
    assert_eq!(h.shell_output().len(), paste.len());
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn scenario_a_git_status_passes() {
    let h = Harness::new();
    let actions = h.type_bytes(b"git status\r");

    assert_eq!(actions.last(), Some(&Action::Forward(b'\r')));
    assert_eq!(h.shell_output(), b"git status\r".to_vec());
    assert!(h.requests.lock().is_empty());
}

#[test]
fn scenario_b_rm_rf_root_is_held() {
    let h = Harness::new();
    let actions = h.type_bytes(b"rm -rf /\r");

    assert_eq!(h.shell_output(), b"rm -rf /".to_vec());
    let requests = h.requests.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].session_id, "tty1");
    assert_eq!(requests[0].warning.rule_id, "rm-rf");
    assert_eq!(requests[0].warning.risk_level, RiskLevel::Critical);
    assert_eq!(requests[0].warning.command, "rm -rf /");
    assert_eq!(
        actions.last(),
        Some(&Action::HoldLineTerminator {
            decision_id: requests[0].warning.decision_id,
            byte: b'\r'
        })
    );
}

#[test]
fn scenario_c_confirm_forwards_terminator_once() {
    let h = Harness::new();
    h.type_bytes(b"rm -rf /\r");
    let id = h.last_decision();

    assert_eq!(h.interceptor.confirm(&id), Resolution::Confirmed);
    assert_eq!(h.shell_output(), b"rm -rf /\r".to_vec());

    assert_eq!(h.interceptor.confirm(&id), Resolution::NotPending);
    assert_eq!(h.interceptor.cancel(&id), Resolution::NotPending);
    assert_eq!(h.shell_output(), b"rm -rf /\r".to_vec());
}

#[test]
fn scenario_c_cancel_sends_line_clear_instead() {
    let h = Harness::new();
    h.type_bytes(b"rm -rf /\r");
    let id = h.last_decision();

    assert_eq!(h.interceptor.cancel(&id), Resolution::Cancelled);
    assert_eq!(h.shell_output(), b"rm -rf /\x15".to_vec());

    assert_eq!(h.interceptor.cancel(&id), Resolution::NotPending);
    assert_eq!(h.interceptor.confirm(&id), Resolution::NotPending);
    assert_eq!(h.shell_output(), b"rm -rf /\x15".to_vec());
}

#[test]
fn scenario_d_backspaced_command_is_not_reviewed() {
    let h = Harness::new();
    h.type_bytes(b"rm -rf /");
    h.type_bytes(&[0x7f; 9]);
    h.type_bytes(b"ls\r");

    assert!(h.requests.lock().is_empty());
    assert_eq!(h.interceptor.pending_count(), 0);
    assert!(h.shell_output().ends_with(b"ls\r"));
}

#[test]
fn scenario_e_session_end_orphans_pending_decision() {
    let h = Harness::new();
    h.type_bytes(b"rm -rf /\r");
    let id = h.last_decision();

    assert_eq!(h.interceptor.on_session_end("tty1"), 1);
    assert!(!h.interceptor.is_pending(&id));
    assert_eq!(h.interceptor.confirm(&id), Resolution::NotPending);
    assert_eq!(h.shell_output(), b"rm -rf /".to_vec());
    assert!(h.interceptor.process("tty1", b"ls\r").is_err());
}

// ============================================================================
// Resolution protocol
// ============================================================================

#[test]
fn test_typing_continues_after_resolution() {
    let h = Harness::new();
    h.type_bytes(b"rm -rf /\r");
    h.interceptor.cancel(&h.last_decision());

    h.type_bytes(b"ls\r");
    assert!(h.shell_output().ends_with(b"\x15ls\r"));
    assert_eq!(h.interceptor.pending_count(), 0);
}

#[test]
fn test_decisions_are_per_session() {
    let h = Harness::new();
    let other = Arc::new(Mutex::new(Vec::<u8>::new()));
    h.interceptor.open_session("tty2", other.clone()).unwrap();

    h.interceptor.process("tty1", b"rm -rf /\r").unwrap();
    h.interceptor.process("tty2", b"terraform destroy\r").unwrap();
    assert_eq!(h.interceptor.pending_count(), 2);

    assert_eq!(h.interceptor.on_session_end("tty2"), 1);
    assert_eq!(h.interceptor.pending_count(), 1);

    let tty1_decision = h.requests.lock()[0].warning.decision_id;
    assert_eq!(h.interceptor.confirm(&tty1_decision), Resolution::Confirmed);
    assert_eq!(other.lock().as_slice(), b"terraform destroy");
}

#[test]
fn test_concurrent_resolution_happens_once() {
    let h = Arc::new(Harness::new());
    h.type_bytes(b"rm -rf /\r");
    let id = h.last_decision();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let h = Arc::clone(&h);
            thread::spawn(move || {
                if i % 2 == 0 {
                    h.interceptor.confirm(&id)
                } else {
                    h.interceptor.cancel(&id)
                }
            })
        })
        .collect();

    let resolved = handles
        .into_iter()
        .map(|t| t.join().unwrap())
        .filter(|r| *r != Resolution::NotPending)
        .count();

    assert_eq!(resolved, 1);
    let output = h.shell_output();
    let tail = &output[b"rm -rf /".len()..];
    assert!(tail == b"\r" || tail == b"\x15");
}

#[test]
fn test_parallel_sessions_are_independent() {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);
    let interceptor = Arc::new(Interceptor::new(
        Arc::new(RuleEngine::default()),
        move |r: &ReviewRequest| seen.lock().push(r.session_id.clone()),
    ));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let interceptor = Arc::clone(&interceptor);
            thread::spawn(move || {
                let id = format!("tty{}", i);
                let shell = Arc::new(Mutex::new(Vec::<u8>::new()));
                interceptor.open_session(&id, shell.clone()).unwrap();
                for &b in b"ls -la\rrm -rf /\r" {
                    interceptor.process(&id, &[b]).unwrap();
                }
                let output = shell.lock().clone();
                output
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), b"ls -la\rrm -rf /".to_vec());
    }
    assert_eq!(requests.lock().len(), 4);
    assert_eq!(interceptor.pending_count(), 4);
}

#[test]
fn test_disabled_engine_forwards_everything() {
    let h = Harness::new();
    h.interceptor.engine().set_enabled(false);
    h.type_bytes(b"rm -rf /\r");
    assert_eq!(h.shell_output(), b"rm -rf /\r".to_vec());
    assert!(h.requests.lock().is_empty());
}

// ============================================================================
// Input after a hold
// ============================================================================

#[test]
fn test_text_after_hold_is_reviewed_as_one_line() {
    let h = Harness::new();
    h.type_bytes(b"rm -rf /\r");
    let first = h.last_decision();

    h.type_bytes(b"ls\r");
    let second = h.last_decision();

    // The shell's prompt holds "rm -rf /ls"; that is what gets reviewed
    assert_ne!(first, second);
    assert_eq!(h.requests.lock()[1].warning.command, "rm -rf /ls");
    assert_eq!(h.shell_output(), b"rm -rf /ls".to_vec());
    assert_eq!(h.interceptor.pending_count(), 1);

    assert_eq!(h.interceptor.confirm(&first), Resolution::NotPending);
    assert_eq!(h.interceptor.confirm(&second), Resolution::Confirmed);
    assert_eq!(h.shell_output(), b"rm -rf /ls\r".to_vec());
}

#[test]
fn test_second_risky_line_reviewed_with_held_text() {
    let h = Harness::new();
    h.type_bytes(b"rm -rf /\r");
    h.type_bytes(b"rm -rf ~\r");
    let second = h.last_decision();

    assert_eq!(h.requests.lock()[1].warning.command, "rm -rf /rm -rf ~");
    assert_eq!(h.interceptor.cancel(&second), Resolution::Cancelled);
    assert_eq!(h.shell_output(), b"rm -rf /rm -rf ~\x15".to_vec());
    assert_eq!(h.interceptor.pending_count(), 0);
}

#[test]
fn test_interrupt_withdraws_hold() {
    let h = Harness::new();
    h.type_bytes(b"rm -rf /\r");
    let id = h.last_decision();

    h.type_bytes(b"\x03");
    assert!(!h.interceptor.is_pending(&id));
    assert_eq!(h.interceptor.confirm(&id), Resolution::NotPending);
    assert_eq!(h.shell_output(), b"rm -rf /\x03".to_vec());
}

#[test]
fn test_cursor_keys_keep_hold() {
    let h = Harness::new();
    h.type_bytes(b"rm -rf /\r");
    let id = h.last_decision();

    h.type_bytes(b"\x1b[A\x1b[B");
    assert!(h.interceptor.is_pending(&id));
    assert_eq!(h.interceptor.confirm(&id), Resolution::Confirmed);
    assert_eq!(h.shell_output(), b"rm -rf /\x1b[A\x1b[B\r".to_vec());
}

#[test]
fn test_escape_then_enter_is_reviewed() {
    let h = Harness::new();
    // vi-mode users leave insert mode with Esc before pressing Enter
    let actions = h.type_bytes(b"rm -rf /\x1b\r");

    assert!(matches!(actions.last(), Some(Action::HoldLineTerminator { byte: b'\r', .. })));
    assert_eq!(h.shell_output(), b"rm -rf /\x1b".to_vec());
    assert_eq!(h.requests.lock()[0].warning.rule_id, "rm-rf");
}

#[test]
fn test_channel_listener_receives_requests() {
    let (tx, rx) = std::sync::mpsc::channel();
    let interceptor = Interceptor::new(Arc::new(RuleEngine::default()), tx);
    let shell = Arc::new(Mutex::new(Vec::<u8>::new()));
    interceptor.open_session("tty1", shell.clone()).unwrap();

    interceptor.process("tty1", b"terraform destroy\r").unwrap();
    let request: ReviewRequest = rx.try_recv().unwrap();
    assert_eq!(request.warning.rule_id, "terraform-destroy");

    assert_eq!(interceptor.confirm(&request.warning.decision_id), Resolution::Confirmed);
    assert_eq!(shell.lock().as_slice(), b"terraform destroy\r");
}
