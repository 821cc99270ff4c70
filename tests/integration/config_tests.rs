//! Integration tests for configuration loading and config-driven behavior

use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

use shell_sentinel::config::EXAMPLE_CONFIG_TOML;
use shell_sentinel::{Config, ConfigError, Interceptor, Resolution, ReviewRequest, RiskLevel};
use tempfile::{NamedTempFile, TempDir};

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn interceptor_with(config: &Config) -> (Interceptor, Arc<Mutex<Vec<ReviewRequest>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);
    let interceptor = Interceptor::from_config(config, move |r: &ReviewRequest| {
        seen.lock().push(r.clone())
    });
    (interceptor, requests)
}

#[test]
fn test_load_example_config_from_file() {
    let file = write_config(EXAMPLE_CONFIG_TOML);
    let config = Config::load_from(file.path()).unwrap();

    assert!(config.engine.enabled);
    assert_eq!(config.engine.custom_rules[0].id, "deploy-prod");
    assert_eq!(config.engine.custom_rules[0].risk_level, RiskLevel::High);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = Config::load_from(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_malformed_file_is_parse_error() {
    let file = write_config("[engine\nenabled = ");
    let err = Config::load_from(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("failed to parse"));
}

#[test]
fn test_custom_rule_from_config_holds_line() {
    let config = Config::from_toml(EXAMPLE_CONFIG_TOML).unwrap();
    let (interceptor, requests) = interceptor_with(&config);
    let shell = Arc::new(Mutex::new(Vec::<u8>::new()));
    interceptor.open_session("tty1", shell.clone()).unwrap();

    interceptor.process("tty1", b"./deploy production\r").unwrap();

    assert_eq!(shell.lock().as_slice(), b"./deploy production");
    assert_eq!(requests.lock()[0].warning.rule_id, "deploy-prod");
}

#[test]
fn test_custom_cancel_sequence() {
    let config = Config::from_toml("[session]\ncancel_sequence = \"\\u0003\"\n").unwrap();
    let (interceptor, requests) = interceptor_with(&config);
    let shell = Arc::new(Mutex::new(Vec::<u8>::new()));
    interceptor.open_session("tty1", shell.clone()).unwrap();

    interceptor.process("tty1", b"rm -rf /\r").unwrap();
    let id = requests.lock()[0].warning.decision_id;
    assert_eq!(interceptor.cancel(&id), Resolution::Cancelled);
    assert_eq!(shell.lock().as_slice(), b"rm -rf /\x03");
}

#[test]
fn test_buffer_capacity_limits_review_text() {
    let config = Config::from_toml("[session]\nbuffer_capacity = 4\n").unwrap();
    let (interceptor, requests) = interceptor_with(&config);
    let shell = Arc::new(Mutex::new(Vec::<u8>::new()));
    interceptor.open_session("tty1", shell.clone()).unwrap();

    // Only "ls -" fits in the buffer; everything is still forwarded
    interceptor.process("tty1", b"ls -rf /\r").unwrap();
    assert_eq!(shell.lock().as_slice(), b"ls -rf /\r");
    assert!(requests.lock().is_empty());
}

#[test]
fn test_audit_log_records_lifecycle() {
    let dir = TempDir::new().unwrap();
    let audit_path = dir.path().join("audit/audit.jsonl");
    let config = Config::from_toml(&format!(
        "[audit]\nenabled = true\npath = {:?}\n",
        audit_path.to_string_lossy()
    ))
    .unwrap();

    let (interceptor, requests) = interceptor_with(&config);
    interceptor
        .open_session("tty1", Arc::new(Mutex::new(Vec::<u8>::new())))
        .unwrap();

    interceptor.process("tty1", b"rm -rf /\r").unwrap();
    let first = requests.lock()[0].warning.decision_id;
    interceptor.confirm(&first);

    interceptor.process("tty1", b"git reset --hard\r").unwrap();
    interceptor.on_session_end("tty1");

    let content = std::fs::read_to_string(&audit_path).unwrap();
    let events: Vec<String> = content
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["event"].as_str().unwrap().to_string()
        })
        .collect();

    assert_eq!(
        events,
        ["REVIEW_REQUESTED", "CONFIRMED", "REVIEW_REQUESTED", "ORPHANED"]
    );
    assert!(content.contains(&first.to_string()));
}

#[test]
fn test_audit_disabled_by_default() {
    let config = Config::default();
    assert!(config.audit_path().is_none());
}
