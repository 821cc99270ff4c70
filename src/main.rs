//! shell-sentinel - keystroke-level review of risky shell commands
//!
//! # Usage
//!
//! ```bash
//! # Check a single command
//! shell-sentinel --check 'rm -rf /'
//!
//! # Check one command per stdin line
//! printf 'ls\ngit push -f origin main\n' | shell-sentinel
//!
//! # Replay a recorded keystroke stream through the interceptor
//! shell-sentinel --replay < keystrokes.bin > forwarded.bin
//! ```

use parking_lot::Mutex;
use std::env;
use std::io::{self, BufRead, Read, Write};
use std::sync::Arc;

use shell_sentinel::{
    config::Config,
    engine::RuleEngine,
    output::Verdict,
    stream::{Interceptor, ReviewRequest},
};
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "SHELL_SENTINEL_LOG";
const REPLAY_SESSION: &str = "replay";

/// Exit status of `--check` when the command matched a rule
const NEEDS_REVIEW_EXIT_CODE: i32 = 1;

fn print_version() {
    println!("shell-sentinel {}", env!("CARGO_PKG_VERSION"));
}

fn print_help() {
    println!(
        r#"shell-sentinel - keystroke-level review of risky shell commands

USAGE:
    shell-sentinel [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -v, --version           Print version information
    -c, --config PATH       Path to config file
        --check CMD         Check a single command; exits 1 if it needs review
        --list-rules        Print every rule with its status
        --disable-rule ID   Disable a built-in rule (repeatable)
        --text              Human-readable output instead of JSON
        --replay            Pass stdin bytes through the interceptor to stdout
        --approve           With --replay, confirm held lines instead of cancelling

Without --check, --list-rules or --replay, reads one command per stdin line.

ENVIRONMENT:
    SHELL_SENTINEL_DISABLED=1   Disable the rule engine
    SHELL_SENTINEL_LOG=debug    Log filter (tracing env-filter syntax)
"#
    );
}

/// Parse command line arguments
#[derive(Default)]
struct Args {
    help: bool,
    version: bool,
    config_path: Option<String>,
    check: Option<String>,
    list_rules: bool,
    disabled_rules: Vec<String>,
    text: bool,
    replay: bool,
    approve: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut result = Args::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "-h" | "--help" => result.help = true,
                "-v" | "--version" => result.version = true,
                "--list-rules" => result.list_rules = true,
                "--text" => result.text = true,
                "--replay" => result.replay = true,
                "--approve" => result.approve = true,
                "-c" | "--config" => {
                    if i + 1 < args.len() {
                        i += 1;
                        result.config_path = Some(args[i].clone());
                    }
                }
                "--check" => {
                    if i + 1 < args.len() {
                        i += 1;
                        result.check = Some(args[i].clone());
                    }
                }
                "--disable-rule" => {
                    if i + 1 < args.len() {
                        i += 1;
                        result.disabled_rules.push(args[i].clone());
                    }
                }
                arg if arg.starts_with("--config=") => {
                    result.config_path = Some(arg.trim_start_matches("--config=").to_string());
                }
                arg if arg.starts_with("--check=") => {
                    result.check = Some(arg.trim_start_matches("--check=").to_string());
                }
                arg if arg.starts_with("--disable-rule=") => {
                    let id = arg.trim_start_matches("--disable-rule=");
                    result.disabled_rules.push(id.to_string());
                }
                other => eprintln!("Warning: ignoring unknown argument {}", other),
            }
            i += 1;
        }

        result
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_verdict(verdict: &Verdict, text: bool) {
    if text {
        println!("{}", verdict.to_text());
    } else {
        println!("{}", verdict.to_json());
    }
}

fn list_rules(engine: &RuleEngine) {
    for entry in engine.list_rules() {
        match serde_json::to_string(&entry) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::warn!(rule_id = %entry.rule.id, error = %e, "failed to serialize rule"),
        }
    }
}

fn check_lines(engine: &RuleEngine, text: bool) {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "stopped reading stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let warning = engine.evaluate(&line);
        print_verdict(&Verdict::from_evaluation(&line, warning.as_ref()), text);
    }
}

/// Feed stdin through an interceptor, resolving every hold as soon as it is requested
fn replay(config: &Config, approve: bool, text: bool) -> Result<(), Box<dyn std::error::Error>> {
    let requested = Arc::new(Mutex::new(Vec::new()));
    let queue = Arc::clone(&requested);
    let interceptor = Interceptor::from_config(config, move |request: &ReviewRequest| {
        queue.lock().push(request.clone());
    });

    let stdout = Arc::new(Mutex::new(io::stdout()));
    interceptor.open_session(REPLAY_SESSION, stdout)?;

    let mut stdin = io::stdin().lock();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stdin.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        interceptor.process(REPLAY_SESSION, &chunk[..n])?;

        let pending: Vec<ReviewRequest> = requested.lock().drain(..).collect();
        for request in pending {
            let verdict = Verdict::review(&request.warning);
            eprintln!("{}", if text { verdict.to_text() } else { verdict.to_json() });

            let decision_id = request.warning.decision_id;
            let resolution = if approve {
                interceptor.confirm(&decision_id)
            } else {
                interceptor.cancel(&decision_id)
            };
            tracing::debug!(%decision_id, ?resolution, "replay resolved hold");
        }
    }

    interceptor.on_session_end(REPLAY_SESSION);
    io::stdout().flush()?;
    Ok(())
}

fn main() {
    let args = Args::parse();

    if args.help {
        print_help();
        return;
    }

    if args.version {
        print_version();
        return;
    }

    init_logging();

    let mut config = if let Some(ref path) = args.config_path {
        Config::load_from(std::path::Path::new(path)).unwrap_or_else(|e| {
            eprintln!("Warning: {}; using defaults", e);
            Config::default()
        })
    } else {
        Config::load()
    };
    config.apply_env();
    config.engine.disabled_rules.extend(args.disabled_rules.iter().cloned());

    if args.replay {
        if let Err(e) = replay(&config, args.approve, args.text) {
            eprintln!("Error: replay failed: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let engine = RuleEngine::new(&config.engine);

    if args.list_rules {
        list_rules(&engine);
        return;
    }

    if let Some(command) = args.check {
        let warning = engine.evaluate(&command);
        let verdict = Verdict::from_evaluation(&command, warning.as_ref());
        print_verdict(&verdict, args.text);
        if verdict.needs_review() {
            std::process::exit(NEEDS_REVIEW_EXIT_CODE);
        }
        return;
    }

    check_lines(&engine, args.text);
}
