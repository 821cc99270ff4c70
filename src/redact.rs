//! Secret redaction for anything written to disk
//!
//! Command lines typed at a prompt routinely carry tokens and passwords. Each
//! pattern marks the sensitive part with a `secret` group; only that part is
//! replaced, so the surrounding command stays readable in the audit log.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

const PLACEHOLDER: &str = "[REDACTED]";

/// Kind name and pattern source for every secret shape we recognise
const SECRET_SOURCES: &[(&str, &str)] = &[
    (
        "api-key",
        r"(?i)\b(?:api|secret)[_-]?key\s*[=:]\s*['\x22]?(?P<secret>[A-Za-z0-9_\-]{16,})",
    ),
    (
        "access-token",
        r"(?i)\b(?:access|auth)[_-]?token\s*[=:]\s*['\x22]?(?P<secret>[A-Za-z0-9_\-.]{16,})",
    ),
    ("bearer-token", r"(?i)\bbearer\s+(?P<secret>[A-Za-z0-9_\-.=]{16,})"),
    ("aws-access-key-id", r"\b(?P<secret>AKIA[0-9A-Z]{16})\b"),
    (
        "aws-secret-key",
        r"(?i)aws[_-]?secret[_-]?access[_-]?key\s*[=:]\s*['\x22]?(?P<secret>[0-9a-zA-Z/+]{20,})",
    ),
    (
        "github-token",
        r"\b(?P<secret>gh[pousr]_[A-Za-z0-9_]{36,}|github_pat_[A-Za-z0-9_]{22,})",
    ),
    (
        "password",
        r"(?i)\b(?:password|passwd|pwd)\s*[=:]\s*['\x22]?(?P<secret>[^\s'\x22]+)",
    ),
    ("url-credentials", r"://[^/\s:@]+:(?P<secret>[^/\s@]+)@"),
    (
        "env-secret",
        r"\b[A-Z][A-Z0-9_]*(?:TOKEN|SECRET|PASSWORD)=(?P<secret>\S+)",
    ),
];

struct SecretPattern {
    kind: &'static str,
    regex: Regex,
}

static SECRET_PATTERNS: Lazy<Vec<SecretPattern>> = Lazy::new(|| {
    SECRET_SOURCES
        .iter()
        .filter_map(|&(kind, source)| match Regex::new(source) {
            Ok(regex) => Some(SecretPattern { kind, regex }),
            Err(e) => {
                tracing::error!(kind, error = %e, "secret pattern failed to compile");
                None
            }
        })
        .collect()
});

/// Kinds of secret found in `text`, in pattern order
pub fn secret_kinds(text: &str) -> Vec<&'static str> {
    SECRET_PATTERNS
        .iter()
        .filter(|p| p.regex.is_match(text))
        .map(|p| p.kind)
        .collect()
}

/// Replace the secret part of every match with a placeholder
pub fn redact_secrets(text: &str) -> Cow<'_, str> {
    let mut redacted = Cow::Borrowed(text);
    for pattern in SECRET_PATTERNS.iter() {
        if !pattern.regex.is_match(&redacted) {
            continue;
        }
        let replaced = pattern
            .regex
            .replace_all(&redacted, |caps: &Captures| mask(caps))
            .into_owned();
        redacted = Cow::Owned(replaced);
    }
    redacted
}

fn mask(caps: &Captures) -> String {
    let whole = &caps[0];
    match (caps.get(0), caps.name("secret")) {
        (Some(m), Some(secret)) => {
            let start = secret.start() - m.start();
            let end = secret.end() - m.start();
            format!("{}{}{}", &whole[..start], PLACEHOLDER, &whole[end..])
        }
        _ => PLACEHOLDER.to_string(),
    }
}
