//! Built-in risk rules
//!
//! Catalog order is evaluation order: the first matching rule wins, so the most
//! specific and most severe patterns come first.

use crate::rules::{RiskLevel, Rule};

/// A built-in rule as it appears in the static catalog
#[derive(Debug, Clone, Copy)]
pub struct BuiltinRule {
    pub id: &'static str,
    pub level: RiskLevel,
    pub pattern: &'static str,
    pub description: &'static str,
    pub remediation: &'static str,
}

impl BuiltinRule {
    pub const fn new(
        id: &'static str,
        level: RiskLevel,
        pattern: &'static str,
        description: &'static str,
        remediation: &'static str,
    ) -> Self {
        Self {
            id,
            level,
            pattern,
            description,
            remediation,
        }
    }
}

impl From<&BuiltinRule> for Rule {
    fn from(b: &BuiltinRule) -> Self {
        Rule::new(b.id, b.pattern, b.level, b.description, b.remediation)
    }
}

pub const BUILTIN_RULES: &[BuiltinRule] = &[
    // Filesystem destruction
    BuiltinRule::new(
        "rm-rf",
        RiskLevel::Critical,
        r"\brm\s+(-[a-z]+\s+)*(-[a-z]*r[a-z]*f[a-z]*|-[a-z]*f[a-z]*r[a-z]*|-r\s+-f|-f\s+-r|--recursive\s+--force|--force\s+--recursive)(\s|$)",
        "Recursive forced delete; files are removed without confirmation and cannot be recovered",
        "Double-check the target path, or move files to a trash directory instead",
    ),
    BuiltinRule::new(
        "fork-bomb",
        RiskLevel::Critical,
        r":\(\)\s*\{.*:\s*\|\s*:.*&",
        "Fork bomb; spawns processes until the machine stops responding",
        "Do not run this command",
    ),
    // Disk destruction
    BuiltinRule::new(
        "dd-disk-device",
        RiskLevel::Critical,
        r"\bdd\b.*\bof=/dev/(sd|nvme|hd|vd|xvd|disk|mmcblk)",
        "Writing directly to a disk device overwrites partitions and filesystems",
        "Verify the output device with lsblk before writing",
    ),
    BuiltinRule::new(
        "redirect-disk-device",
        RiskLevel::Critical,
        r">\s*/dev/(sd|nvme|hd|vd|xvd|disk|mmcblk)",
        "Redirecting output onto a disk device destroys its contents",
        "Redirect to a regular file instead",
    ),
    BuiltinRule::new(
        "mkfs",
        RiskLevel::Critical,
        r"\bmkfs(\.\w+)?\s+",
        "Formatting a device erases everything on it",
        "Verify the target device with lsblk before formatting",
    ),
    BuiltinRule::new(
        "kill-all-processes",
        RiskLevel::High,
        r"\bkill\s+-(9|kill)\s+-1\b",
        "Sends SIGKILL to every process you are allowed to signal",
        "Kill specific PIDs instead",
    ),
    // Remote code execution
    BuiltinRule::new(
        "curl-pipe-shell",
        RiskLevel::High,
        r"\b(curl|wget)\b.*\|\s*(sudo\s+)?(ba|z|da|k)?sh\b",
        "Piping remote content straight into a shell runs unreviewed code",
        "Download the script, read it, then run it",
    ),
    BuiltinRule::new(
        "curl-pipe-interpreter",
        RiskLevel::High,
        r"\b(curl|wget)\b.*\|\s*(sudo\s+)?(python[23]?|perl|ruby|node)\b",
        "Piping remote content into an interpreter runs unreviewed code",
        "Download the script, read it, then run it",
    ),
    // Permissions
    BuiltinRule::new(
        "chmod-777",
        RiskLevel::High,
        r"\bchmod\s+(-[a-z]+\s+)*0?777\b",
        "Makes files world-writable",
        "Grant only the permissions that are needed, e.g. 755 or 644",
    ),
    BuiltinRule::new(
        "chown-recursive-root",
        RiskLevel::High,
        r"\bchown\s+(-[a-z]+\s+)*-[a-z]*r[a-z]*\s+\S+\s+/(\s|$)",
        "Recursively changes ownership of the whole filesystem",
        "Restrict chown to the directory you actually mean",
    ),
    // Version control
    BuiltinRule::new(
        "git-force-push",
        RiskLevel::High,
        r"\bgit\s+push\b.*(\s-f\b|\s--force(\s|$))",
        "Force pushing rewrites remote history and can discard other people's work",
        "Use --force-with-lease",
    ),
    BuiltinRule::new(
        "git-reset-hard",
        RiskLevel::Medium,
        r"\bgit\s+reset\b.*--hard\b",
        "Hard reset discards uncommitted changes",
        "Stash your changes first with git stash",
    ),
    BuiltinRule::new(
        "git-clean-force",
        RiskLevel::Medium,
        r"\bgit\s+clean\b.*\s-[a-z]*f",
        "Force clean deletes untracked files",
        "Preview with git clean -n first",
    ),
    // Databases
    BuiltinRule::new(
        "sql-drop",
        RiskLevel::High,
        r"\bdrop\s+(database|schema|table)\b",
        "Dropping a database object deletes its data",
        "Take a backup before dropping",
    ),
    BuiltinRule::new(
        "sql-truncate",
        RiskLevel::Medium,
        r"\btruncate\s+table\b",
        "Truncating a table deletes every row",
        "Take a backup before truncating",
    ),
    // Infrastructure
    BuiltinRule::new(
        "kubectl-delete-namespace",
        RiskLevel::High,
        r"\bkubectl\s+delete\s+(ns|namespaces?)\b",
        "Deleting a namespace deletes every resource inside it",
        "Delete individual resources, and check your current context",
    ),
    BuiltinRule::new(
        "kubectl-delete-all",
        RiskLevel::High,
        r"\bkubectl\s+delete\b.*\s--all\b",
        "Deletes every resource of the given kind",
        "Check your current context and namespace first",
    ),
    BuiltinRule::new(
        "terraform-destroy",
        RiskLevel::High,
        r"\bterraform\s+destroy\b",
        "Destroys all managed infrastructure",
        "Run terraform plan -destroy to review first",
    ),
    BuiltinRule::new(
        "docker-system-prune",
        RiskLevel::Medium,
        r"\bdocker\s+system\s+prune\b",
        "Removes stopped containers, unused networks and dangling images",
        "Prune specific resources instead",
    ),
    // System state
    BuiltinRule::new(
        "shutdown",
        RiskLevel::Medium,
        r"^\s*(sudo\s+)?(shutdown|reboot|halt|poweroff)\b",
        "Shuts down or restarts the machine",
        "Make sure nothing else is running on this host",
    ),
    BuiltinRule::new(
        "sudo-rm",
        RiskLevel::Medium,
        r"\bsudo\s+rm\b",
        "Deleting files as root bypasses permission checks",
        "Double-check the path before running rm as root",
    ),
    BuiltinRule::new(
        "find-delete",
        RiskLevel::Medium,
        r"\bfind\b.*\s-delete\b",
        "find -delete removes every match without confirmation",
        "Run the same find without -delete first to review the matches",
    ),
    BuiltinRule::new(
        "crontab-remove",
        RiskLevel::Medium,
        r"\bcrontab\s+(-[a-z]+\s+)*-r\b",
        "Removes the whole crontab without a backup",
        "Save it first with crontab -l > crontab.bak",
    ),
    BuiltinRule::new(
        "history-clear",
        RiskLevel::Low,
        r"\bhistory\s+-c\b",
        "Clears shell history",
        "",
    ),
];

/// All built-in rules in catalog order
pub fn builtin_rules() -> Vec<Rule> {
    BUILTIN_RULES.iter().map(Rule::from).collect()
}
