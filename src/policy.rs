//! Command Policy
//!
//! Two independent predicates decide whether a command may run:
//!
//! 1. Allow-set: exact, case-sensitive membership of the top-level command
//! 2. Deny-set: path-granular override checked at every depth up to four
//!    tokens
//!
//! A command is permitted only when it is allowed AND not denied. Deny is not
//! a removal from the allow-set: allowing `stats` while denying
//! `stats realtime` still permits `stats historical`.

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::lists;
use crate::matcher;

/// Top-level commands permitted by default
pub const DEFAULT_ALLOWED_COMMANDS: &[&str] = &[
    // Services and versions
    "service",
    "service-version",
    "domain",
    "backend",
    "healthcheck",
    "vcl",
    "purge",
    // Edge data stores
    "acl",
    "acl-entry",
    "dictionary",
    "dictionary-entry",
    "config-store",
    "config-store-entry",
    "kv-store",
    "kv-store-entry",
    "secret-store",
    "secret-store-entry",
    "resource-link",
    // Compute
    "compute",
    // Observability
    "logging",
    "log-tail",
    "stats",
    "alerts",
    // TLS
    "tls-config",
    "tls-custom",
    "tls-platform",
    "tls-subscription",
    // Account (read)
    "ip-list",
    "pops",
    "products",
    "rate-limit",
    "user",
    "whoami",
    "version",
];

/// Command paths denied by default, even when the command is allowed
pub const DEFAULT_DENIED_PATHS: &[&str] = &[
    // Credential handling stays with the human operator
    "auth-token",
    "profile",
    "sso",
    "user create",
    "user delete",
    // Mutates the tool itself
    "update",
    // Unbounded output; denied for every caller, streaming or not
    "stats realtime",
];

/// Allow/deny decision engine
#[derive(Debug, Clone)]
pub struct CommandPolicy {
    allowed: HashSet<String>,
    denied: HashSet<String>,
}

impl Default for CommandPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandPolicy {
    /// Policy with the default allow and deny sets
    pub fn new() -> Self {
        Self::with_sets(default_allow_set(), default_deny_set())
    }

    /// Policy with explicit sets; neither is merged with the defaults.
    /// Runs of spaces in deny paths are collapsed so the matcher sees
    /// single-space paths.
    pub fn with_sets(allowed: HashSet<String>, denied: HashSet<String>) -> Self {
        let denied = denied
            .into_iter()
            .map(|path| lists::collapse_spaces(&path))
            .collect();
        Self { allowed, denied }
    }

    /// Exact membership in the allow-set
    pub fn is_allowed(&self, command: &str) -> bool {
        self.allowed.contains(command)
    }

    pub fn is_denied<S: AsRef<str>>(&self, command: &str, args: &[S]) -> bool {
        matcher::matches(&self.denied, command, args)
    }

    /// The deny-set entry `command` + `args` matched, if any
    pub fn denied_path<S: AsRef<str>>(&self, command: &str, args: &[S]) -> Option<String> {
        matcher::matched_path(&self.denied, command, args)
    }

    /// Combined decision: allowed and not denied
    pub fn check<S: AsRef<str>>(&self, command: &str, args: &[S]) -> Result<(), ValidationError> {
        if !self.is_allowed(command) {
            return Err(ValidationError::NotAllowed {
                command: command.to_string(),
            });
        }
        if let Some(path) = self.denied_path(command, args) {
            return Err(ValidationError::Denied { path });
        }
        Ok(())
    }

    pub fn allowed_commands(&self) -> &HashSet<String> {
        &self.allowed
    }

    pub fn denied_paths(&self) -> &HashSet<String> {
        &self.denied
    }
}

pub fn default_allow_set() -> HashSet<String> {
    DEFAULT_ALLOWED_COMMANDS.iter().map(|s| s.to_string()).collect()
}

pub fn default_deny_set() -> HashSet<String> {
    DEFAULT_DENIED_PATHS.iter().map(|s| s.to_string()).collect()
}
