//! Validation Facade
//!
//! `CommandGuard` is the entry point used before every command dispatch. It
//! composes the string, path, and policy checks into per-field validators and
//! a batch validator, and owns the streaming classifier so that runtime
//! changes to it are scoped to one engine instance.
//!
//! Every validator is a pure function of its input and the engine's fixed
//! configuration and stops at the first violation.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use tracing::{debug, warn};

use crate::config::GuardConfig;
use crate::dialect::Dialect;
use crate::error::{ErrorCategory, ValidationError};
use crate::path::check_path;
use crate::policy::CommandPolicy;
use crate::shell::{
    check_string, FieldRules, MAX_ARG_LEN, MAX_COMMAND_LEN, MAX_FLAG_NAME_LEN, MAX_FLAG_VALUE_LEN,
};
use crate::streaming::StreamingClassifier;

static FLAG_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9-]*$").expect("Invalid flag name regex"));

/// Serializable decision for a full invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the invocation may be dispatched
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
    /// Reason for the decision
    pub reason: String,
    /// Deny-list entry that matched (if denied by path)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_path: Option<String>,
    /// Whether an allowed invocation should run in the background
    #[serde(default)]
    pub streaming: bool,
}

impl Verdict {
    fn allowed(streaming: bool) -> Self {
        Self {
            allowed: true,
            category: None,
            reason: "command permitted".to_string(),
            matched_path: None,
            streaming,
        }
    }

    fn blocked(err: &ValidationError) -> Self {
        let matched_path = match err.root() {
            ValidationError::Denied { path } => Some(path.clone()),
            _ => None,
        };
        Self {
            allowed: false,
            category: Some(err.category()),
            reason: err.to_string(),
            matched_path,
            streaming: false,
        }
    }
}

/// Command validation engine
#[derive(Debug, Clone)]
pub struct CommandGuard {
    policy: CommandPolicy,
    streaming: StreamingClassifier,
    dialect: Dialect,
}

impl Default for CommandGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandGuard {
    /// Engine with the default configuration
    pub fn new() -> Self {
        Self::from_config(&GuardConfig::default())
    }

    pub fn from_config(config: &GuardConfig) -> Self {
        let policy = CommandPolicy::with_sets(config.resolve_allow_set(), config.resolve_deny_set());
        debug!(
            allowed = policy.allowed_commands().len(),
            denied = policy.denied_paths().len(),
            dialect = %config.dialect,
            "command guard configured"
        );
        Self {
            policy,
            streaming: StreamingClassifier::new(),
            dialect: config.dialect,
        }
    }

    pub fn policy(&self) -> &CommandPolicy {
        &self.policy
    }

    /// Streaming classifier owned by this engine
    pub fn streaming(&self) -> &StreamingClassifier {
        &self.streaming
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Validate a command name and check it against the allow-set.
    ///
    /// Command names come from a fixed vocabulary, so no shell-character
    /// check is applied; the allow-set lookup rejects anything unexpected.
    pub fn validate_command(&self, name: &str) -> Result<(), ValidationError> {
        traced("command", self.check_command(name))
    }

    /// Validate each argument, labelled by position
    pub fn validate_args<S: AsRef<str>>(&self, args: &[S]) -> Result<(), ValidationError> {
        traced("args", self.check_args(args))
    }

    pub fn validate_flag_name(&self, name: &str) -> Result<(), ValidationError> {
        traced("flag name", self.check_flag_name(name))
    }

    /// Validate a flag value. Empty values are valid (boolean flags).
    pub fn validate_flag_value(&self, value: &str) -> Result<(), ValidationError> {
        traced("flag value", self.check_flag_value(value))
    }

    pub fn validate_path(&self, path: &str) -> Result<(), ValidationError> {
        traced("path", check_path(path, self.dialect))
    }

    /// Validate a whole invocation: command, arguments, deny-list, then
    /// each flag in iteration order. The first failure is returned, labelled
    /// with the field it came from.
    pub fn validate_all<S, I, K, V>(
        &self,
        command: &str,
        args: &[S],
        flags: I,
    ) -> Result<(), ValidationError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        traced("invocation", self.check_all(command, args, flags))
    }

    /// Decide whether `command` + `args` may be dispatched, as a report
    /// rather than an error
    pub fn check_invocation<S: AsRef<str>>(&self, command: &str, args: &[S]) -> Verdict {
        let no_flags: [(&str, &str); 0] = [];
        match self.validate_all(command, args, no_flags) {
            Ok(()) => Verdict::allowed(self.streaming.is_streaming(command, args)),
            Err(err) => Verdict::blocked(&err),
        }
    }

    fn check_command(&self, name: &str) -> Result<(), ValidationError> {
        check_string(
            name,
            &FieldRules::new("command name", MAX_COMMAND_LEN),
            self.dialect,
        )?;
        if !self.policy.is_allowed(name) {
            return Err(ValidationError::NotAllowed {
                command: name.to_string(),
            });
        }
        Ok(())
    }

    fn check_args<S: AsRef<str>>(&self, args: &[S]) -> Result<(), ValidationError> {
        for (index, arg) in args.iter().enumerate() {
            let label = format!("argument {}", index);
            let rules = FieldRules::new(&label, MAX_ARG_LEN)
                .allow_empty()
                .shell_safe();
            check_string(arg.as_ref(), &rules, self.dialect)?;
        }
        Ok(())
    }

    fn check_flag_name(&self, name: &str) -> Result<(), ValidationError> {
        check_string(
            name,
            &FieldRules::new("flag name", MAX_FLAG_NAME_LEN),
            self.dialect,
        )?;
        if !FLAG_NAME.is_match(name) {
            return Err(ValidationError::InvalidFlagName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn check_flag_value(&self, value: &str) -> Result<(), ValidationError> {
        let rules = FieldRules::new("flag value", MAX_FLAG_VALUE_LEN)
            .allow_empty()
            .shell_safe();
        check_string(value, &rules, self.dialect)
    }

    fn check_all<S, I, K, V>(
        &self,
        command: &str,
        args: &[S],
        flags: I,
    ) -> Result<(), ValidationError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.check_command(command)
            .map_err(|e| e.in_field("invalid command"))?;
        self.check_args(args)
            .map_err(|e| e.in_field("invalid arguments"))?;

        if let Some(path) = self.policy.denied_path(command, args) {
            return Err(ValidationError::Denied { path }.in_field("invalid command"));
        }

        for (name, value) in flags {
            let (name, value) = (name.as_ref(), value.as_ref());
            self.check_flag_name(name)
                .map_err(|e| e.in_field(format!("invalid flag '{}'", name)))?;
            self.check_flag_value(value)
                .map_err(|e| e.in_field(format!("invalid value for flag '{}'", name)))?;
        }

        Ok(())
    }
}

fn traced(field: &str, result: Result<(), ValidationError>) -> Result<(), ValidationError> {
    match &result {
        Ok(()) => debug!(field, "input accepted"),
        Err(err) => warn!(field, category = %err.category(), reason = %err, "input rejected"),
    }
    result
}
