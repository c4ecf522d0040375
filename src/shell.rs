//! String Safety
//!
//! Generic checks shared by every string field: emptiness, length, null
//! bytes, and shell metacharacters. Metacharacter detection is plain
//! substring containment. No quoting or escaping is honoured, so a
//! metacharacter anywhere in the value rejects it.

use crate::dialect::Dialect;
use crate::error::ValidationError;

/// Maximum length of a command name
pub const MAX_COMMAND_LEN: usize = 50;
/// Maximum length of a single argument
pub const MAX_ARG_LEN: usize = 100;
/// Maximum length of a flag name
pub const MAX_FLAG_NAME_LEN: usize = 50;
/// Maximum length of a flag value
pub const MAX_FLAG_VALUE_LEN: usize = 500;
/// Maximum length of a path
pub const MAX_PATH_LEN: usize = 256;

/// Sequences interpreted by POSIX-style shells.
///
/// Multi-character sequences come first so a rejection names the most
/// specific sequence present.
pub const SHELL_METACHARACTERS: &[&str] = &[
    ";;&", "$(", "${", ";&", "|&", ">&", "<&", "&&", "||", ">>", "<<", ";", "|", "&", "`", "$",
    "(", ")", "<", ">", "*", "?", "[", "]", "{", "}", "\\", "\n", "\r", "\t",
];

/// Additional sequences interpreted by cmd.exe and PowerShell
pub const WINDOWS_SHELL_METACHARACTERS: &[&str] = &["^", "%", "!", "~"];

/// How a single string field is checked
#[derive(Debug, Clone, Copy)]
pub struct FieldRules<'a> {
    /// Label used in error messages, e.g. "command name" or "argument 2"
    pub label: &'a str,
    pub max_len: usize,
    pub allow_empty: bool,
    pub shell_safe: bool,
}

impl<'a> FieldRules<'a> {
    pub fn new(label: &'a str, max_len: usize) -> Self {
        Self {
            label,
            max_len,
            allow_empty: false,
            shell_safe: false,
        }
    }

    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    pub fn shell_safe(mut self) -> Self {
        self.shell_safe = true;
        self
    }
}

/// Check a value against `rules`, returning the first violation.
///
/// Order: empty, length, null byte, shell metacharacters.
pub fn check_string(
    value: &str,
    rules: &FieldRules<'_>,
    dialect: Dialect,
) -> Result<(), ValidationError> {
    if value.is_empty() && !rules.allow_empty {
        return Err(ValidationError::Empty {
            field: rules.label.to_string(),
        });
    }

    check_length(value, rules.label, rules.max_len)?;
    check_null_bytes(value, rules.label)?;

    if rules.shell_safe {
        if let Some(sequence) = find_shell_metacharacter(value, dialect) {
            return Err(ValidationError::ForbiddenChars {
                field: rules.label.to_string(),
                sequence: printable(sequence),
            });
        }
    }

    Ok(())
}

/// Reject values longer than `max` characters
pub fn check_length(value: &str, label: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong {
            field: label.to_string(),
            max,
            actual,
        });
    }
    Ok(())
}

pub fn check_null_bytes(value: &str, label: &str) -> Result<(), ValidationError> {
    if value.contains('\0') {
        return Err(ValidationError::NullByte {
            field: label.to_string(),
        });
    }
    Ok(())
}

/// First metacharacter sequence found in `value` for `dialect`
pub fn find_shell_metacharacter(value: &str, dialect: Dialect) -> Option<&'static str> {
    let extended: &[&'static str] = if dialect.is_windows() {
        WINDOWS_SHELL_METACHARACTERS
    } else {
        &[]
    };

    SHELL_METACHARACTERS
        .iter()
        .chain(extended.iter())
        .find(|seq| value.contains(**seq))
        .copied()
}

/// Escape control characters so they render legibly in messages
pub(crate) fn printable(sequence: &str) -> String {
    sequence.escape_default().to_string()
}
