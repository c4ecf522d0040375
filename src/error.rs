//! Error Taxonomy
//!
//! Every rejection the engine produces is a `ValidationError`. Rejections are
//! ordinary control flow: the caller reports them back to whoever supplied the
//! input. Each error maps onto a coarse `ErrorCategory` so callers can branch
//! without matching on message text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse category of a rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Empty,
    TooLong,
    NullByte,
    ForbiddenChars,
    PathTraversal,
    NotAllowed,
    InvalidFlagName,
    PlatformPath,
}

/// Error class, one level above `ErrorCategory`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Empty, too long, or carrying a null byte
    InputShape,
    /// Shell metacharacter present
    Injection,
    Traversal,
    /// Not permitted or explicitly denied
    Policy,
    /// Malformed flag name
    Format,
    PlatformPath,
}

impl ErrorCategory {
    pub fn class(&self) -> ErrorClass {
        match self {
            ErrorCategory::Empty | ErrorCategory::TooLong | ErrorCategory::NullByte => {
                ErrorClass::InputShape
            }
            ErrorCategory::ForbiddenChars => ErrorClass::Injection,
            ErrorCategory::PathTraversal => ErrorClass::Traversal,
            ErrorCategory::NotAllowed => ErrorClass::Policy,
            ErrorCategory::InvalidFlagName => ErrorClass::Format,
            ErrorCategory::PlatformPath => ErrorClass::PlatformPath,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Empty => write!(f, "empty"),
            ErrorCategory::TooLong => write!(f, "too_long"),
            ErrorCategory::NullByte => write!(f, "null_byte"),
            ErrorCategory::ForbiddenChars => write!(f, "forbidden_chars"),
            ErrorCategory::PathTraversal => write!(f, "path_traversal"),
            ErrorCategory::NotAllowed => write!(f, "not_allowed"),
            ErrorCategory::InvalidFlagName => write!(f, "invalid_flag_name"),
            ErrorCategory::PlatformPath => write!(f, "platform_path"),
        }
    }
}

/// Windows filename rules a path can break
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformPathViolation {
    #[error("UNC paths are not allowed")]
    UncPath,

    #[error("alternate data streams are not allowed")]
    AlternateDataStream,

    #[error("invalid use of colon in path")]
    InvalidColon,

    #[error("'{0}' is a reserved device name")]
    ReservedDeviceName(String),

    #[error("invalid Windows filename character '{0}'")]
    InvalidCharacter(char),

    #[error("path components must not end with trailing dots or spaces")]
    TrailingDotOrSpace,
}

/// Rejection of a single validated value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: String },

    #[error("{field} exceeds maximum length of {max} characters (got {actual})")]
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },

    #[error("{field} contains null bytes")]
    NullByte { field: String },

    #[error("{field} contains forbidden character sequence '{sequence}'")]
    ForbiddenChars { field: String, sequence: String },

    #[error("path traversal is not allowed: '{path}' contains '..'")]
    PathTraversal { path: String },

    #[error("command '{command}' is not available: not in the allowed list")]
    NotAllowed { command: String },

    #[error("command '{path}' is not available: denied by policy")]
    Denied { path: String },

    #[error("flag name '{name}' contains invalid characters: must start with a letter and contain only letters, digits, and hyphens")]
    InvalidFlagName { name: String },

    #[error("invalid path '{path}': {violation}")]
    PlatformPath {
        path: String,
        violation: PlatformPathViolation,
    },

    /// First failure of a batch validation, labelled with the failing field
    #[error("{context}: {source}")]
    Field {
        context: String,
        #[source]
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Wrap this error with the field that produced it
    pub fn in_field(self, context: impl Into<String>) -> Self {
        ValidationError::Field {
            context: context.into(),
            source: Box::new(self),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ValidationError::Empty { .. } => ErrorCategory::Empty,
            ValidationError::TooLong { .. } => ErrorCategory::TooLong,
            ValidationError::NullByte { .. } => ErrorCategory::NullByte,
            ValidationError::ForbiddenChars { .. } => ErrorCategory::ForbiddenChars,
            ValidationError::PathTraversal { .. } => ErrorCategory::PathTraversal,
            ValidationError::NotAllowed { .. } | ValidationError::Denied { .. } => {
                ErrorCategory::NotAllowed
            }
            ValidationError::InvalidFlagName { .. } => ErrorCategory::InvalidFlagName,
            ValidationError::PlatformPath { .. } => ErrorCategory::PlatformPath,
            ValidationError::Field { source, .. } => source.category(),
        }
    }

    /// The innermost error, with any field context stripped
    pub fn root(&self) -> &ValidationError {
        match self {
            ValidationError::Field { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Errors raised while parsing or loading allow/deny lists
#[derive(Error, Debug)]
pub enum ListError {
    #[error("failed to read list file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: invalid entry '{entry}': {reason}")]
    InvalidLine {
        line: usize,
        entry: String,
        reason: String,
    },

    #[error("item {position}: invalid entry '{entry}': {reason}")]
    InvalidToken {
        position: usize,
        entry: String,
        reason: String,
    },

    #[error("invalid command path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("no valid commands found")]
    Empty,
}

/// Errors raised while assembling a `GuardConfig`
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{list} list: {source}")]
    List {
        list: &'static str,
        #[source]
        source: ListError,
    },

    #[error("{0} list given both as a file and inline; choose one")]
    ConflictingSources(&'static str),

    #[error("invalid dialect '{0}'. Valid dialects: posix, windows")]
    InvalidDialect(String),
}
