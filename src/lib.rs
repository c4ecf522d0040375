//! cmdgate: command policy and input-safety validation
//!
//! Decides whether a command name, argument list, flag set, or path supplied
//! by an untrusted caller (typically an AI agent) may be forwarded to an
//! external command-line tool.
//!
//! ```
//! use cmdgate::CommandGuard;
//!
//! let guard = CommandGuard::new();
//! assert!(guard.validate_command("service").is_ok());
//! assert!(guard.validate_args(&["test;ls"]).is_err());
//! assert!(guard.policy().is_denied("stats", &["realtime"]));
//! ```

pub mod config;
pub mod dialect;
pub mod error;
pub mod lists;
pub mod matcher;
pub mod path;
pub mod policy;
pub mod shell;
pub mod streaming;
pub mod validator;

pub use config::{GuardConfig, ListSources};
pub use dialect::Dialect;
pub use error::{ConfigError, ErrorCategory, ErrorClass, ListError, ValidationError};
pub use policy::CommandPolicy;
pub use streaming::StreamingClassifier;
pub use validator::{CommandGuard, Verdict};
