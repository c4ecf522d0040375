//! Dialect Module
//!
//! The host platform decides which filename rules and which shell
//! metacharacters matter. Rather than compiling that choice in, the engine
//! takes a `Dialect` at construction so both rule sets can be exercised on
//! any machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Filesystem and shell conventions the engine validates against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// POSIX paths and a POSIX-style shell
    Posix,
    /// Windows paths (drive letters, reserved device names) and cmd.exe
    Windows,
}

impl Dialect {
    /// Dialect of the platform this binary runs on
    pub fn host() -> Self {
        if cfg!(windows) {
            Dialect::Windows
        } else {
            Dialect::Posix
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Dialect::Windows)
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::host()
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Posix => write!(f, "posix"),
            Dialect::Windows => write!(f, "windows"),
        }
    }
}

impl FromStr for Dialect {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "posix" | "unix" | "linux" | "macos" => Ok(Dialect::Posix),
            "windows" | "win" => Ok(Dialect::Windows),
            _ => Err(ConfigError::InvalidDialect(s.to_string())),
        }
    }
}
