//! Allow/Deny List Formats
//!
//! Parses the newline-delimited list files and the comma-separated inline
//! form used on the command line.
//!
//! File format:
//! - Blank lines and lines starting with `#` are ignored
//! - Allow entries: a single command token (`[A-Za-z0-9_-]+`, at most 50
//!   characters)
//! - Deny entries: a command, optionally followed by one subcommand
//!   separated by spaces (at most 101 characters)
//!
//! Any malformed line fails the whole load. A list with no entries is also
//! an error.

use fs2::FileExt;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::error::ListError;
use crate::shell::MAX_COMMAND_LEN;

/// Maximum length of a deny entry: command, separator, subcommand
pub const MAX_DENY_ENTRY_LEN: usize = MAX_COMMAND_LEN * 2 + 1;

static ALLOW_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid allow entry regex"));

static DENY_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+( +[A-Za-z0-9_-]+)?$").expect("Invalid deny entry regex")
});

/// Which kind of list is being parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Allow,
    Deny,
}

impl ListKind {
    pub fn name(&self) -> &'static str {
        match self {
            ListKind::Allow => "allow",
            ListKind::Deny => "deny",
        }
    }

    /// Validate one entry and return its canonical form
    pub(crate) fn canonicalize(&self, entry: &str) -> Result<String, String> {
        match self {
            ListKind::Allow => validate_allow_entry(entry).map(|_| entry.to_string()),
            ListKind::Deny => validate_deny_entry(entry).map(|_| collapse_spaces(entry)),
        }
    }
}

/// Join the space-separated tokens of a command path with single spaces
pub(crate) fn collapse_spaces(path: &str) -> String {
    path.split(' ')
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check a single allow-list entry
pub fn validate_allow_entry(entry: &str) -> Result<(), String> {
    if entry.chars().count() > MAX_COMMAND_LEN {
        return Err(format!(
            "exceeds maximum length of {} characters",
            MAX_COMMAND_LEN
        ));
    }
    if !ALLOW_ENTRY.is_match(entry) {
        return Err("must contain only letters, digits, hyphens, and underscores".to_string());
    }
    Ok(())
}

/// Check a single deny-list entry
pub fn validate_deny_entry(entry: &str) -> Result<(), String> {
    if entry.chars().count() > MAX_DENY_ENTRY_LEN {
        return Err(format!(
            "exceeds maximum length of {} characters",
            MAX_DENY_ENTRY_LEN
        ));
    }
    if !DENY_ENTRY.is_match(entry) {
        return Err(
            "must be a command or a command and subcommand separated by spaces".to_string(),
        );
    }
    Ok(())
}

/// Parse list-file contents
pub fn parse_list(contents: &str, kind: ListKind) -> Result<HashSet<String>, ListError> {
    let mut entries = HashSet::new();

    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let entry = kind
            .canonicalize(line)
            .map_err(|reason| ListError::InvalidLine {
                line: index + 1,
                entry: line.to_string(),
                reason,
            })?;
        entries.insert(entry);
    }

    if entries.is_empty() {
        return Err(ListError::Empty);
    }
    Ok(entries)
}

/// Parse a comma-separated list such as `service,stats,log-tail`.
///
/// Tokens are trimmed; empty tokens from stray commas are skipped.
pub fn parse_inline(list: &str, kind: ListKind) -> Result<HashSet<String>, ListError> {
    let mut entries = HashSet::new();

    for (index, token) in list.split(',').enumerate() {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        let entry = kind
            .canonicalize(token)
            .map_err(|reason| ListError::InvalidToken {
                position: index + 1,
                entry: token.to_string(),
                reason,
            })?;
        entries.insert(entry);
    }

    if entries.is_empty() {
        return Err(ListError::Empty);
    }
    Ok(entries)
}

/// Load a list file.
///
/// Holds a shared lock while reading so a concurrent writer holding an
/// exclusive lock cannot hand us a partially written file.
pub fn load_list(path: &Path, kind: ListKind) -> Result<HashSet<String>, ListError> {
    let io_err = |source: std::io::Error| ListError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(io_err)?;
    FileExt::lock_shared(&file).map_err(io_err)?;

    let mut contents = String::new();
    let read = file.read_to_string(&mut contents);
    let _ = FileExt::unlock(&file);
    read.map_err(io_err)?;

    let entries = parse_list(&contents, kind)?;
    info!(
        path = %path.display(),
        kind = kind.name(),
        entries = entries.len(),
        "loaded command list"
    );
    Ok(entries)
}

/// Render a set in list-file format, sorted for stable output
pub fn render_list(entries: &HashSet<String>, header: &str) -> String {
    let mut sorted: Vec<&String> = entries.iter().collect();
    sorted.sort();

    let mut out = String::new();
    for line in header.lines() {
        out.push_str("# ");
        out.push_str(line);
        out.push('\n');
    }
    for entry in sorted {
        out.push_str(entry);
        out.push('\n');
    }
    debug!(entries = entries.len(), "rendered command list");
    out
}
