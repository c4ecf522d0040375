//! Streaming Classification
//!
//! Tracks which command paths are long-running and should be executed in the
//! background. Matching follows the deny-list rules (see `matcher`), but the
//! set is mutable for the lifetime of the process, so it lives behind a
//! read-write lock: lookups share the lock, `add`/`remove` take it
//! exclusively.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::info;

use crate::error::ListError;
use crate::lists::{self, ListKind};
use crate::matcher;

/// Paths classified as streaming by default
pub const DEFAULT_STREAMING_PATHS: &[&str] = &["log-tail", "stats realtime"];

/// Runtime-mutable set of streaming command paths
#[derive(Debug)]
pub struct StreamingClassifier {
    paths: RwLock<HashSet<String>>,
}

impl Default for StreamingClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingClassifier {
    /// Classifier seeded with `DEFAULT_STREAMING_PATHS`
    pub fn new() -> Self {
        Self::with_paths(DEFAULT_STREAMING_PATHS.iter().map(|s| s.to_string()))
    }

    pub fn with_paths<I: IntoIterator<Item = String>>(paths: I) -> Self {
        Self {
            paths: RwLock::new(paths.into_iter().collect()),
        }
    }

    /// Whether `command` + `args` names a streaming path
    pub fn is_streaming<S: AsRef<str>>(&self, command: &str, args: &[S]) -> bool {
        matcher::matches(&self.read(), command, args)
    }

    /// The streaming path `command` + `args` matched, if any
    pub fn matched_path<S: AsRef<str>>(&self, command: &str, args: &[S]) -> Option<String> {
        matcher::matched_path(&self.read(), command, args)
    }

    /// Add a path in deny-list entry form (a command, optionally followed by
    /// one subcommand). Returns false if it was already present.
    pub fn add(&self, path: &str) -> Result<bool, ListError> {
        let path = ListKind::Deny
            .canonicalize(path)
            .map_err(|reason| ListError::InvalidPath {
                path: path.to_string(),
                reason,
            })?;
        info!(path = %path, "adding streaming command path");
        Ok(self.write().insert(path))
    }

    /// Remove a path; returns false if it was not present
    pub fn remove(&self, path: &str) -> bool {
        let path = lists::collapse_spaces(path);
        info!(path = %path, "removing streaming command path");
        self.write().remove(&path)
    }

    /// Snapshot of the current set. Changes to the copy do not affect the
    /// classifier.
    pub fn list(&self) -> HashSet<String> {
        self.read().clone()
    }

    // Poisoning is ignored: every write is a single insert or remove.
    fn read(&self) -> RwLockReadGuard<'_, HashSet<String>> {
        self.paths.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashSet<String>> {
        self.paths.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clone for StreamingClassifier {
    fn clone(&self) -> Self {
        Self::with_paths(self.list())
    }
}
