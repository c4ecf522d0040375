//! Engine Configuration
//!
//! Fixed at construction time. Custom allow/deny sets replace the defaults
//! outright. Callers that want to extend the defaults must union the sets
//! themselves before building the engine.
//!
//! A config can come from JSON:
//!
//! ```json
//! {
//!   "use_default_allow_set": true,
//!   "custom_deny_set": ["stats realtime", "purge"],
//!   "dialect": "windows"
//! }
//! ```
//!
//! or from list files and inline comma lists via `ListSources`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dialect::Dialect;
use crate::error::{ConfigError, ListError};
use crate::lists::{self, ListKind};
use crate::policy::{default_allow_set, default_deny_set};

/// Construction-time engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Fall back to the built-in allow-set when no custom set is given
    pub use_default_allow_set: bool,
    /// Replaces the allow-set entirely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_allow_set: Option<HashSet<String>>,
    /// Replaces the deny-set entirely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_deny_set: Option<HashSet<String>>,
    pub dialect: Dialect,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            use_default_allow_set: true,
            custom_allow_set: None,
            custom_deny_set: None,
            dialect: Dialect::host(),
        }
    }
}

/// Where to read custom allow/deny lists from
#[derive(Debug, Clone, Default)]
pub struct ListSources {
    pub allow_file: Option<PathBuf>,
    pub allow_inline: Option<String>,
    pub deny_file: Option<PathBuf>,
    pub deny_inline: Option<String>,
}

impl GuardConfig {
    pub fn with_allow_set(mut self, allowed: HashSet<String>) -> Self {
        self.custom_allow_set = Some(allowed);
        self
    }

    pub fn with_deny_set(mut self, denied: HashSet<String>) -> Self {
        self.custom_deny_set = Some(denied);
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Without a custom allow-set, every command will be rejected
    pub fn without_default_allow_set(mut self) -> Self {
        self.use_default_allow_set = false;
        self
    }

    /// Parse a JSON config, validating any custom entries
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GuardConfig = serde_json::from_str(json)?;
        config.validated()
    }

    /// Load a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Override the custom sets from files or inline lists
    pub fn apply_sources(mut self, sources: &ListSources) -> Result<Self, ConfigError> {
        if let Some(allowed) = read_source(
            ListKind::Allow,
            sources.allow_file.as_deref(),
            sources.allow_inline.as_deref(),
        )? {
            self.custom_allow_set = Some(allowed);
        }
        if let Some(denied) = read_source(
            ListKind::Deny,
            sources.deny_file.as_deref(),
            sources.deny_inline.as_deref(),
        )? {
            self.custom_deny_set = Some(denied);
        }
        Ok(self)
    }

    /// Allow-set the engine will use
    pub fn resolve_allow_set(&self) -> HashSet<String> {
        match &self.custom_allow_set {
            Some(custom) => custom.clone(),
            None if self.use_default_allow_set => default_allow_set(),
            None => HashSet::new(),
        }
    }

    /// Deny-set the engine will use
    pub fn resolve_deny_set(&self) -> HashSet<String> {
        match &self.custom_deny_set {
            Some(custom) => custom.clone(),
            None => default_deny_set(),
        }
    }

    /// Check custom entries against the list formats, canonicalising deny
    /// paths
    fn validated(mut self) -> Result<Self, ConfigError> {
        if let Some(allowed) = self.custom_allow_set.take() {
            self.custom_allow_set = Some(canonical_set(allowed, ListKind::Allow)?);
        }
        if let Some(denied) = self.custom_deny_set.take() {
            self.custom_deny_set = Some(canonical_set(denied, ListKind::Deny)?);
        }
        Ok(self)
    }
}

fn read_source(
    kind: ListKind,
    file: Option<&Path>,
    inline: Option<&str>,
) -> Result<Option<HashSet<String>>, ConfigError> {
    let list = kind.name();
    let wrap = |source: ListError| ConfigError::List { list, source };

    match (file, inline) {
        (Some(_), Some(_)) => Err(ConfigError::ConflictingSources(list)),
        (Some(path), None) => lists::load_list(path, kind).map(Some).map_err(wrap),
        (None, Some(inline)) => lists::parse_inline(inline, kind).map(Some).map_err(wrap),
        (None, None) => Ok(None),
    }
}

fn canonical_set(entries: HashSet<String>, kind: ListKind) -> Result<HashSet<String>, ConfigError> {
    let mut sorted: Vec<String> = entries.into_iter().collect();
    sorted.sort();

    sorted
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            kind.canonicalize(&entry)
                .map_err(|reason| ConfigError::List {
                    list: kind.name(),
                    source: ListError::InvalidToken {
                        position: index + 1,
                        entry,
                        reason,
                    },
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = GuardConfig::default();

        assert!(config.use_default_allow_set);
        assert_eq!(config.dialect, Dialect::host());
        assert!(config.resolve_allow_set().contains("service"));
        assert!(config.resolve_deny_set().contains("stats realtime"));
    }

    #[test]
    fn test_custom_sets_replace_defaults() {
        let allowed: HashSet<String> = ["deploy".to_string()].into_iter().collect();
        let config = GuardConfig::default()
            .with_allow_set(allowed)
            .with_deny_set(HashSet::new());

        let resolved = config.resolve_allow_set();
        assert_eq!(resolved.len(), 1);
        assert!(!resolved.contains("service"));
        assert!(config.resolve_deny_set().is_empty());
    }

    #[test]
    fn test_no_default_allow_set() {
        let config = GuardConfig::default().without_default_allow_set();
        assert!(config.resolve_allow_set().is_empty());
    }

    #[test]
    fn test_from_json() {
        let config = GuardConfig::from_json(
            r#"{"custom_deny_set": ["purge", "stats   realtime"], "dialect": "windows"}"#,
        )
        .unwrap();

        assert!(config.use_default_allow_set);
        assert_eq!(config.dialect, Dialect::Windows);
        let denied = config.resolve_deny_set();
        assert!(denied.contains("purge"));
        assert!(denied.contains("stats realtime"));
    }

    #[test]
    fn test_from_json_rejects_bad_entries() {
        let err = GuardConfig::from_json(r#"{"custom_allow_set": ["ok", "rm -rf"]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::List { list: "allow", .. }));

        let err = GuardConfig::from_json(r#"{"dialect": "amiga"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("guard.json");
        fs::write(&path, r#"{"use_default_allow_set": false, "dialect": "posix"}"#).unwrap();

        let config = GuardConfig::load(&path).unwrap();
        assert!(!config.use_default_allow_set);
        assert_eq!(config.dialect, Dialect::Posix);
    }

    #[test]
    fn test_apply_inline_sources() {
        let sources = ListSources {
            allow_inline: Some("service, stats".to_string()),
            deny_inline: Some("stats historical".to_string()),
            ..Default::default()
        };
        let config = GuardConfig::default().apply_sources(&sources).unwrap();

        assert_eq!(config.resolve_allow_set().len(), 2);
        let denied = config.resolve_deny_set();
        assert!(denied.contains("stats historical"));
        assert!(!denied.contains("stats realtime"));
    }

    #[test]
    fn test_apply_file_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deny.txt");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "# no purging").unwrap();
        writeln!(file, "purge").unwrap();
        drop(file);

        let sources = ListSources {
            deny_file: Some(path),
            ..Default::default()
        };
        let config = GuardConfig::default().apply_sources(&sources).unwrap();
        assert!(config.resolve_deny_set().contains("purge"));
        assert!(config.custom_allow_set.is_none());
    }

    #[test]
    fn test_conflicting_sources() {
        let sources = ListSources {
            allow_file: Some(PathBuf::from("allow.txt")),
            allow_inline: Some("service".to_string()),
            ..Default::default()
        };
        let err = GuardConfig::default().apply_sources(&sources).unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingSources("allow")));
    }

    #[test]
    fn test_empty_inline_source_is_error() {
        let sources = ListSources {
            allow_inline: Some(",,".to_string()),
            ..Default::default()
        };
        let err = GuardConfig::default().apply_sources(&sources).unwrap_err();
        assert!(err.to_string().contains("no valid commands found"));
    }
}
