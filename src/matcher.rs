//! Command Path Matching
//!
//! Shared by the deny-list and the streaming classifier. Given a command and
//! its arguments, candidate paths are built one token at a time
//! (`cmd`, `cmd a0`, `cmd a0 a1`, `cmd a0 a1 a2`) and tested against a set.
//! Arguments past the third never take part, which keeps the cost of a
//! lookup fixed no matter how long the argument list is.

use std::collections::HashSet;

/// Number of tokens (command plus arguments) considered when matching
pub const MAX_MATCH_DEPTH: usize = 4;

/// First candidate path of `command` + `args` contained in `set`
pub fn matched_path<S: AsRef<str>>(
    set: &HashSet<String>,
    command: &str,
    args: &[S],
) -> Option<String> {
    let mut candidate = command.to_string();
    if set.contains(&candidate) {
        return Some(candidate);
    }

    for arg in args.iter().take(MAX_MATCH_DEPTH - 1) {
        candidate.push(' ');
        candidate.push_str(arg.as_ref());
        if set.contains(&candidate) {
            return Some(candidate);
        }
    }

    None
}

/// Whether any candidate path of `command` + `args` is in `set`
pub fn matches<S: AsRef<str>>(set: &HashSet<String>, command: &str, args: &[S]) -> bool {
    matched_path(set, command, args).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(entries: &[&str]) -> HashSet<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_bare_command_match() {
        let paths = set(&["log-tail"]);
        let no_args: [&str; 0] = [];
        assert!(matches(&paths, "log-tail", &no_args));
        assert!(matches(&paths, "log-tail", &["--service-id", "abc"]));
        assert!(!matches(&paths, "log", &no_args));
    }

    #[test]
    fn test_subcommand_match() {
        let paths = set(&["stats realtime"]);
        assert_eq!(
            matched_path(&paths, "stats", &["realtime", "--json"]),
            Some("stats realtime".to_string())
        );
        assert!(!matches(&paths, "stats", &["historical"]));
        assert!(!matches(&paths, "stats", &[] as &[&str]));
    }

    #[test]
    fn test_shortest_match_reported() {
        let paths = set(&["service", "service delete"]);
        assert_eq!(
            matched_path(&paths, "service", &["delete"]),
            Some("service".to_string())
        );
    }

    #[test]
    fn test_depth_is_bounded() {
        let paths = set(&["a b c d", "a b c d e"]);
        assert!(matches(&paths, "a", &["b", "c", "d"]));
        // Fifth token never considered
        let paths = set(&["a b c d e"]);
        assert!(!matches(&paths, "a", &["b", "c", "d", "e"]));
    }

    #[test]
    fn test_matching_is_exact() {
        let paths = set(&["stats realtime"]);
        assert!(!matches(&paths, "Stats", &["realtime"]));
        assert!(!matches(&paths, "stats", &["realtime "]));
        assert!(!matches(&paths, "stats", &["real"]));
    }

    #[test]
    fn test_owned_arguments() {
        let paths = set(&["vcl custom"]);
        let args = vec!["custom".to_string(), "list".to_string()];
        assert!(matches(&paths, "vcl", &args));
    }
}
