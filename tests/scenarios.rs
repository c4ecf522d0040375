//! End-to-end checks through the public API, from configuration to verdict.

use std::collections::HashSet;
use std::fs;

use cmdgate::{CommandGuard, ConfigError, Dialect, ErrorCategory, GuardConfig, ListSources};
use tempfile::TempDir;

const NO_ARGS: &[&str] = &[];
const NO_FLAGS: [(&str, &str); 0] = [];

#[test]
fn test_default_configuration_scenarios() {
    let guard = CommandGuard::from_config(&GuardConfig::default().with_dialect(Dialect::Posix));

    assert!(guard.validate_command("service").is_ok());

    let err = guard.validate_command("malicious").unwrap_err();
    assert!(err.to_string().contains("not in the allowed list"));

    let err = guard.validate_args(&["test;ls"]).unwrap_err();
    assert!(err.to_string().contains("forbidden character"));

    let err = guard.validate_path("../../../etc/passwd").unwrap_err();
    assert!(err.to_string().contains("path traversal"));

    assert!(guard.policy().is_denied("stats", &["realtime"]));
    assert!(!guard.policy().is_denied("stats", &["historical"]));

    assert!(guard.validate_flag_name("my_flag").is_err());
    assert!(guard.validate_flag_name("service-id").is_ok());

    assert!(guard.validate_path("CON.txt").is_ok());
}

#[test]
fn test_streaming_mutation() {
    let guard = CommandGuard::new();

    assert!(guard.streaming().is_streaming("log-tail", NO_ARGS));
    guard.streaming().remove("log-tail");
    assert!(!guard.streaming().is_streaming("log-tail", NO_ARGS));
}

#[test]
fn test_windows_dialect_scenarios() {
    let guard = CommandGuard::from_config(&GuardConfig::default().with_dialect(Dialect::Windows));

    let err = guard.validate_path("CON.txt").unwrap_err();
    assert!(err.to_string().contains("reserved device name"));
    assert_eq!(err.category(), ErrorCategory::PlatformPath);

    let err = guard.validate_path("\\\\fileserver\\share\\x").unwrap_err();
    assert!(err.to_string().contains("UNC paths are not allowed"));

    let err = guard.validate_flag_value("100%").unwrap_err();
    assert!(err.to_string().contains("forbidden character"));
}

#[test]
fn test_list_files_drive_policy() {
    let dir = TempDir::new().unwrap();
    let allow = dir.path().join("allow.txt");
    let deny = dir.path().join("deny.txt");
    fs::write(&allow, "# deploy tooling\ndeploy\nstatus\n").unwrap();
    fs::write(&deny, "deploy production\n").unwrap();

    let sources = ListSources {
        allow_file: Some(allow),
        deny_file: Some(deny),
        ..Default::default()
    };
    let config = GuardConfig::default().apply_sources(&sources).unwrap();
    let guard = CommandGuard::from_config(&config);

    assert!(guard.validate_command("deploy").is_ok());
    assert!(guard.validate_command("service").is_err());
    assert!(guard
        .validate_all("deploy", &["staging"], [("force", "")])
        .is_ok());

    let err = guard
        .validate_all("deploy", &["production"], NO_FLAGS)
        .unwrap_err();
    assert!(err.to_string().starts_with("invalid command: "));
    assert!(err.to_string().contains("is not available"));
}

#[test]
fn test_malformed_list_file_fails_startup() {
    let dir = TempDir::new().unwrap();
    let allow = dir.path().join("allow.txt");
    fs::write(&allow, "deploy\nrm -rf\n").unwrap();

    let sources = ListSources {
        allow_file: Some(allow),
        ..Default::default()
    };
    let err = GuardConfig::default().apply_sources(&sources).unwrap_err();
    assert!(matches!(err, ConfigError::List { list: "allow", .. }));
    assert!(err.to_string().contains("line 2"));
}

#[test]
fn test_custom_sets_are_not_merged() {
    let allowed: HashSet<String> = ["stats".to_string()].into_iter().collect();
    let guard = CommandGuard::from_config(
        &GuardConfig::default()
            .with_allow_set(allowed)
            .with_deny_set(HashSet::new()),
    );

    assert!(guard.validate_command("service").is_err());
    assert!(guard.validate_all("stats", &["realtime"], NO_FLAGS).is_ok());
}

#[test]
fn test_verdicts_repeatable() {
    let guard = CommandGuard::new();
    for (command, args) in [("service", vec!["list"]), ("stats", vec!["realtime"])] {
        let first = guard.check_invocation(command, &args);
        let second = guard.check_invocation(command, &args);
        assert_eq!(first, second);
    }
}
