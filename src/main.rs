use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use cmdgate::lists::{self, ListKind};
use cmdgate::policy::{default_allow_set, default_deny_set};
use cmdgate::streaming::DEFAULT_STREAMING_PATHS;
use cmdgate::{CommandGuard, ConfigError, GuardConfig, ListSources, ValidationError};

#[derive(Parser)]
#[command(name = "cmdgate")]
#[command(about = "Validate agent-supplied commands before they reach an external CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Allow-list file (replaces the default allow-set)
    #[arg(long, global = true)]
    allow_file: Option<PathBuf>,

    /// Comma-separated allow-list (replaces the default allow-set)
    #[arg(long, global = true, value_name = "CSV")]
    allow: Option<String>,

    /// Deny-list file (replaces the default deny-set)
    #[arg(long, global = true)]
    deny_file: Option<PathBuf>,

    /// Comma-separated deny-list (replaces the default deny-set)
    #[arg(long, global = true, value_name = "CSV")]
    deny: Option<String>,

    /// Do not fall back to the default allow-set
    #[arg(long, global = true)]
    no_default_allow: bool,

    /// Path and shell dialect: posix or windows (defaults to the host)
    #[arg(long, global = true)]
    dialect: Option<String>,

    /// Log decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a command name against the allow-set
    Command {
        /// Command name
        name: String,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Validate positional arguments (use `--` before arguments starting with `-`)
    Args {
        /// Arguments to validate
        args: Vec<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Validate a flag name and, optionally, its value
    Flag {
        /// Flag name without leading dashes
        name: String,

        /// Flag value (omit for boolean flags)
        value: Option<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Validate a file path
    Path {
        /// Path to validate
        path: String,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Validate a full invocation: command, arguments, and flags
    Check {
        /// Command name
        command: String,

        /// Arguments (use `--` before arguments starting with `-`)
        args: Vec<String>,

        /// Flag as NAME=VALUE, or NAME for a boolean flag (repeatable)
        #[arg(long = "flag", value_name = "NAME=VALUE")]
        flags: Vec<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Report whether a command path is on the deny-list (exits 1 when it is)
    Denied {
        /// Command name
        command: String,

        /// Arguments
        args: Vec<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Report whether a command path is classified as streaming (report only;
    /// exits 0 either way)
    Streaming {
        /// Command name
        command: String,

        /// Arguments
        args: Vec<String>,

        /// Add a streaming path before classifying (repeatable)
        #[arg(long)]
        add: Vec<String>,

        /// Remove a streaming path before classifying (repeatable)
        #[arg(long)]
        remove: Vec<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check that an allow-list or deny-list file is well formed
    LintList {
        /// List file to check
        file: PathBuf,

        /// List kind: allow or deny
        #[arg(short, long, default_value = "allow")]
        kind: String,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print a built-in list in list-file format
    Defaults {
        /// List kind: allow, deny, or streaming
        #[arg(short, long, default_value = "allow")]
        kind: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let guard = match build_guard(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Command { name, format } => {
            let result = guard.validate_command(&name);
            report(&format, "command", &name, result);
        }

        Commands::Args { args, format } => {
            let result = guard.validate_args(&args);
            report(&format, "args", &args.join(" "), result);
        }

        Commands::Flag {
            name,
            value,
            format,
        } => {
            let result = guard.validate_flag_name(&name).and_then(|()| match &value {
                Some(value) => guard.validate_flag_value(value),
                None => Ok(()),
            });
            report(&format, "flag", &name, result);
        }

        Commands::Path { path, format } => {
            let result = guard.validate_path(&path);
            report(&format, "path", &path, result);
        }

        Commands::Check {
            command,
            args,
            flags,
            format,
        } => {
            let flags: Vec<(String, String)> = flags.iter().map(|f| split_flag(f)).collect();
            let result = guard.validate_all(&command, &args, flags);
            let subject = std::iter::once(command.as_str())
                .chain(args.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(" ");

            if format == "json" {
                let streaming = result.is_ok() && guard.streaming().is_streaming(&command, &args);
                let mut value = outcome_json("invocation", &subject, &result);
                value["streaming"] = json!(streaming);
                print_json(&value);
                if result.is_err() {
                    std::process::exit(1);
                }
            } else {
                report(&format, "invocation", &subject, result);
            }
        }

        Commands::Denied {
            command,
            args,
            format,
        } => {
            let denied = guard.policy().denied_path(&command, &args);
            if format == "json" {
                print_json(&json!({
                    "command": command,
                    "args": args,
                    "denied": denied.is_some(),
                    "matched_path": denied
                }));
            } else {
                match &denied {
                    Some(path) => println!("denied=true (matched '{}')", path),
                    None => println!("denied=false"),
                }
            }

            if denied.is_some() {
                std::process::exit(1);
            }
        }

        Commands::Streaming {
            command,
            args,
            add,
            remove,
            format,
        } => {
            let classifier = guard.streaming();
            for path in &add {
                if let Err(e) = classifier.add(path) {
                    eprintln!("Error adding streaming path: {}", e);
                    std::process::exit(1);
                }
            }
            for path in &remove {
                classifier.remove(path);
            }

            let matched = classifier.matched_path(&command, &args);
            if format == "json" {
                let mut paths: Vec<String> = classifier.list().into_iter().collect();
                paths.sort();
                print_json(&json!({
                    "command": command,
                    "args": args,
                    "streaming": matched.is_some(),
                    "matched_path": matched,
                    "streaming_paths": paths
                }));
            } else {
                match &matched {
                    Some(path) => println!("streaming=true (matched '{}')", path),
                    None => println!("streaming=false"),
                }
            }
        }

        Commands::LintList { file, kind, format } => {
            let kind = parse_kind(&kind);
            match lists::load_list(&file, kind) {
                Ok(entries) => {
                    if format == "json" {
                        print_json(&json!({
                            "valid": true,
                            "file": file.display().to_string(),
                            "kind": kind.name(),
                            "entries": entries.len()
                        }));
                    } else {
                        println!(
                            "✓ {} is a valid {} list ({} entries)",
                            file.display(),
                            kind.name(),
                            entries.len()
                        );
                    }
                }
                Err(e) => {
                    if format == "json" {
                        print_json(&json!({
                            "valid": false,
                            "file": file.display().to_string(),
                            "kind": kind.name(),
                            "error": e.to_string()
                        }));
                    } else {
                        eprintln!("✗ {}: {}", file.display(), e);
                    }
                    std::process::exit(1);
                }
            }
        }

        Commands::Defaults { kind } => {
            let (entries, header) = match kind.to_lowercase().as_str() {
                "allow" => (default_allow_set(), "Default allow list: one command per line"),
                "deny" => (
                    default_deny_set(),
                    "Default deny list: a command, or a command and subcommand, per line",
                ),
                "streaming" => (
                    DEFAULT_STREAMING_PATHS.iter().map(|s| s.to_string()).collect(),
                    "Default streaming command paths",
                ),
                _ => {
                    eprintln!(
                        "Invalid list kind: {}. Valid kinds: allow, deny, streaming",
                        kind
                    );
                    std::process::exit(1);
                }
            };
            print!("{}", lists::render_list(&entries, header));
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .init();
}

fn build_guard(cli: &Cli) -> Result<CommandGuard, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => GuardConfig::load(path)?,
        None => GuardConfig::default(),
    };

    if cli.no_default_allow {
        config = config.without_default_allow_set();
    }
    if let Some(dialect) = &cli.dialect {
        config = config.with_dialect(dialect.parse()?);
    }

    let sources = ListSources {
        allow_file: cli.allow_file.clone(),
        allow_inline: cli.allow.clone(),
        deny_file: cli.deny_file.clone(),
        deny_inline: cli.deny.clone(),
    };
    let config = config.apply_sources(&sources)?;

    Ok(CommandGuard::from_config(&config))
}

fn parse_kind(kind: &str) -> ListKind {
    match kind.to_lowercase().as_str() {
        "allow" => ListKind::Allow,
        "deny" => ListKind::Deny,
        _ => {
            eprintln!("Invalid list kind: {}. Valid kinds: allow, deny", kind);
            std::process::exit(1);
        }
    }
}

/// `name=value`, or a bare `name` for a boolean flag
fn split_flag(flag: &str) -> (String, String) {
    match flag.split_once('=') {
        Some((name, value)) => (name.to_string(), value.to_string()),
        None => (flag.to_string(), String::new()),
    }
}

fn outcome_json(
    field: &str,
    subject: &str,
    result: &Result<(), ValidationError>,
) -> serde_json::Value {
    match result {
        Ok(()) => json!({
            "valid": true,
            "field": field,
            "input": subject
        }),
        Err(e) => json!({
            "valid": false,
            "field": field,
            "input": subject,
            "category": e.category(),
            "error": e.to_string()
        }),
    }
}

/// Print a validation outcome and exit non-zero on rejection
fn report(format: &str, field: &str, subject: &str, result: Result<(), ValidationError>) {
    if format == "json" {
        print_json(&outcome_json(field, subject, &result));
    } else {
        match &result {
            Ok(()) => println!("✓ {} '{}' accepted", field, subject),
            Err(e) => println!("✗ {} '{}' rejected: {}", field, subject, e),
        }
    }

    if result.is_err() {
        std::process::exit(1);
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            std::process::exit(1);
        }
    }
}
