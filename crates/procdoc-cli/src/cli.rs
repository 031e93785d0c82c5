//! Argument definitions

use crate::config::{LogFormat, ProcdocConfig};
use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

/// Artifact kinds accepted by `paths --kind`
pub const KINDS: [&str; 3] = ["node-doc", "feature-goal-doc", "node-test"];

/// Build the `procdoc` command
#[must_use]
pub fn command() -> Command {
    Command::new("procdoc")
        .version(crate::VERSION)
        .about("Versioned BPMN sources, artifact storage paths and legacy migration")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .env("PROCDOC_CONFIG")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("storage-root")
                .long("storage-root")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Artifact storage root directory"),
        )
        .arg(
            Arg::new("database-url")
                .long("database-url")
                .global(true)
                .help("SQLite URL of the version database"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .value_parser(["text", "json"])
                .help("Log output format"),
        )
        .subcommand(
            Command::new("hash")
                .about("Print the normalized content hash of a file")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("paths")
                .about("Print storage locations for one artifact")
                .arg(
                    Arg::new("file")
                        .long("file")
                        .required(true)
                        .help("Subject BPMN file"),
                )
                .arg(
                    Arg::new("element")
                        .long("element")
                        .required(true)
                        .help("Element id"),
                )
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .default_value("node-doc")
                        .value_parser(KINDS),
                )
                .arg(
                    Arg::new("parent")
                        .long("parent")
                        .help("Parent file; selects hierarchical feature-goal naming"),
                )
                .arg(Arg::new("mode").long("mode").help("Generation mode (local, slow)"))
                .arg(
                    Arg::new("provider")
                        .long("provider")
                        .help("Provider for slow mode (cloud, local, fallback)"),
                )
                .arg(
                    Arg::new("current-version")
                        .long("current-version")
                        .action(ArgAction::SetTrue)
                        .help("Include the versioned path of the subject's current version"),
                ),
        )
        .subcommand(
            Command::new("upload")
                .about("Record a BPMN file as a new or existing version")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("name")
                        .long("name")
                        .help("Logical file name (defaults to the file's name)"),
                )
                .arg(Arg::new("by").long("by").help("Uploader"))
                .arg(Arg::new("summary").long("summary").help("Change summary"))
                .arg(
                    Arg::new("metadata")
                        .long("metadata")
                        .help("Metadata as a JSON object"),
                ),
        )
        .subcommand(
            Command::new("versions")
                .about("List versions of a file, newest first")
                .arg(Arg::new("name").required(true)),
        )
        .subcommand(
            Command::new("set-current")
                .about("Make an existing version current")
                .arg(Arg::new("name").required(true))
                .arg(Arg::new("hash").required(true)),
        )
        .subcommand(
            Command::new("plan-migration")
                .about("Classify legacy feature-goal artifacts")
                .arg(process_map_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output the full plan as JSON"),
                ),
        )
        .subcommand(
            Command::new("migrate")
                .about("Copy migratable legacy artifacts to hierarchical names")
                .arg(process_map_arg())
                .arg(
                    Arg::new("destructive")
                        .long("destructive")
                        .action(ArgAction::SetTrue)
                        .help("Delete each source after a successful copy"),
                ),
        )
}

fn process_map_arg() -> Arg {
    Arg::new("process-map")
        .long("process-map")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Process map file (.json, .yaml, .yml)")
}

/// Configuration from file and environment, then command-line flags
///
/// # Errors
/// Unreadable or invalid configuration
pub fn resolve_config(matches: &ArgMatches) -> anyhow::Result<ProcdocConfig> {
    let path = matches.get_one::<PathBuf>("config");
    let mut config = ProcdocConfig::load(path.map(PathBuf::as_path))
        .context("failed to load configuration")?;

    if let Some(root) = matches.get_one::<PathBuf>("storage-root") {
        config = config.with_storage_root(root.clone());
    }
    if let Some(url) = matches.get_one::<String>("database-url") {
        config = config.with_database_url(url.clone());
    }
    if let Some(format) = matches
        .get_one::<String>("log-format")
        .and_then(|f| LogFormat::parse(f))
    {
        config = config.with_log_format(format);
    }
    Ok(config)
}
