//! # procdoc-cli
//!
//! Command-line front end for the procdoc crates: content hashing, version
//! history, artifact path resolution and the legacy feature-goal migration.
//!
//! ```text
//! procdoc upload mortgage.bpmn --by alice --summary "initial import"
//! procdoc paths --file mortgage.bpmn --element Task_1 --mode slow --provider cloud
//! procdoc plan-migration --process-map process-map.json --json
//! procdoc migrate --process-map process-map.json --destructive
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;

pub use cli::{command, resolve_config, KINDS};
pub use commands::run;
pub use config::{ConfigError, LogFormat, ProcdocConfig};

/// Version of procdoc-cli
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
