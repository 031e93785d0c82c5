//! procdoc Legacy Migration
//!
//! Reconciles flat feature-goal artifacts with parent-qualified names.
//!
//! 1. [`ProcessMap`] records which parent file calls which subprocess
//! 2. [`MigrationPlanner`] lists `feature-goals/` in every documentation
//!    bucket and classifies each artifact against the map
//! 3. [`MigrationExecutor`] copies migratable artifacts, optionally deleting
//!    the sources
//!
//! Matching is structural only. A flat name matches a relation when it equals
//! `base(subprocess)` or `base(subprocess)-{element}`; no match or several
//! matches leave the artifact in place with a [`BlockReason`].

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod executor;
mod planner;
mod process_map;

pub use error::{MigrationError, MigrationResult};
pub use executor::{
    EntryOutcome, EntryStatus, ExecutionOptions, ExecutionReport, FailureStage, MigrationExecutor,
};
pub use planner::{
    BlockReason, Classification, MigrationCandidate, MigrationPlan, MigrationPlanner, PlanSummary,
};
pub use process_map::{CallActivity, ProcessMap, ProcessMapBuilder, SubprocessLink};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
