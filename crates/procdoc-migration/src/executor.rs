//! Migration execution
//!
//! Each migratable candidate is copied to its target without overwrite. The
//! source is deleted only in destructive mode and only after the copy
//! succeeded. Entries are independent: a failure is recorded and the rest
//! carry on.

use crate::planner::{MigrationCandidate, MigrationPlan};
use futures::future::join_all;
use procdoc_storage::{content_type_for, ObjectStore, StorageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Execution settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOptions {
    /// Delete each source after a successful copy
    pub destructive: bool,
}

impl ExecutionOptions {
    /// Copy only, keep sources
    #[must_use]
    pub const fn copy_only() -> Self {
        Self { destructive: false }
    }

    /// Copy, then delete sources
    #[must_use]
    pub const fn destructive() -> Self {
        Self { destructive: true }
    }
}

/// Step at which an entry failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Reading the source
    Read,
    /// Writing the target
    Copy,
    /// Removing the source after the copy
    Delete,
}

/// Outcome of one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryStatus {
    /// Target written, source kept
    Copied,
    /// Target written, source deleted
    Moved,
    /// Source was gone when the entry ran
    SourceMissing,
    /// Target written, but the source had already vanished at delete time
    SourceVanished,
    /// Entry failed; for [`FailureStage::Delete`] the target was written
    Failed { stage: FailureStage, error: String },
}

/// One executed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOutcome {
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub status: EntryStatus,
}

impl EntryOutcome {
    /// Whether the target now holds the source content
    #[must_use]
    pub fn target_written(&self) -> bool {
        matches!(
            self.status,
            EntryStatus::Copied
                | EntryStatus::Moved
                | EntryStatus::SourceVanished
                | EntryStatus::Failed {
                    stage: FailureStage::Delete,
                    ..
                }
        )
    }
}

/// Outcomes of [`MigrationExecutor::execute`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub destructive: bool,
    pub outcomes: Vec<EntryOutcome>,
}

impl ExecutionReport {
    /// Entries whose target was written
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.target_written()).count()
    }

    /// Entries that did not complete as requested
    ///
    /// A vanished source is not a failure: the target is written and the
    /// source is gone, which is what a move asked for.
    pub fn failures(&self) -> impl Iterator<Item = &EntryOutcome> {
        self.outcomes.iter().filter(|o| {
            !matches!(
                o.status,
                EntryStatus::Copied | EntryStatus::Moved | EntryStatus::SourceVanished
            )
        })
    }

    /// Outcome for `source`
    #[must_use]
    pub fn outcome(&self, source: &str) -> Option<&EntryOutcome> {
        self.outcomes.iter().find(|o| o.source == source)
    }
}

/// Applies the migratable part of a [`MigrationPlan`]
#[derive(Clone)]
pub struct MigrationExecutor {
    store: Arc<dyn ObjectStore>,
    options: ExecutionOptions,
}

impl fmt::Debug for MigrationExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationExecutor")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl MigrationExecutor {
    /// Create executor over `store`, copy-only
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            options: ExecutionOptions::default(),
        }
    }

    /// With options
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    /// Run every migratable candidate concurrently
    ///
    /// Blocked candidates are skipped. Never fails as a whole; per-entry
    /// failures are in the report.
    pub async fn execute(&self, plan: &MigrationPlan) -> ExecutionReport {
        let outcomes = join_all(
            plan.migratable()
                .filter_map(|c| c.target().map(|t| (c, t)))
                .map(|(candidate, target)| self.run_entry(candidate, target)),
        )
        .await;

        let report = ExecutionReport {
            destructive: self.options.destructive,
            outcomes,
        };
        tracing::info!(
            entries = report.outcomes.len(),
            succeeded = report.succeeded(),
            failed = report.failures().count(),
            destructive = report.destructive,
            "migration executed"
        );
        report
    }

    async fn run_entry(&self, candidate: &MigrationCandidate, target: &str) -> EntryOutcome {
        let source = candidate.source.as_str();
        let outcome = |status| EntryOutcome {
            source: source.to_string(),
            target: target.to_string(),
            status,
        };
        let failed = |stage: FailureStage, err: StorageError| {
            tracing::warn!(from = source, to = target, ?stage, error = %err, "migration entry failed");
            EntryStatus::Failed {
                stage,
                error: err.to_string(),
            }
        };

        let bytes = match self.store.download(source).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return outcome(EntryStatus::SourceMissing),
            Err(e) => return outcome(failed(FailureStage::Read, e)),
        };

        if let Err(e) = self
            .store
            .upload(target, bytes, content_type_for(target), false)
            .await
        {
            return outcome(failed(FailureStage::Copy, e));
        }

        if !self.options.destructive {
            tracing::debug!(from = source, to = target, "copied");
            return outcome(EntryStatus::Copied);
        }

        match self.store.delete(source).await {
            Ok(true) => {
                tracing::debug!(from = source, to = target, "moved");
                outcome(EntryStatus::Moved)
            }
            Ok(false) => {
                tracing::warn!(from = source, to = target, "source vanished before delete");
                outcome(EntryStatus::SourceVanished)
            }
            Err(e) => outcome(failed(FailureStage::Delete, e)),
        }
    }
}
