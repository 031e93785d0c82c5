//! Legacy feature-goal migration planning
//!
//! Flat feature-goal artifacts are named after the subprocess only. Once the
//! process map says which parent calls a subprocess, the artifact can move to
//! its parent-qualified name. The planner never guesses: a name with zero or
//! several structural matches is reported, not moved.

use crate::error::MigrationResult;
use crate::process_map::{ProcessMap, SubprocessLink};
use futures::future::try_join_all;
use procdoc_artifact::{
    feature_goal_doc_key, ArtifactPath, ContentHash, NamingScheme, Namespace, StorageBucket,
    FEATURE_GOALS_DIR,
};
use procdoc_storage::ObjectStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};
use std::sync::Arc;

/// Why a legacy artifact is not migratable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum BlockReason {
    /// No process-map relation matches the file name
    NoMatch,
    /// The hierarchical target is already taken
    TargetExists { target: String },
    /// Several call activities match the file name
    Ambiguous { candidates: Vec<SubprocessLink> },
    /// Several sources in the plan resolve to the same target
    DuplicateTarget { target: String, sources: Vec<String> },
}

impl Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatch => write!(f, "no match in process map"),
            Self::TargetExists { target } => write!(f, "target already exists: {target}"),
            Self::Ambiguous { candidates } => {
                let parents: BTreeSet<&str> =
                    candidates.iter().map(|c| c.parent_file.as_str()).collect();
                if parents.len() == candidates.len() {
                    write!(f, "ambiguous: {} candidate parents", parents.len())
                } else {
                    write!(
                        f,
                        "ambiguous: {} candidate call activities in {} parent file(s)",
                        candidates.len(),
                        parents.len()
                    )
                }
            }
            Self::DuplicateTarget { target, sources } => {
                write!(f, "target claimed by {} sources: {target}", sources.len())
            }
        }
    }
}

/// Planned outcome for one legacy artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Classification {
    /// Exactly one match and a free target
    Migratable {
        target: String,
        link: SubprocessLink,
    },
    /// Left in place
    Blocked { reason: BlockReason },
}

/// One enumerated artifact and its classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationCandidate {
    /// Current path
    pub source: String,
    /// Bucket the source lives in; targets stay in it
    pub bucket: StorageBucket,
    /// File stem used for matching
    pub file_base: String,
    /// Outcome
    pub classification: Classification,
}

impl MigrationCandidate {
    /// Whether the candidate will be moved
    #[must_use]
    pub fn is_migratable(&self) -> bool {
        matches!(self.classification, Classification::Migratable { .. })
    }

    /// Target path, for migratable candidates
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match &self.classification {
            Classification::Migratable { target, .. } => Some(target),
            Classification::Blocked { .. } => None,
        }
    }

    /// Block reason, for blocked candidates
    #[must_use]
    pub fn block_reason(&self) -> Option<&BlockReason> {
        match &self.classification {
            Classification::Blocked { reason } => Some(reason),
            Classification::Migratable { .. } => None,
        }
    }
}

/// Counts per classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total: usize,
    pub migratable: usize,
    pub no_match: usize,
    pub target_exists: usize,
    pub ambiguous: usize,
    pub duplicate_target: usize,
    pub already_canonical: usize,
}

/// Result of [`MigrationPlanner::plan`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationPlan {
    /// Every enumerated legacy artifact, sorted by source path
    pub candidates: Vec<MigrationCandidate>,
    /// Artifacts already named after their parent; not candidates
    pub already_canonical: Vec<String>,
}

impl MigrationPlan {
    /// Candidates that will be moved
    pub fn migratable(&self) -> impl Iterator<Item = &MigrationCandidate> {
        self.candidates.iter().filter(|c| c.is_migratable())
    }

    /// Candidates left in place
    pub fn blocked(&self) -> impl Iterator<Item = &MigrationCandidate> {
        self.candidates.iter().filter(|c| !c.is_migratable())
    }

    /// Candidate for `source`
    #[must_use]
    pub fn candidate(&self, source: &str) -> Option<&MigrationCandidate> {
        self.candidates.iter().find(|c| c.source == source)
    }

    /// Counts per classification
    #[must_use]
    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary {
            total: self.candidates.len(),
            already_canonical: self.already_canonical.len(),
            ..PlanSummary::default()
        };
        for candidate in &self.candidates {
            match candidate.block_reason() {
                None => summary.migratable += 1,
                Some(BlockReason::NoMatch) => summary.no_match += 1,
                Some(BlockReason::TargetExists { .. }) => summary.target_exists += 1,
                Some(BlockReason::Ambiguous { .. }) => summary.ambiguous += 1,
                Some(BlockReason::DuplicateTarget { .. }) => summary.duplicate_target += 1,
            }
        }
        summary
    }

    /// Pretty JSON for audit logs
    ///
    /// # Errors
    /// Serialization failure
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Plans moves of flat feature-goal artifacts to hierarchical names
#[derive(Clone)]
pub struct MigrationPlanner {
    store: Arc<dyn ObjectStore>,
}

impl fmt::Debug for MigrationPlanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationPlanner").finish_non_exhaustive()
    }
}

/// A candidate waiting for its target existence check
struct Pending {
    source: String,
    bucket: StorageBucket,
    file_base: String,
    target: String,
    link: SubprocessLink,
}

impl MigrationPlanner {
    /// Create planner over `store`
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Unversioned feature-goal directory of each documentation bucket
    #[must_use]
    pub fn feature_goal_dirs() -> Vec<String> {
        StorageBucket::DOC_BUCKETS
            .iter()
            .map(|b| format!("{}{FEATURE_GOALS_DIR}", b.prefix(Namespace::Docs.root())))
            .collect()
    }

    /// Feature-goal directories of every stored version in every
    /// documentation bucket: `docs/{bucket}/{file}/{hash}/feature-goals`
    ///
    /// # Errors
    /// [`crate::MigrationError::Storage`] on object store failure
    pub async fn versioned_feature_goal_dirs(&self) -> MigrationResult<Vec<String>> {
        let roots: Vec<String> = StorageBucket::DOC_BUCKETS
            .iter()
            .map(|b| {
                b.prefix(Namespace::Docs.root())
                    .trim_end_matches('/')
                    .to_string()
            })
            .collect();
        let file_dirs = try_join_all(roots.iter().map(|root| self.store.list_dirs(root))).await?;

        let version_parents: Vec<String> = roots
            .iter()
            .zip(file_dirs)
            .flat_map(|(root, files)| files.into_iter().map(move |file| format!("{root}/{file}")))
            .collect();
        let hash_dirs =
            try_join_all(version_parents.iter().map(|dir| self.store.list_dirs(dir))).await?;

        // Bucket segments such as `slow/chatgpt` also show up here; only hash
        // directories mark a version
        let dirs: BTreeSet<String> = version_parents
            .iter()
            .zip(hash_dirs)
            .flat_map(|(parent, hashes)| {
                hashes
                    .into_iter()
                    .filter(|h| ContentHash::from_hex(h).is_ok())
                    .map(move |h| format!("{parent}/{h}/{FEATURE_GOALS_DIR}"))
            })
            .collect();
        Ok(dirs.into_iter().collect())
    }

    /// Enumerate feature-goal artifacts and classify each one
    ///
    /// Unversioned and versioned locations are both enumerated. Read-only.
    /// Fails only when listing or an existence check fails.
    ///
    /// # Errors
    /// [`crate::MigrationError::Storage`] on object store failure
    pub async fn plan(&self, process_map: &ProcessMap) -> MigrationResult<MigrationPlan> {
        let mut dirs = Self::feature_goal_dirs();
        dirs.extend(self.versioned_feature_goal_dirs().await?);
        let listings =
            try_join_all(dirs.iter().map(|dir| self.store.list(dir, None))).await?;

        let links = process_map.links();
        let canonical_keys: BTreeSet<String> = links
            .iter()
            .map(hierarchical_key)
            .collect();

        let mut plan = MigrationPlan::default();
        let mut pending = Vec::new();

        for entry in listings.into_iter().flatten() {
            let parsed = match ArtifactPath::parse(&entry.path) {
                Ok(parsed) if parsed.is_feature_goal() => parsed,
                _ => {
                    tracing::warn!(path = %entry.path, "skipping unrecognized artifact path");
                    continue;
                }
            };
            let file_base = parsed.file_stem().to_string();

            let matches: Vec<SubprocessLink> = links
                .iter()
                .filter(|link| link.matches_legacy_name(&file_base))
                .cloned()
                .collect();

            let blocked = |reason| MigrationCandidate {
                source: entry.path.clone(),
                bucket: parsed.bucket,
                file_base: file_base.clone(),
                classification: Classification::Blocked { reason },
            };

            if matches.len() > 1 {
                plan.candidates
                    .push(blocked(BlockReason::Ambiguous { candidates: matches }));
            } else if let Some(link) = matches.into_iter().next() {
                let target = parsed.with_key(hierarchical_key(&link)).to_path();
                if target == entry.path {
                    plan.candidates
                        .push(blocked(BlockReason::TargetExists { target }));
                } else {
                    pending.push(Pending {
                        source: entry.path.clone(),
                        bucket: parsed.bucket,
                        file_base: file_base.clone(),
                        target,
                        link,
                    });
                }
            } else if canonical_keys.contains(&parsed.key) {
                plan.already_canonical.push(entry.path.clone());
            } else {
                plan.candidates.push(blocked(BlockReason::NoMatch));
            }
        }

        let taken = try_join_all(pending.iter().map(|p| self.store.exists(&p.target))).await?;

        let mut claims: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for (p, _) in pending.iter().zip(&taken).filter(|(_, exists)| !**exists) {
            claims.entry(p.target.as_str()).or_default().push(p.source.clone());
        }
        let contested: BTreeMap<String, Vec<String>> = claims
            .into_iter()
            .filter(|(_, sources)| sources.len() > 1)
            .map(|(target, mut sources)| {
                sources.sort();
                (target.to_string(), sources)
            })
            .collect();

        for (p, exists) in pending.into_iter().zip(taken) {
            let classification = if exists {
                Classification::Blocked {
                    reason: BlockReason::TargetExists { target: p.target },
                }
            } else if let Some(sources) = contested.get(&p.target) {
                tracing::warn!(
                    from = %p.source,
                    to = %p.target,
                    claimants = sources.len(),
                    "target claimed by several sources"
                );
                Classification::Blocked {
                    reason: BlockReason::DuplicateTarget {
                        target: p.target,
                        sources: sources.clone(),
                    },
                }
            } else {
                Classification::Migratable {
                    target: p.target,
                    link: p.link,
                }
            };
            plan.candidates.push(MigrationCandidate {
                source: p.source,
                bucket: p.bucket,
                file_base: p.file_base,
                classification,
            });
        }

        plan.candidates.sort_by(|a, b| a.source.cmp(&b.source));
        plan.already_canonical.sort();

        let summary = plan.summary();
        tracing::info!(
            total = summary.total,
            migratable = summary.migratable,
            no_match = summary.no_match,
            target_exists = summary.target_exists,
            ambiguous = summary.ambiguous,
            duplicate_target = summary.duplicate_target,
            "migration plan ready"
        );
        Ok(plan)
    }
}

fn hierarchical_key(link: &SubprocessLink) -> String {
    feature_goal_doc_key(
        &link.subprocess_file,
        &link.element_id,
        &NamingScheme::hierarchical(link.parent_file.clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerates_every_doc_bucket() {
        assert_eq!(
            MigrationPlanner::feature_goal_dirs(),
            vec![
                "docs/feature-goals",
                "docs/local/feature-goals",
                "docs/slow/feature-goals",
                "docs/slow/chatgpt/feature-goals",
                "docs/slow/ollama/feature-goals",
            ]
        );
    }

    #[test]
    fn block_reason_messages() {
        assert_eq!(BlockReason::NoMatch.to_string(), "no match in process map");
        let link = SubprocessLink {
            parent_file: "a.bpmn".into(),
            element_id: "x".into(),
            subprocess_file: "s.bpmn".into(),
        };
        let other_parent = SubprocessLink {
            parent_file: "b.bpmn".into(),
            ..link.clone()
        };
        let reason = BlockReason::Ambiguous {
            candidates: vec![link.clone(), other_parent],
        };
        assert_eq!(reason.to_string(), "ambiguous: 2 candidate parents");

        let same_parent = SubprocessLink {
            element_id: "y".into(),
            ..link.clone()
        };
        let reason = BlockReason::Ambiguous {
            candidates: vec![link, same_parent],
        };
        assert_eq!(
            reason.to_string(),
            "ambiguous: 2 candidate call activities in 1 parent file(s)"
        );

        let reason = BlockReason::DuplicateTarget {
            target: "docs/feature-goals/a-x.html".into(),
            sources: vec!["docs/feature-goals/s.html".into(), "docs/feature-goals/s-x.html".into()],
        };
        assert_eq!(
            reason.to_string(),
            "target claimed by 2 sources: docs/feature-goals/a-x.html"
        );
    }

    #[test]
    fn summary_counts() {
        let blocked = |reason| MigrationCandidate {
            source: "docs/feature-goals/x.html".into(),
            bucket: StorageBucket::Legacy,
            file_base: "x".into(),
            classification: Classification::Blocked { reason },
        };
        let plan = MigrationPlan {
            candidates: vec![
                blocked(BlockReason::NoMatch),
                blocked(BlockReason::NoMatch),
                blocked(BlockReason::TargetExists { target: "t".into() }),
            ],
            already_canonical: vec!["docs/feature-goals/a-b.html".into()],
        };
        let summary = plan.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.no_match, 2);
        assert_eq!(summary.target_exists, 1);
        assert_eq!(summary.migratable, 0);
        assert_eq!(summary.already_canonical, 1);
        assert_eq!(plan.blocked().count(), 3);
    }
}
