//! Artifact keys and storage paths
//!
//! Every function here is a pure function of its arguments: no I/O, no global
//! state. Callers decide which of the returned candidates is authoritative by
//! probing storage (see `procdoc-storage`).
//!
//! # Layout
//!
//! ```text
//! docs/
//! ├── nodes/{file}/{element}.html                 legacy (flat, version-agnostic)
//! ├── feature-goals/{file}-{element}.html         legacy
//! ├── local/{key}                                 local mode, or fallback provider
//! ├── slow/{key}                                  LLM output without provider metadata
//! ├── slow/chatgpt/{key}                          cloud provider
//! ├── slow/ollama/{key}                           local provider
//! └── {bucket}/{file}/{version-hash}/{key}        versioned
//! tests/
//! ├── nodes/{file}/{element}.spec                 legacy
//! ├── local/{key}
//! └── slow/{key}
//! ```

use crate::hash::ContentHash;
use crate::naming::{GenerationMode, NamingScheme, Namespace, Provider, StorageBucket};
use serde::{Deserialize, Serialize};

/// Key directory for per-node artifacts
pub const NODES_DIR: &str = "nodes";

/// Key directory for feature-goal (call activity) documentation
pub const FEATURE_GOALS_DIR: &str = "feature-goals";

/// Replace every character outside `[A-Za-z0-9_-]` with `-`
#[must_use]
pub fn sanitize_element_id(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// File name without directory components and without its final extension
///
/// `"processes/mortgage-se-household.bpmn"` → `"mortgage-se-household"`
#[must_use]
pub fn base_name(file: &str) -> &str {
    let name = file.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(file);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// `nodes/{base}/{element}.html`
#[must_use]
pub fn node_doc_key(bpmn_file: &str, element_id: &str) -> String {
    format!(
        "{NODES_DIR}/{}/{}.html",
        base_name(bpmn_file),
        sanitize_element_id(element_id)
    )
}

/// `nodes/{base}/{element}.spec`
#[must_use]
pub fn node_test_key(bpmn_file: &str, element_id: &str) -> String {
    format!(
        "{NODES_DIR}/{}/{}.spec",
        base_name(bpmn_file),
        sanitize_element_id(element_id)
    )
}

/// Feature-goal documentation key
///
/// - [`NamingScheme::Flat`]: `feature-goals/{base(bpmn_file)}-{element}.html`
/// - [`NamingScheme::Hierarchical`]: `feature-goals/{base(parent)}-{element}.html`
///
/// The flat form exists for reading artifacts written before parents were
/// known. New writes must use the hierarchical form once a parent is known.
#[must_use]
pub fn feature_goal_doc_key(bpmn_file: &str, element_id: &str, scheme: &NamingScheme) -> String {
    let owner = match scheme {
        NamingScheme::Flat => bpmn_file,
        NamingScheme::Hierarchical(parent) => parent.as_str(),
    };
    format!(
        "{FEATURE_GOALS_DIR}/{}-{}.html",
        base_name(owner),
        sanitize_element_id(element_id)
    )
}

/// Canonical and legacy locations for one artifact key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoragePaths {
    /// Location for the requested mode/provider (canonical for writes)
    pub mode_path: String,
    /// Pre-versioning location, kept for backward-compatible reads
    pub legacy_path: String,
}

impl StoragePaths {
    fn in_bucket(namespace: Namespace, bucket: StorageBucket, key: &str) -> Self {
        let root = namespace.root();
        Self {
            mode_path: format!("{}{key}", bucket.prefix(root)),
            legacy_path: format!("{root}/{key}"),
        }
    }
}

/// Storage paths for a documentation key
#[must_use]
pub fn doc_storage_path(
    doc_key: &str,
    mode: Option<GenerationMode>,
    provider: Option<Provider>,
) -> StoragePaths {
    StoragePaths::in_bucket(Namespace::Docs, StorageBucket::for_doc(mode, provider), doc_key)
}

/// Storage paths for a test key (`tests/local/`, `tests/slow/`, legacy `tests/`)
#[must_use]
pub fn test_storage_path(test_key: &str, mode: Option<GenerationMode>) -> StoragePaths {
    StoragePaths::in_bucket(Namespace::Tests, StorageBucket::for_test(mode), test_key)
}

/// `{root}/{bucket}/{base(subject)}/{hash}/{key}`
#[must_use]
pub fn versioned_storage_path(
    namespace: Namespace,
    bucket: StorageBucket,
    subject_file: &str,
    version_hash: &ContentHash,
    key: &str,
) -> String {
    format!(
        "{}{}/{version_hash}/{key}",
        bucket.prefix(namespace.root()),
        base_name(subject_file)
    )
}

/// Version directory inside a versioned path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionSegment {
    /// Base name of the subject file
    pub file_base: String,
    /// Version hash of the subject file
    pub hash: ContentHash,
}

/// A stored artifact path split into its components
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactPath {
    /// `docs` or `tests`
    pub namespace: Namespace,
    /// Mode/provider bucket
    pub bucket: StorageBucket,
    /// Present for versioned paths
    pub version: Option<VersionSegment>,
    /// Artifact key, e.g. `feature-goals/a-b.html`
    pub key: String,
}

impl ArtifactPath {
    /// Split a stored path back into namespace, bucket, version and key
    ///
    /// # Errors
    /// Returns error if the path is outside `docs/`/`tests/` or the remainder
    /// is not a recognizable key
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let trimmed = path.trim_start_matches('/');
        let (namespace, rest, buckets): (_, _, &[StorageBucket]) =
            if let Some(rest) = trimmed.strip_prefix("docs/") {
                (Namespace::Docs, rest, &DOC_PARSE_ORDER[..])
            } else if let Some(rest) = trimmed.strip_prefix("tests/") {
                (Namespace::Tests, rest, &TEST_PARSE_ORDER[..])
            } else {
                return Err(PathError::UnknownNamespace(path.to_string()));
            };

        for bucket in buckets {
            let after = match bucket {
                StorageBucket::Legacy => Some(rest),
                other => rest
                    .strip_prefix(other.segment())
                    .and_then(|r| r.strip_prefix('/')),
            };
            let Some(after) = after else { continue };
            if let Some((version, key)) = split_version(after) {
                return Ok(Self {
                    namespace,
                    bucket: *bucket,
                    version,
                    key: key.to_string(),
                });
            }
        }

        Err(PathError::UnrecognizedLayout(path.to_string()))
    }

    /// Reassemble the full storage path
    #[must_use]
    pub fn to_path(&self) -> String {
        let prefix = self.bucket.prefix(self.namespace.root());
        match &self.version {
            Some(v) => format!("{prefix}{}/{}/{}", v.file_base, v.hash, self.key),
            None => format!("{prefix}{}", self.key),
        }
    }

    /// Same location with a different key
    #[must_use]
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..self.clone()
        }
    }

    /// Last key segment without its extension
    ///
    /// `feature-goals/mortgage-se-household.html` → `mortgage-se-household`
    #[must_use]
    pub fn file_stem(&self) -> &str {
        base_name(&self.key)
    }

    /// Whether the key is a feature-goal document
    #[must_use]
    pub fn is_feature_goal(&self) -> bool {
        self.key
            .strip_prefix(FEATURE_GOALS_DIR)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

// Longest segments first so `slow/chatgpt/` is not read as `slow/` + key.
const DOC_PARSE_ORDER: [StorageBucket; 5] = [
    StorageBucket::SlowCloud,
    StorageBucket::SlowLocal,
    StorageBucket::Slow,
    StorageBucket::Local,
    StorageBucket::Legacy,
];

const TEST_PARSE_ORDER: [StorageBucket; 3] = [
    StorageBucket::Slow,
    StorageBucket::Local,
    StorageBucket::Legacy,
];

fn is_key(s: &str) -> bool {
    [NODES_DIR, FEATURE_GOALS_DIR].iter().any(|dir| {
        s.strip_prefix(dir)
            .and_then(|r| r.strip_prefix('/'))
            .is_some_and(|r| !r.is_empty())
    })
}

fn split_version(after: &str) -> Option<(Option<VersionSegment>, &str)> {
    if is_key(after) {
        return Some((None, after));
    }
    let mut parts = after.splitn(3, '/');
    let file_base = parts.next()?;
    let hash = parts.next()?.parse::<ContentHash>().ok()?;
    let key = parts.next()?;
    if file_base.is_empty() || !is_key(key) {
        return None;
    }
    Some((
        Some(VersionSegment {
            file_base: file_base.to_string(),
            hash,
        }),
        key,
    ))
}

/// Errors related to artifact paths
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Path is not under `docs/` or `tests/`
    #[error("path '{0}' is outside the artifact namespaces")]
    UnknownNamespace(String),

    /// Path does not match any known bucket/version/key layout
    #[error("path '{0}' does not match a known artifact layout")]
    UnrecognizedLayout(String),
}
