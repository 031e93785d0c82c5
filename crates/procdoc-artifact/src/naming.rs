//! Generation mode, provider and naming scheme vocabulary
//!
//! These values are always passed explicitly by the caller. Nothing in this
//! crate reads a process-wide "current mode".

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// How an artifact's content was generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Template-based local generation
    Local,
    /// LLM-backed generation
    Slow,
}

impl GenerationMode {
    /// Parse a mode name; unrecognized names yield `None`
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Some(Self::Local),
            "slow" => Some(Self::Slow),
            _ => None,
        }
    }

    /// Wire name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Slow => "slow",
        }
    }
}

impl Display for GenerationMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// LLM provider behind a `slow` generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Hosted model (stored under `chatgpt/`)
    Cloud,
    /// Self-hosted model (stored under `ollama/`)
    Local,
    /// Generation fell back to templates; stored with local output
    Fallback,
}

impl Provider {
    /// Parse a provider name; unrecognized names yield `None`
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cloud" => Some(Self::Cloud),
            "local" => Some(Self::Local),
            "fallback" => Some(Self::Fallback),
            _ => None,
        }
    }

    /// Wire name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cloud => "cloud",
            Self::Local => "local",
            Self::Fallback => "fallback",
        }
    }
}

impl Display for Provider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which key scheme a feature-goal artifact is named under
///
/// `Flat` is the legacy, parent-less form and is only meant for reading
/// artifacts written before hierarchical naming existed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scheme", content = "parent_file", rename_all = "lowercase")]
pub enum NamingScheme {
    /// Legacy naming keyed by the subprocess file itself
    Flat,
    /// Parent-qualified naming; holds the parent BPMN file name
    Hierarchical(String),
}

impl NamingScheme {
    /// Hierarchical scheme under the given parent file
    #[must_use]
    pub fn hierarchical(parent_file: impl Into<String>) -> Self {
        Self::Hierarchical(parent_file.into())
    }

    /// Parent file, if hierarchical
    #[must_use]
    pub fn parent_file(&self) -> Option<&str> {
        match self {
            Self::Flat => None,
            Self::Hierarchical(parent) => Some(parent),
        }
    }
}

/// Kind of generated artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// Documentation page for a single BPMN node
    NodeDoc,
    /// Documentation page for a call activity / subprocess
    FeatureGoalDoc,
    /// Generated test spec for a node
    NodeTest,
}

impl ArtifactKind {
    /// Top-level namespace this kind is stored under
    #[must_use]
    pub const fn namespace(&self) -> Namespace {
        match self {
            Self::NodeDoc | Self::FeatureGoalDoc => Namespace::Docs,
            Self::NodeTest => Namespace::Tests,
        }
    }
}

/// Top-level storage namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// `docs/`
    Docs,
    /// `tests/`
    Tests,
}

impl Namespace {
    /// Root directory name
    #[must_use]
    pub const fn root(&self) -> &'static str {
        match self {
            Self::Docs => "docs",
            Self::Tests => "tests",
        }
    }
}

/// Mode/provider path segment under a namespace root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBucket {
    /// No segment: the pre-versioning location
    Legacy,
    /// `local/`
    Local,
    /// `slow/` (LLM output without provider metadata)
    Slow,
    /// `slow/chatgpt/`
    SlowCloud,
    /// `slow/ollama/`
    SlowLocal,
}

impl StorageBucket {
    /// Every bucket a documentation artifact can live in
    pub const DOC_BUCKETS: [Self; 5] = [
        Self::Legacy,
        Self::Local,
        Self::Slow,
        Self::SlowCloud,
        Self::SlowLocal,
    ];

    /// Every bucket a test artifact can live in
    pub const TEST_BUCKETS: [Self; 3] = [Self::Legacy, Self::Local, Self::Slow];

    /// Bucket for a documentation artifact
    #[must_use]
    pub fn for_doc(mode: Option<GenerationMode>, provider: Option<Provider>) -> Self {
        match (mode, provider) {
            (None, _) => Self::Legacy,
            (Some(GenerationMode::Local), _) | (Some(_), Some(Provider::Fallback)) => Self::Local,
            (Some(GenerationMode::Slow), Some(Provider::Cloud)) => Self::SlowCloud,
            (Some(GenerationMode::Slow), Some(Provider::Local)) => Self::SlowLocal,
            (Some(GenerationMode::Slow), None) => Self::Slow,
        }
    }

    /// Bucket for a test artifact (no provider split)
    #[must_use]
    pub fn for_test(mode: Option<GenerationMode>) -> Self {
        match mode {
            None => Self::Legacy,
            Some(GenerationMode::Local) => Self::Local,
            Some(GenerationMode::Slow) => Self::Slow,
        }
    }

    /// Path segment, empty for [`StorageBucket::Legacy`]
    #[must_use]
    pub const fn segment(&self) -> &'static str {
        match self {
            Self::Legacy => "",
            Self::Local => "local",
            Self::Slow => "slow",
            Self::SlowCloud => "slow/chatgpt",
            Self::SlowLocal => "slow/ollama",
        }
    }

    /// Directory prefix under `root`, with trailing slash
    #[must_use]
    pub fn prefix(&self, root: &str) -> String {
        match self {
            Self::Legacy => format!("{root}/"),
            other => format!("{root}/{}/", other.segment()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_and_provider_parse() {
        assert_eq!(GenerationMode::parse("SLOW"), Some(GenerationMode::Slow));
        assert_eq!(GenerationMode::parse("fast"), None);
        assert_eq!(Provider::parse(" cloud "), Some(Provider::Cloud));
        assert_eq!(Provider::parse("claude"), None);
    }

    #[test]
    fn doc_bucket_selection() {
        use GenerationMode::{Local, Slow};
        assert_eq!(StorageBucket::for_doc(None, None), StorageBucket::Legacy);
        assert_eq!(
            StorageBucket::for_doc(None, Some(Provider::Fallback)),
            StorageBucket::Legacy
        );
        assert_eq!(StorageBucket::for_doc(Some(Local), None), StorageBucket::Local);
        assert_eq!(
            StorageBucket::for_doc(Some(Slow), Some(Provider::Fallback)),
            StorageBucket::Local
        );
        assert_eq!(
            StorageBucket::for_doc(Some(Slow), Some(Provider::Cloud)),
            StorageBucket::SlowCloud
        );
        assert_eq!(
            StorageBucket::for_doc(Some(Slow), Some(Provider::Local)),
            StorageBucket::SlowLocal
        );
        assert_eq!(StorageBucket::for_doc(Some(Slow), None), StorageBucket::Slow);
    }

    #[test]
    fn bucket_prefixes() {
        assert_eq!(StorageBucket::Legacy.prefix("docs"), "docs/");
        assert_eq!(StorageBucket::SlowCloud.prefix("docs"), "docs/slow/chatgpt/");
        assert_eq!(StorageBucket::Slow.prefix("tests"), "tests/slow/");
    }

    #[test]
    fn naming_scheme_serde_shape() {
        let json = serde_json::to_value(NamingScheme::hierarchical("parent.bpmn")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"scheme": "hierarchical", "parent_file": "parent.bpmn"})
        );
        assert_eq!(NamingScheme::Flat.parent_file(), None);
    }
}
