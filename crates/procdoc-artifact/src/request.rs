//! Artifact requests: everything that determines where one artifact lives

use crate::hash::ContentHash;
use crate::naming::{ArtifactKind, GenerationMode, NamingScheme, Provider, StorageBucket};
use crate::path::{
    doc_storage_path, feature_goal_doc_key, node_doc_key, node_test_key, test_storage_path,
    versioned_storage_path, StoragePaths,
};
use serde::{Deserialize, Serialize};

/// Identifies one stored version of a file
///
/// Produced by the version store, consumed by path resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionHandle {
    /// Logical file name
    pub file_name: String,
    /// Hash of the normalized content
    pub content_hash: ContentHash,
    /// 1-based version number
    pub version_number: u32,
}

/// Inputs for locating one generated artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRequest {
    /// File the artifact's content describes
    pub subject_file: String,
    /// Element id, unsanitized
    pub element_id: String,
    /// Artifact kind
    pub kind: ArtifactKind,
    /// Generation mode, if known
    pub mode: Option<GenerationMode>,
    /// Provider, only meaningful for slow mode
    pub provider: Option<Provider>,
    /// Naming scheme (feature goals only)
    pub scheme: NamingScheme,
    /// Version of `subject_file`, enables the versioned path
    pub version: Option<VersionHandle>,
}

impl ArtifactRequest {
    fn new(kind: ArtifactKind, subject_file: impl Into<String>, element_id: impl Into<String>) -> Self {
        Self {
            subject_file: subject_file.into(),
            element_id: element_id.into(),
            kind,
            mode: None,
            provider: None,
            scheme: NamingScheme::Flat,
            version: None,
        }
    }

    /// Documentation for a single node
    #[must_use]
    pub fn node_doc(subject_file: impl Into<String>, element_id: impl Into<String>) -> Self {
        Self::new(ArtifactKind::NodeDoc, subject_file, element_id)
    }

    /// Test spec for a single node
    #[must_use]
    pub fn node_test(subject_file: impl Into<String>, element_id: impl Into<String>) -> Self {
        Self::new(ArtifactKind::NodeTest, subject_file, element_id)
    }

    /// Feature-goal documentation under an explicit naming scheme
    #[must_use]
    pub fn feature_goal(
        subject_file: impl Into<String>,
        element_id: impl Into<String>,
        scheme: NamingScheme,
    ) -> Self {
        Self {
            scheme,
            ..Self::new(ArtifactKind::FeatureGoalDoc, subject_file, element_id)
        }
    }

    /// With generation mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// With provider
    #[inline]
    #[must_use]
    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// With subject version
    #[inline]
    #[must_use]
    pub fn with_version(mut self, version: VersionHandle) -> Self {
        self.version = Some(version);
        self
    }

    /// Artifact key relative to the bucket
    #[must_use]
    pub fn key(&self) -> String {
        match self.kind {
            ArtifactKind::NodeDoc => node_doc_key(&self.subject_file, &self.element_id),
            ArtifactKind::NodeTest => node_test_key(&self.subject_file, &self.element_id),
            ArtifactKind::FeatureGoalDoc => {
                feature_goal_doc_key(&self.subject_file, &self.element_id, &self.scheme)
            }
        }
    }

    /// Bucket selected by mode and provider
    #[must_use]
    pub fn bucket(&self) -> StorageBucket {
        match self.kind {
            ArtifactKind::NodeTest => StorageBucket::for_test(self.mode),
            ArtifactKind::NodeDoc | ArtifactKind::FeatureGoalDoc => {
                StorageBucket::for_doc(self.mode, self.provider)
            }
        }
    }

    /// All candidate locations for this artifact
    #[must_use]
    pub fn locations(&self) -> ArtifactLocations {
        let key = self.key();
        let paths = match self.kind {
            ArtifactKind::NodeTest => test_storage_path(&key, self.mode),
            ArtifactKind::NodeDoc | ArtifactKind::FeatureGoalDoc => {
                doc_storage_path(&key, self.mode, self.provider)
            }
        };
        let versioned_path = self.version.as_ref().map(|v| {
            versioned_storage_path(
                self.kind.namespace(),
                self.bucket(),
                &self.subject_file,
                &v.content_hash,
                &key,
            )
        });
        ArtifactLocations {
            key,
            versioned_path,
            paths,
        }
    }
}

/// Candidate storage locations in lookup priority order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactLocations {
    /// Artifact key
    pub key: String,
    /// Versioned location, when the subject version is known
    pub versioned_path: Option<String>,
    /// Mode and legacy locations
    pub paths: StoragePaths,
}

impl ArtifactLocations {
    /// Versioned, then mode, then legacy; duplicates removed
    #[must_use]
    pub fn candidates(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::with_capacity(3);
        let ordered = self
            .versioned_path
            .as_deref()
            .into_iter()
            .chain([self.paths.mode_path.as_str(), self.paths.legacy_path.as_str()]);
        for path in ordered {
            if !out.contains(&path) {
                out.push(path);
            }
        }
        out
    }

    /// Where new content should be written
    #[must_use]
    pub fn write_path(&self) -> &str {
        self.versioned_path
            .as_deref()
            .unwrap_or(&self.paths.mode_path)
    }
}
