//! procdoc Artifact System
//!
//! Content hashing for versioned BPMN sources and deterministic storage keys
//! for the artifacts generated from them.
//!
//! # Core Concepts
//!
//! - [`ContentHasher`]: whitespace-normalizing SHA-256 of file content
//! - [`ContentHash`]: 32-byte digest, rendered as 64 lowercase hex chars
//! - [`NamingScheme`]: flat (legacy) vs. parent-qualified feature-goal names
//! - [`ArtifactRequest`]: inputs that determine where one artifact lives
//! - [`ArtifactLocations`]: canonical and legacy candidates in lookup order
//! - [`ArtifactPath`]: a stored path split back into bucket, version and key
//!
//! # Example
//!
//! ```rust
//! use procdoc_artifact::{doc_storage_path, node_doc_key, GenerationMode, Provider};
//!
//! let key = node_doc_key("mortgage-se-household.bpmn", "Task_1");
//! let paths = doc_storage_path(&key, Some(GenerationMode::Slow), Some(Provider::Cloud));
//! assert_eq!(paths.mode_path, "docs/slow/chatgpt/nodes/mortgage-se-household/Task_1.html");
//! assert_eq!(paths.legacy_path, "docs/nodes/mortgage-se-household/Task_1.html");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod hash;
mod naming;
mod path;
mod request;

pub use hash::{ContentHash, ContentHasher, HashError};
pub use naming::{ArtifactKind, GenerationMode, NamingScheme, Namespace, Provider, StorageBucket};
pub use path::{
    base_name, doc_storage_path, feature_goal_doc_key, node_doc_key, node_test_key,
    sanitize_element_id, test_storage_path, versioned_storage_path, ArtifactPath, PathError,
    StoragePaths, VersionSegment, FEATURE_GOALS_DIR, NODES_DIR,
};
pub use request::{ArtifactLocations, ArtifactRequest, VersionHandle};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn hash_and_path_integration() {
        let content = "<definitions>\n  <process id=\"household\"/>\n</definitions>";
        let version = VersionHandle {
            file_name: "mortgage-se-household.bpmn".to_string(),
            content_hash: ContentHasher::hash(content),
            version_number: 3,
        };

        let request = ArtifactRequest::node_doc("mortgage-se-household.bpmn", "Task 1")
            .with_mode(GenerationMode::Slow)
            .with_version(version.clone());
        let written = request.locations().write_path().to_string();

        let parsed = ArtifactPath::parse(&written).unwrap();
        assert_eq!(parsed.bucket, StorageBucket::Slow);
        assert_eq!(parsed.key, "nodes/mortgage-se-household/Task-1.html");
        assert_eq!(
            parsed.version.map(|v| v.hash),
            Some(version.content_hash)
        );
    }
}
