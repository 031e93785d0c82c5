//! Migration errors
//!
//! Only backend and input failures are errors. Unmatched or ambiguous
//! artifacts are plan data, see [`crate::BlockReason`].

use procdoc_storage::StorageError;
use std::path::PathBuf;

/// Errors raised while loading a process map or planning a migration
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Object store failure during enumeration or existence checks
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Process map file could not be read
    #[error("failed to read process map {path}: {source}")]
    ProcessMapIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Process map JSON is malformed
    #[error("invalid process map JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Process map YAML is malformed
    #[error("invalid process map YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Process map file extension is neither JSON nor YAML
    #[error("unsupported process map format: {0}")]
    UnsupportedFormat(String),

    /// Process map content is well-formed but unusable
    #[error("invalid process map: {0}")]
    InvalidProcessMap(String),
}

impl MigrationError {
    /// Check if error came from the object store
    #[inline]
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

/// Result type alias for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;
