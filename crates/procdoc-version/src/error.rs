//! Error types for the version store
//!
//! Two classes only:
//! - backend failures from the metadata store ([`MetadataError`])
//! - invariant violations detected while reading rows back
//!
//! "No such row" is never an error here; lookups return `Option`.

/// Errors raised by a [`crate::MetadataStore`] backend
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// SQL backend failure (connectivity, permission, I/O)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Unique constraint on `(file_name, content_hash)` or
    /// `(file_name, version_number)` rejected a write
    #[error("conflicting row for {file_name}: {detail}")]
    Conflict { file_name: String, detail: String },

    /// Stored row could not be decoded
    #[error("corrupt row for {file_name}: {detail}")]
    Corrupt { file_name: String, detail: String },

    /// Metadata JSON (de)serialization failed
    #[error("metadata serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other backend failure
    #[error("backend error: {0}")]
    Backend(String),
}

impl MetadataError {
    /// Create conflict error
    pub fn conflict(file_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Conflict {
            file_name: file_name.into(),
            detail: detail.into(),
        }
    }

    /// Create corrupt-row error
    pub fn corrupt(file_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Corrupt {
            file_name: file_name.into(),
            detail: detail.into(),
        }
    }
}

/// Result type alias for metadata store operations
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors raised by [`crate::VersionStore`]
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    /// Backend failure, propagated unchanged
    #[error("metadata store error: {0}")]
    Metadata(#[from] MetadataError),

    /// The metadata store holds rows that break the version invariants
    #[error("invariant violated for {file_name}: {detail}")]
    InvariantViolation { file_name: String, detail: String },
}

impl VersionError {
    /// Create invariant violation error
    pub fn invariant(file_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            file_name: file_name.into(),
            detail: detail.into(),
        }
    }

    /// Check if error indicates corrupted metadata
    #[inline]
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::InvariantViolation { .. } | Self::Metadata(MetadataError::Corrupt { .. })
        )
    }

    /// Check if error is a backend failure the caller may retry
    #[inline]
    #[must_use]
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            Self::Metadata(
                MetadataError::Sqlx(_) | MetadataError::Backend(_) | MetadataError::Conflict { .. }
            )
        )
    }
}

/// Result type alias for version store operations
pub type VersionResult<T> = Result<T, VersionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariant_error_display() {
        let err = VersionError::invariant("a.bpmn", "2 current rows");
        assert_eq!(err.to_string(), "invariant violated for a.bpmn: 2 current rows");
        assert!(err.is_invariant_violation());
        assert!(!err.is_backend());
    }

    #[test]
    fn backend_error_classification() {
        let err: VersionError = MetadataError::Backend("connection reset".to_string()).into();
        assert!(err.is_backend());
        assert!(!err.is_invariant_violation());
    }

    #[test]
    fn corrupt_row_is_invariant_violation() {
        let err: VersionError = MetadataError::corrupt("a.bpmn", "bad hash").into();
        assert!(err.is_invariant_violation());
    }
}
