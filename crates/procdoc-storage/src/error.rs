//! Object store errors
//!
//! Missing objects and empty listings are not errors; they surface as
//! `None`, `false` or an empty `Vec`.

/// Errors raised by an [`crate::ObjectStore`]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem or transport failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Upload without overwrite onto an existing object
    #[error("object already exists: {0}")]
    AlreadyExists(String),

    /// Path is empty, absolute, or escapes the store root
    #[error("invalid object path '{0}'")]
    InvalidPath(String),

    /// Any other backend failure
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Create backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Check if error means the target was already taken
    #[inline]
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

/// Result type alias for object store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Validate a store-relative path
///
/// # Errors
/// [`StorageError::InvalidPath`] for empty, absolute, or `..` paths
pub fn validate_path(path: &str) -> StorageResult<&str> {
    let trimmed = path.trim_end_matches('/');
    let bad = trimmed.is_empty()
        || trimmed.starts_with('/')
        || trimmed.contains('\\')
        || trimmed.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_relative_paths() {
        assert_eq!(validate_path("docs/nodes/a/b.html").unwrap(), "docs/nodes/a/b.html");
        assert_eq!(validate_path("docs/feature-goals/").unwrap(), "docs/feature-goals");
    }

    #[test]
    fn rejects_escaping_paths() {
        for bad in ["", "/etc/passwd", "docs/../secret", "docs//x", "./docs", "a\\b"] {
            assert!(
                matches!(validate_path(bad), Err(StorageError::InvalidPath(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn already_exists_classification() {
        assert!(StorageError::AlreadyExists("x".into()).is_already_exists());
        assert!(!StorageError::backend("down").is_already_exists());
    }
}
