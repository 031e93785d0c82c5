//! Version rows

use chrono::{DateTime, Utc};
use procdoc_artifact::{ContentHash, ContentHasher, VersionHandle};
use serde::{Deserialize, Serialize};

/// One immutable snapshot of a named file's content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileVersion {
    /// Logical name, stable across versions
    pub file_name: String,
    /// Hash of the normalized content
    pub content_hash: ContentHash,
    /// 1-based, gap-free per file
    pub version_number: u32,
    /// Raw uploaded text
    pub content: String,
    /// Caller-supplied metadata, stored opaquely
    pub metadata: serde_json::Value,
    /// Upload time
    pub uploaded_at: DateTime<Utc>,
    /// Uploader, if known
    pub uploaded_by: Option<String>,
    /// Whether this is the file's current version
    pub is_current: bool,
    /// Free-text description of the change
    pub change_summary: Option<String>,
}

impl FileVersion {
    /// Lightweight handle used for artifact path resolution
    #[must_use]
    pub fn handle(&self) -> VersionHandle {
        VersionHandle {
            file_name: self.file_name.clone(),
            content_hash: self.content_hash,
            version_number: self.version_number,
        }
    }
}

/// A row about to be inserted as the file's current version
#[derive(Debug, Clone, PartialEq)]
pub struct NewVersion {
    pub file_name: String,
    pub content_hash: ContentHash,
    pub version_number: u32,
    pub content: String,
    pub metadata: serde_json::Value,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: Option<String>,
    pub change_summary: Option<String>,
}

impl NewVersion {
    /// Row as it reads back after insertion
    #[must_use]
    pub fn into_current(self) -> FileVersion {
        FileVersion {
            file_name: self.file_name,
            content_hash: self.content_hash,
            version_number: self.version_number,
            content: self.content,
            metadata: self.metadata,
            uploaded_at: self.uploaded_at,
            uploaded_by: self.uploaded_by,
            is_current: true,
            change_summary: self.change_summary,
        }
    }
}

/// Upload input for [`crate::VersionStore::create_or_get_version`]
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    /// Logical file name
    pub file_name: String,
    /// Raw content
    pub content: String,
    /// Opaque metadata
    pub metadata: serde_json::Value,
    /// Uploader
    pub uploaded_by: Option<String>,
    /// Change description
    pub change_summary: Option<String>,
}

impl Upload {
    /// Upload with empty metadata
    #[must_use]
    pub fn new(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
            metadata: serde_json::Value::Object(serde_json::Map::new()),
            uploaded_by: None,
            change_summary: None,
        }
    }

    /// With metadata
    #[inline]
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// With uploader
    #[inline]
    #[must_use]
    pub fn uploaded_by(mut self, user: impl Into<String>) -> Self {
        self.uploaded_by = Some(user.into());
        self
    }

    /// With change summary
    #[inline]
    #[must_use]
    pub fn with_change_summary(mut self, summary: impl Into<String>) -> Self {
        self.change_summary = Some(summary.into());
        self
    }

    /// Hash of the normalized content
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        ContentHasher::hash(&self.content)
    }
}
