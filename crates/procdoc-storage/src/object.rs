//! Object store collaborator interface

use crate::error::StorageResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One object returned by [`ObjectStore::list`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// File name within the listed directory
    pub name: String,
    /// Full store-relative path
    pub path: String,
    /// Size in bytes
    pub size: u64,
}

impl ObjectEntry {
    /// Entry for `name` under `directory`
    #[must_use]
    pub fn new(directory: &str, name: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        let directory = directory.trim_end_matches('/');
        Self {
            path: format!("{directory}/{name}"),
            name,
            size,
        }
    }
}

/// Blob storage addressed by slash-separated relative paths
///
/// Not-found is never an error: `download` yields `None`, `exists` and
/// `delete` yield `false`, `list` and `list_dirs` yield an empty `Vec`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `path`
    ///
    /// # Errors
    /// [`crate::StorageError::AlreadyExists`] if `overwrite` is false and
    /// the path is taken; backend failures otherwise
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        overwrite: bool,
    ) -> StorageResult<()>;

    /// Content at `path`, if present
    async fn download(&self, path: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Objects directly inside `directory` whose name starts with `prefix`,
    /// sorted by name
    async fn list(&self, directory: &str, prefix: Option<&str>) -> StorageResult<Vec<ObjectEntry>>;

    /// Names of the subdirectories directly inside `directory`, sorted
    async fn list_dirs(&self, directory: &str) -> StorageResult<Vec<String>>;

    /// Remove `path`; returns whether an object was removed
    async fn delete(&self, path: &str) -> StorageResult<bool>;

    /// Whether an object exists at `path`
    async fn exists(&self, path: &str) -> StorageResult<bool> {
        Ok(self.download(path).await?.is_some())
    }
}

/// MIME type for a generated artifact, by extension
#[must_use]
pub fn content_type_for(path: &str) -> &'static str {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("html") => "text/html; charset=utf-8",
        Some("spec" | "ts") => "text/plain; charset=utf-8",
        Some("json") => "application/json",
        Some("bpmn" | "xml") => "application/xml",
        _ => "application/octet-stream",
    }
}
