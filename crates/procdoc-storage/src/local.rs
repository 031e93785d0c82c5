//! Local filesystem object store
//!
//! Objects are plain files under a root directory, laid out exactly as their
//! store paths:
//! ```text
//! {root}/
//!   docs/
//!     slow/chatgpt/feature-goals/{parent}-{element}.html
//!     nodes/{file}/{element}.html
//! ```

use crate::error::{validate_path, StorageError, StorageResult};
use crate::object::{ObjectEntry, ObjectStore};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Object store rooted at a local directory
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create store rooted at `root`; the directory is created lazily
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, path: &str) -> StorageResult<PathBuf> {
        let path = validate_path(path)?;
        Ok(path.split('/').fold(self.root.clone(), |acc, seg| acc.join(seg)))
    }

    async fn ensure_parent(path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
        overwrite: bool,
    ) -> StorageResult<()> {
        let target = self.object_path(path)?;
        Self::ensure_parent(&target).await?;

        if overwrite {
            fs::write(&target, &bytes).await?;
            return Ok(());
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => StorageError::AlreadyExists(path.to_string()),
                _ => StorageError::Io(e),
            })?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        Ok(())
    }

    async fn download(&self, path: &str) -> StorageResult<Option<Vec<u8>>> {
        let target = self.object_path(path)?;
        match fs::read(&target).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn list(&self, directory: &str, prefix: Option<&str>) -> StorageResult<Vec<ObjectEntry>> {
        let dir = self.object_path(directory)?;
        let directory = validate_path(directory)?;

        let mut reader = match fs::read_dir(&dir).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::Io(e)),
        };

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                tracing::warn!(dir = %dir.display(), "skipping non UTF-8 file name");
                continue;
            };
            if prefix.map_or(true, |p| name.starts_with(p)) {
                entries.push(ObjectEntry::new(directory, name, meta.len()));
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn list_dirs(&self, directory: &str) -> StorageResult<Vec<String>> {
        let dir = self.object_path(directory)?;

        let mut reader = match fs::read_dir(&dir).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::Io(e)),
        };

        let mut dirs = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => dirs.push(name),
                Err(_) => tracing::warn!(dir = %dir.display(), "skipping non UTF-8 directory name"),
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    async fn delete(&self, path: &str) -> StorageResult<bool> {
        let target = self.object_path(path)?;
        match fs::remove_file(&target).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let target = self.object_path(path)?;
        match fs::metadata(&target).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
