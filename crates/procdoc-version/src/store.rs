//! Version history on top of a [`MetadataStore`]

use crate::error::{MetadataError, VersionError, VersionResult};
use crate::memory::MemoryMetadataStore;
use crate::metadata::MetadataStore;
use crate::model::{FileVersion, NewVersion, Upload};
use chrono::Utc;
use dashmap::DashMap;
use procdoc_artifact::ContentHash;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Append-only, content-addressed version history per file name
///
/// Mutations of one file are serialized through a per-file lock; different
/// files proceed in parallel. Reads take no lock.
pub struct VersionStore {
    metadata: Arc<dyn MetadataStore>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for VersionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionStore")
            .field("locked_files", &self.locks.len())
            .finish_non_exhaustive()
    }
}

impl VersionStore {
    /// Create store over a metadata backend
    #[inline]
    #[must_use]
    pub fn new(metadata: Arc<dyn MetadataStore>) -> Self {
        Self {
            metadata,
            locks: DashMap::new(),
        }
    }

    /// Create store over a fresh [`MemoryMetadataStore`]
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryMetadataStore::new()))
    }

    /// Underlying metadata backend
    #[must_use]
    pub fn metadata(&self) -> &Arc<dyn MetadataStore> {
        &self.metadata
    }

    /// Hash of the current version, if any
    ///
    /// # Errors
    /// Backend failure, or more than one current row
    pub async fn current_version_hash(&self, file_name: &str) -> VersionResult<Option<ContentHash>> {
        Ok(self
            .current_version(file_name)
            .await?
            .map(|v| v.content_hash))
    }

    /// The current version, if any
    ///
    /// `None` is also returned inside the window of a two-phase swap.
    ///
    /// # Errors
    /// Backend failure, or more than one current row
    pub async fn current_version(&self, file_name: &str) -> VersionResult<Option<FileVersion>> {
        let rows = self.metadata.select_current(file_name).await?;
        at_most_one(file_name, rows, "current")
    }

    /// The version with `hash`, if recorded
    ///
    /// # Errors
    /// Backend failure, or duplicate rows for the hash
    pub async fn version_by_hash(
        &self,
        file_name: &str,
        hash: &ContentHash,
    ) -> VersionResult<Option<FileVersion>> {
        let rows = self.metadata.select_by_hash(file_name, hash).await?;
        at_most_one(file_name, rows, "with this hash")
    }

    /// Every version, newest version number first
    ///
    /// # Errors
    /// Backend failure, or a history with duplicate/missing version numbers
    /// or several current rows
    pub async fn all_versions(&self, file_name: &str) -> VersionResult<Vec<FileVersion>> {
        let mut rows = self.metadata.select_all(file_name).await?;
        rows.sort_by(|a, b| b.version_number.cmp(&a.version_number));

        let current = rows.iter().filter(|r| r.is_current).count();
        if current > 1 {
            return Err(violation(file_name, format!("{current} current rows")));
        }

        // Descending and gap-free means row i holds version len - i
        let len = rows.len();
        for (i, row) in rows.iter().enumerate() {
            let expected = len - i;
            if usize::try_from(row.version_number).ok() != Some(expected) {
                return Err(violation(
                    file_name,
                    format!(
                        "version numbers are not 1..={len} without gaps (found {} at position {i})",
                        row.version_number
                    ),
                ));
            }
        }

        Ok(rows)
    }

    /// The version numbered one below the current version
    ///
    /// Returns `None` without a lookup when there is no current version or
    /// the current version is 1.
    ///
    /// # Errors
    /// Backend failure, or duplicate rows
    pub async fn previous_version(&self, file_name: &str) -> VersionResult<Option<FileVersion>> {
        let Some(current) = self.current_version(file_name).await? else {
            return Ok(None);
        };
        if current.version_number <= 1 {
            return Ok(None);
        }
        let rows = self
            .metadata
            .select_by_number(file_name, current.version_number - 1)
            .await?;
        at_most_one(file_name, rows, "with the previous version number")
    }

    /// Record an upload
    ///
    /// Content that normalizes to an existing version of the same file returns
    /// that version with `is_new = false` and changes nothing. Otherwise a new
    /// version numbered one past the highest recorded number becomes current.
    ///
    /// # Errors
    /// Backend failure, or duplicate rows for the content hash
    pub async fn create_or_get_version(&self, upload: Upload) -> VersionResult<(FileVersion, bool)> {
        let hash = upload.content_hash();
        let file_name = upload.file_name.clone();

        if let Some(existing) = self.version_by_hash(&file_name, &hash).await? {
            tracing::debug!(
                file = %file_name,
                version = existing.version_number,
                hash = %hash.short(),
                "upload matches existing version"
            );
            return Ok((existing, false));
        }

        let lock = self.file_lock(&file_name);
        let _guard = lock.lock().await;

        // Another upload of the same content may have won the lock first
        if let Some(existing) = self.version_by_hash(&file_name, &hash).await? {
            tracing::debug!(file = %file_name, hash = %hash.short(), "upload deduplicated after lock");
            return Ok((existing, false));
        }

        let next = self
            .metadata
            .max_version_number(&file_name)
            .await?
            .unwrap_or(0)
            + 1;

        let new_version = NewVersion {
            file_name: upload.file_name,
            content_hash: hash,
            version_number: next,
            content: upload.content,
            metadata: upload.metadata,
            uploaded_at: Utc::now(),
            uploaded_by: upload.uploaded_by,
            change_summary: upload.change_summary,
        };

        match self.metadata.insert_current(new_version).await {
            Ok(inserted) => {
                tracing::info!(
                    file = %file_name,
                    version = inserted.version_number,
                    hash = %hash.short(),
                    "created version"
                );
                Ok((inserted, true))
            }
            // A writer outside this process recorded the same content
            Err(MetadataError::Conflict { detail, .. }) => {
                match self.version_by_hash(&file_name, &hash).await? {
                    Some(existing) => Ok((existing, false)),
                    None => Err(MetadataError::conflict(&file_name, detail).into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Make the version with `hash` the file's only current version
    ///
    /// Returns `None` and changes nothing if no version has that hash.
    ///
    /// # Errors
    /// Backend failure, or the swap left the store without the requested
    /// current row
    pub async fn set_version_as_current(
        &self,
        file_name: &str,
        hash: &ContentHash,
    ) -> VersionResult<Option<FileVersion>> {
        let lock = self.file_lock(file_name);
        let _guard = lock.lock().await;

        let Some(target) = self.version_by_hash(file_name, hash).await? else {
            tracing::debug!(file = %file_name, hash = %hash.short(), "no version to make current");
            return Ok(None);
        };

        self.metadata.swap_current(file_name, hash).await?;

        match self.current_version(file_name).await? {
            Some(current) if current.content_hash == *hash => {
                tracing::info!(
                    file = %file_name,
                    version = current.version_number,
                    hash = %hash.short(),
                    "set current version"
                );
                Ok(Some(current))
            }
            _ => Err(violation(
                file_name,
                format!("version {} is not current after swap", target.version_number),
            )),
        }
    }

    fn file_lock(&self, file_name: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(file_name.to_string())
            .or_default()
            .clone()
    }
}

fn violation(file_name: &str, detail: String) -> VersionError {
    tracing::error!(file = %file_name, %detail, "version invariant violated");
    VersionError::invariant(file_name, detail)
}

fn at_most_one(
    file_name: &str,
    mut rows: Vec<FileVersion>,
    what: &str,
) -> VersionResult<Option<FileVersion>> {
    match rows.len() {
        0 => Ok(None),
        1 => Ok(rows.pop()),
        n => Err(violation(file_name, format!("{n} rows {what}"))),
    }
}
