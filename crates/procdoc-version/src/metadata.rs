//! Relational metadata collaborator interface
//!
//! Lookups return every matching row. Zero rows is an empty `Vec`, never an
//! error; more rows than expected is left for [`crate::VersionStore`] to
//! report as an invariant violation.

use crate::error::MetadataResult;
use crate::model::{FileVersion, NewVersion};
use async_trait::async_trait;
use procdoc_artifact::ContentHash;

/// Storage backend for version rows
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Rows of `file_name` with `is_current = true`
    async fn select_current(&self, file_name: &str) -> MetadataResult<Vec<FileVersion>>;

    /// Rows of `file_name` with the given content hash
    async fn select_by_hash(
        &self,
        file_name: &str,
        hash: &ContentHash,
    ) -> MetadataResult<Vec<FileVersion>>;

    /// Rows of `file_name` with the given version number
    async fn select_by_number(
        &self,
        file_name: &str,
        version_number: u32,
    ) -> MetadataResult<Vec<FileVersion>>;

    /// Every row of `file_name`, any order
    async fn select_all(&self, file_name: &str) -> MetadataResult<Vec<FileVersion>>;

    /// Highest version number recorded for `file_name`
    async fn max_version_number(&self, file_name: &str) -> MetadataResult<Option<u32>>;

    /// Insert `version` as current and clear the previous current row in one
    /// atomic step
    ///
    /// # Errors
    /// [`crate::MetadataError::Conflict`] if `(file_name, content_hash)` or
    /// `(file_name, version_number)` already exists
    async fn insert_current(&self, version: NewVersion) -> MetadataResult<FileVersion>;

    /// Clear `is_current` on every row of `file_name`; returns rows changed
    async fn clear_current(&self, file_name: &str) -> MetadataResult<u64>;

    /// Set `is_current` on the row with `hash`; returns rows changed
    async fn mark_current(&self, file_name: &str, hash: &ContentHash) -> MetadataResult<u64>;

    /// Make the row with `hash` the only current row
    ///
    /// The default runs [`Self::clear_current`] then [`Self::mark_current`].
    /// Between the two the file has no current version; if the second call
    /// fails the file stays without one until the swap is retried. Backends
    /// with transactions override this to close that window.
    async fn swap_current(&self, file_name: &str, hash: &ContentHash) -> MetadataResult<u64> {
        self.clear_current(file_name).await?;
        self.mark_current(file_name, hash).await
    }
}
