//! In-process metadata store
//!
//! Every mutation runs under one write lock, so inserts and swaps are atomic.

use crate::error::{MetadataError, MetadataResult};
use crate::metadata::MetadataStore;
use crate::model::{FileVersion, NewVersion};
use async_trait::async_trait;
use parking_lot::RwLock;
use procdoc_artifact::ContentHash;
use std::collections::HashMap;

/// Metadata store backed by a map of file name to rows
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    rows: RwLock<HashMap<String, Vec<FileVersion>>>,
}

impl MemoryMetadataStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files with at least one version
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.rows.read().len()
    }

    fn select_where<F>(&self, file_name: &str, predicate: F) -> Vec<FileVersion>
    where
        F: Fn(&FileVersion) -> bool,
    {
        self.rows
            .read()
            .get(file_name)
            .map(|rows| rows.iter().filter(|r| predicate(r)).cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn select_current(&self, file_name: &str) -> MetadataResult<Vec<FileVersion>> {
        Ok(self.select_where(file_name, |r| r.is_current))
    }

    async fn select_by_hash(
        &self,
        file_name: &str,
        hash: &ContentHash,
    ) -> MetadataResult<Vec<FileVersion>> {
        Ok(self.select_where(file_name, |r| r.content_hash == *hash))
    }

    async fn select_by_number(
        &self,
        file_name: &str,
        version_number: u32,
    ) -> MetadataResult<Vec<FileVersion>> {
        Ok(self.select_where(file_name, |r| r.version_number == version_number))
    }

    async fn select_all(&self, file_name: &str) -> MetadataResult<Vec<FileVersion>> {
        Ok(self.select_where(file_name, |_| true))
    }

    async fn max_version_number(&self, file_name: &str) -> MetadataResult<Option<u32>> {
        Ok(self
            .rows
            .read()
            .get(file_name)
            .and_then(|rows| rows.iter().map(|r| r.version_number).max()))
    }

    async fn insert_current(&self, version: NewVersion) -> MetadataResult<FileVersion> {
        let mut guard = self.rows.write();
        let rows = guard.entry(version.file_name.clone()).or_default();

        if rows.iter().any(|r| r.content_hash == version.content_hash) {
            return Err(MetadataError::conflict(
                &version.file_name,
                format!("content hash {} already recorded", version.content_hash.short()),
            ));
        }
        if rows.iter().any(|r| r.version_number == version.version_number) {
            return Err(MetadataError::conflict(
                &version.file_name,
                format!("version {} already recorded", version.version_number),
            ));
        }

        for row in rows.iter_mut() {
            row.is_current = false;
        }
        let inserted = version.into_current();
        rows.push(inserted.clone());
        Ok(inserted)
    }

    async fn clear_current(&self, file_name: &str) -> MetadataResult<u64> {
        let mut guard = self.rows.write();
        let mut changed = 0;
        if let Some(rows) = guard.get_mut(file_name) {
            for row in rows.iter_mut().filter(|r| r.is_current) {
                row.is_current = false;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn mark_current(&self, file_name: &str, hash: &ContentHash) -> MetadataResult<u64> {
        let mut guard = self.rows.write();
        let mut changed = 0;
        if let Some(rows) = guard.get_mut(file_name) {
            for row in rows.iter_mut().filter(|r| r.content_hash == *hash) {
                row.is_current = true;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn swap_current(&self, file_name: &str, hash: &ContentHash) -> MetadataResult<u64> {
        let mut guard = self.rows.write();
        let Some(rows) = guard.get_mut(file_name) else {
            return Ok(0);
        };
        if !rows.iter().any(|r| r.content_hash == *hash) {
            return Ok(0);
        }
        let mut changed = 0;
        for row in rows.iter_mut() {
            let target = row.content_hash == *hash;
            if row.is_current != target {
                row.is_current = target;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use procdoc_artifact::ContentHasher;

    fn new_version(file: &str, content: &str, number: u32) -> NewVersion {
        NewVersion {
            file_name: file.to_string(),
            content_hash: ContentHasher::hash(content),
            version_number: number,
            content: content.to_string(),
            metadata: serde_json::json!({}),
            uploaded_at: Utc::now(),
            uploaded_by: None,
            change_summary: None,
        }
    }

    #[tokio::test]
    async fn missing_file_selects_nothing() {
        let store = MemoryMetadataStore::new();
        assert!(store.select_current("nope.bpmn").await.unwrap().is_empty());
        assert_eq!(store.max_version_number("nope.bpmn").await.unwrap(), None);
        assert_eq!(store.clear_current("nope.bpmn").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn insert_current_clears_previous() {
        let store = MemoryMetadataStore::new();
        store.insert_current(new_version("a.bpmn", "v1", 1)).await.unwrap();
        store.insert_current(new_version("a.bpmn", "v2", 2)).await.unwrap();

        let current = store.select_current("a.bpmn").await.unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].version_number, 2);
        assert_eq!(store.max_version_number("a.bpmn").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_hash_and_number() {
        let store = MemoryMetadataStore::new();
        store.insert_current(new_version("a.bpmn", "v1", 1)).await.unwrap();

        let dup_hash = store.insert_current(new_version("a.bpmn", "v1", 2)).await;
        assert!(matches!(dup_hash, Err(MetadataError::Conflict { .. })));

        let dup_number = store.insert_current(new_version("a.bpmn", "v2", 1)).await;
        assert!(matches!(dup_number, Err(MetadataError::Conflict { .. })));

        // Same content under another file name is fine
        store.insert_current(new_version("b.bpmn", "v1", 1)).await.unwrap();
        assert_eq!(store.file_count(), 2);
    }

    #[tokio::test]
    async fn swap_unknown_hash_changes_nothing() {
        let store = MemoryMetadataStore::new();
        store.insert_current(new_version("a.bpmn", "v1", 1)).await.unwrap();

        let changed = store
            .swap_current("a.bpmn", &ContentHasher::hash("other"))
            .await
            .unwrap();
        assert_eq!(changed, 0);
        assert_eq!(store.select_current("a.bpmn").await.unwrap().len(), 1);
    }
}
