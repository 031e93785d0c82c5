//! Testing utilities for procdoc workspace
//!
//! Shared fixtures and instrumented store wrappers.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use procdoc_artifact::ContentHash;
use procdoc_migration::ProcessMap;
use procdoc_storage::{MemoryObjectStore, ObjectEntry, ObjectStore, StorageError, StorageResult};
use procdoc_version::{
    FileVersion, MemoryMetadataStore, MetadataResult, MetadataStore, NewVersion,
};
use std::collections::HashSet;

pub fn bpmn_document(process_id: &str, body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <definitions xmlns=\"http://www.omg.org/spec/BPMN/20100524/MODEL\">\n  \
         <process id=\"{process_id}\">\n    {body}\n  </process>\n</definitions>\n"
    )
}

/// Application → household/stakeholder, plus the top-level mortgage file
pub fn mortgage_process_map() -> ProcessMap {
    ProcessMap::builder()
        .call("mortgage.bpmn", "application", "mortgage-se-application.bpmn")
        .call("mortgage-se-application.bpmn", "household", "mortgage-se-household.bpmn")
        .call("mortgage-se-application.bpmn", "stakeholder", "mortgage-se-stakeholder.bpmn")
        .build()
}

pub async fn seed_objects(store: &dyn ObjectStore, paths: &[&str]) {
    for path in paths {
        store
            .upload(path, format!("<!-- {path} -->").into_bytes(), "text/html", false)
            .await
            .unwrap();
    }
}

/// Memory metadata store that records version-number lookups
///
/// Keeps the trait's default two-phase `swap_current`.
#[derive(Debug, Default)]
pub struct RecordingMetadataStore {
    inner: MemoryMetadataStore,
    number_lookups: Mutex<Vec<(String, u32)>>,
}

impl RecordingMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn number_lookups(&self) -> Vec<(String, u32)> {
        self.number_lookups.lock().clone()
    }
}

#[async_trait]
impl MetadataStore for RecordingMetadataStore {
    async fn select_current(&self, file_name: &str) -> MetadataResult<Vec<FileVersion>> {
        self.inner.select_current(file_name).await
    }

    async fn select_by_hash(
        &self,
        file_name: &str,
        hash: &ContentHash,
    ) -> MetadataResult<Vec<FileVersion>> {
        self.inner.select_by_hash(file_name, hash).await
    }

    async fn select_by_number(
        &self,
        file_name: &str,
        version_number: u32,
    ) -> MetadataResult<Vec<FileVersion>> {
        self.number_lookups
            .lock()
            .push((file_name.to_string(), version_number));
        self.inner.select_by_number(file_name, version_number).await
    }

    async fn select_all(&self, file_name: &str) -> MetadataResult<Vec<FileVersion>> {
        self.inner.select_all(file_name).await
    }

    async fn max_version_number(&self, file_name: &str) -> MetadataResult<Option<u32>> {
        self.inner.max_version_number(file_name).await
    }

    async fn insert_current(&self, version: NewVersion) -> MetadataResult<FileVersion> {
        self.inner.insert_current(version).await
    }

    async fn clear_current(&self, file_name: &str) -> MetadataResult<u64> {
        self.inner.clear_current(file_name).await
    }

    async fn mark_current(&self, file_name: &str, hash: &ContentHash) -> MetadataResult<u64> {
        self.inner.mark_current(file_name, hash).await
    }
}

/// Memory object store with injectable per-path failures
#[derive(Debug, Default)]
pub struct FaultyObjectStore {
    pub inner: MemoryObjectStore,
    failing_uploads: Mutex<HashSet<String>>,
    failing_deletes: Mutex<HashSet<String>>,
    failing_lists: Mutex<HashSet<String>>,
    vanishing: Mutex<HashSet<String>>,
}

impl FaultyObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_upload(&self, path: &str) {
        self.failing_uploads.lock().insert(path.to_string());
    }

    pub fn fail_delete(&self, path: &str) {
        self.failing_deletes.lock().insert(path.to_string());
    }

    pub fn fail_list(&self, directory: &str) {
        self.failing_lists.lock().insert(directory.to_string());
    }

    /// Remove `path` from the inner store just before its delete runs, so the
    /// delete reports that nothing was there
    pub fn vanish_before_delete(&self, path: &str) {
        self.vanishing.lock().insert(path.to_string());
    }

    fn injected(set: &Mutex<HashSet<String>>, path: &str, op: &str) -> StorageResult<()> {
        if set.lock().contains(path) {
            return Err(StorageError::backend(format!("injected {op} failure for {path}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FaultyObjectStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        overwrite: bool,
    ) -> StorageResult<()> {
        Self::injected(&self.failing_uploads, path, "upload")?;
        self.inner.upload(path, bytes, content_type, overwrite).await
    }

    async fn download(&self, path: &str) -> StorageResult<Option<Vec<u8>>> {
        self.inner.download(path).await
    }

    async fn list(&self, directory: &str, prefix: Option<&str>) -> StorageResult<Vec<ObjectEntry>> {
        Self::injected(&self.failing_lists, directory, "list")?;
        self.inner.list(directory, prefix).await
    }

    async fn list_dirs(&self, directory: &str) -> StorageResult<Vec<String>> {
        Self::injected(&self.failing_lists, directory, "list")?;
        self.inner.list_dirs(directory).await
    }

    async fn delete(&self, path: &str) -> StorageResult<bool> {
        Self::injected(&self.failing_deletes, path, "delete")?;
        if self.vanishing.lock().remove(path) {
            self.inner.delete(path).await?;
        }
        self.inner.delete(path).await
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        self.inner.exists(path).await
    }
}
