//! In-process object store

use crate::error::{validate_path, StorageError, StorageResult};
use crate::object::{ObjectEntry, ObjectStore};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

/// Object store kept in a sorted map
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Every stored path, sorted
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }

    /// Content type recorded for `path`
    #[must_use]
    pub fn content_type(&self, path: &str) -> Option<String> {
        self.objects.read().get(path).map(|o| o.content_type.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        overwrite: bool,
    ) -> StorageResult<()> {
        let path = validate_path(path)?;
        let mut objects = self.objects.write();
        if !overwrite && objects.contains_key(path) {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }
        objects.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn download(&self, path: &str) -> StorageResult<Option<Vec<u8>>> {
        let path = validate_path(path)?;
        Ok(self.objects.read().get(path).map(|o| o.bytes.clone()))
    }

    async fn list(&self, directory: &str, prefix: Option<&str>) -> StorageResult<Vec<ObjectEntry>> {
        let directory = validate_path(directory)?;
        let dir_prefix = format!("{directory}/");
        let objects = self.objects.read();

        Ok(objects
            .range(dir_prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&dir_prefix))
            .filter_map(|(path, object)| {
                let name = &path[dir_prefix.len()..];
                let direct = !name.contains('/');
                let matches = prefix.map_or(true, |p| name.starts_with(p));
                (direct && matches)
                    .then(|| ObjectEntry::new(directory, name, object.bytes.len() as u64))
            })
            .collect())
    }

    async fn list_dirs(&self, directory: &str) -> StorageResult<Vec<String>> {
        let directory = validate_path(directory)?;
        let dir_prefix = format!("{directory}/");
        let objects = self.objects.read();

        let dirs: BTreeSet<String> = objects
            .range(dir_prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&dir_prefix))
            .filter_map(|(path, _)| {
                let (dir, _) = path[dir_prefix.len()..].split_once('/')?;
                Some(dir.to_string())
            })
            .collect();
        Ok(dirs.into_iter().collect())
    }

    async fn delete(&self, path: &str) -> StorageResult<bool> {
        let path = validate_path(path)?;
        Ok(self.objects.write().remove(path).is_some())
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let path = validate_path(path)?;
        Ok(self.objects.read().contains_key(path))
    }
}
