//! Version history behavior against in-memory and SQLite backends

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use procdoc_artifact::{ContentHash, ContentHasher};
use procdoc_test_utils::{bpmn_document, RecordingMetadataStore};
use procdoc_version::{
    FileVersion, MemoryMetadataStore, MetadataResult, MetadataStore, NewVersion,
    SqliteMetadataStore, Upload, VersionStore,
};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn application_upload_history() {
    let store = VersionStore::in_memory();
    let x = bpmn_document("application", "<task id=\"Task_1\"/>");
    let x_prime = bpmn_document("application", "<task id=\"Task_2\"/>");

    let (v1, is_new) = store
        .create_or_get_version(Upload::new("application.bpmn", x.clone()))
        .await
        .unwrap();
    assert!(is_new);
    assert_eq!(v1.version_number, 1);

    let (again, is_new) = store
        .create_or_get_version(Upload::new("application.bpmn", x))
        .await
        .unwrap();
    assert!(!is_new);
    assert_eq!(again, v1);

    let (v2, is_new) = store
        .create_or_get_version(Upload::new("application.bpmn", x_prime))
        .await
        .unwrap();
    assert!(is_new);
    assert_eq!(v2.version_number, 2);

    let previous = store.previous_version("application.bpmn").await.unwrap().unwrap();
    assert_eq!(previous.version_number, 1);
    assert_eq!(previous.content_hash, v1.content_hash);
    assert!(!previous.is_current);
}

#[tokio::test]
async fn whitespace_only_edits_are_the_same_version() {
    let store = VersionStore::in_memory();
    let (v1, _) = store
        .create_or_get_version(Upload::new("a.bpmn", "<a>\n  <b/>\n</a>"))
        .await
        .unwrap();
    let (same, is_new) = store
        .create_or_get_version(Upload::new("a.bpmn", "  <a> <b/>\t</a>\r\n"))
        .await
        .unwrap();
    assert!(!is_new);
    assert_eq!(same.version_number, v1.version_number);
    assert_eq!(store.all_versions("a.bpmn").await.unwrap().len(), 1);
}

#[tokio::test]
async fn same_content_under_two_file_names() {
    let store = VersionStore::in_memory();
    let (a, a_new) = store
        .create_or_get_version(Upload::new("a.bpmn", "<same/>"))
        .await
        .unwrap();
    let (b, b_new) = store
        .create_or_get_version(Upload::new("b.bpmn", "<same/>"))
        .await
        .unwrap();
    assert!(a_new && b_new);
    assert_eq!(a.content_hash, b.content_hash);
    assert_eq!(b.version_number, 1);
}

#[tokio::test]
async fn upload_metadata_is_kept() {
    let store = VersionStore::in_memory();
    let upload = Upload::new("a.bpmn", "<x/>")
        .with_metadata(serde_json::json!({"source": "import", "size": 4}))
        .uploaded_by("alice")
        .with_change_summary("initial import");
    let (v, _) = store.create_or_get_version(upload).await.unwrap();

    let read = store.current_version("a.bpmn").await.unwrap().unwrap();
    assert_eq!(read, v);
    assert_eq!(read.metadata["source"], "import");
    assert_eq!(read.uploaded_by.as_deref(), Some("alice"));
    assert_eq!(read.change_summary.as_deref(), Some("initial import"));
}

#[tokio::test]
async fn previous_of_first_version_skips_lookup() {
    let recording = Arc::new(RecordingMetadataStore::new());
    let store = VersionStore::new(recording.clone());

    store
        .create_or_get_version(Upload::new("a.bpmn", "one"))
        .await
        .unwrap();
    assert!(store.previous_version("a.bpmn").await.unwrap().is_none());
    assert!(recording.number_lookups().is_empty());

    store
        .create_or_get_version(Upload::new("a.bpmn", "two"))
        .await
        .unwrap();
    let prev = store.previous_version("a.bpmn").await.unwrap().unwrap();
    assert_eq!(prev.version_number, 1);
    assert_eq!(recording.number_lookups(), vec![("a.bpmn".to_string(), 1)]);
}

#[tokio::test]
async fn two_phase_swap_through_default_method() {
    // RecordingMetadataStore keeps the trait's default clear-then-mark swap
    let recording = Arc::new(RecordingMetadataStore::new());
    let store = VersionStore::new(recording.clone());

    let (v1, _) = store
        .create_or_get_version(Upload::new("a.bpmn", "one"))
        .await
        .unwrap();
    store
        .create_or_get_version(Upload::new("a.bpmn", "two"))
        .await
        .unwrap();

    let current = store
        .set_version_as_current("a.bpmn", &v1.content_hash)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.version_number, 1);

    let currents: Vec<u32> = store
        .all_versions("a.bpmn")
        .await
        .unwrap()
        .into_iter()
        .filter(|v| v.is_current)
        .map(|v| v.version_number)
        .collect();
    assert_eq!(currents, vec![1]);
}

#[tokio::test]
async fn cleared_current_reads_as_none() {
    let metadata = Arc::new(MemoryMetadataStore::new());
    let store = VersionStore::new(metadata.clone());
    store
        .create_or_get_version(Upload::new("a.bpmn", "one"))
        .await
        .unwrap();

    // The state between the two phases of a non-transactional swap
    metadata.clear_current("a.bpmn").await.unwrap();
    assert!(store.current_version("a.bpmn").await.unwrap().is_none());
    assert!(store.previous_version("a.bpmn").await.unwrap().is_none());
    assert_eq!(store.all_versions("a.bpmn").await.unwrap().len(), 1);
}

#[tokio::test]
async fn set_current_with_unknown_hash_changes_nothing() {
    let store = VersionStore::in_memory();
    store
        .create_or_get_version(Upload::new("a.bpmn", "one"))
        .await
        .unwrap();
    let (v2, _) = store
        .create_or_get_version(Upload::new("a.bpmn", "two"))
        .await
        .unwrap();

    let result = store
        .set_version_as_current("a.bpmn", &ContentHasher::hash("never uploaded"))
        .await
        .unwrap();
    assert!(result.is_none());
    assert_eq!(
        store.current_version_hash("a.bpmn").await.unwrap(),
        Some(v2.content_hash)
    );
}

#[tokio::test]
async fn concurrent_first_uploads_create_one_version() {
    let store = Arc::new(VersionStore::in_memory());

    let tasks = (0..16).map(|_| {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .create_or_get_version(Upload::new("race.bpmn", "<same/>"))
                .await
                .unwrap()
        })
    });
    let results = futures::future::join_all(tasks).await;

    let created = results
        .iter()
        .filter(|r| r.as_ref().unwrap().1)
        .count();
    assert_eq!(created, 1);
    assert!(results
        .iter()
        .all(|r| r.as_ref().unwrap().0.version_number == 1));
    assert_eq!(store.all_versions("race.bpmn").await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_distinct_uploads_number_without_gaps() {
    let store = Arc::new(VersionStore::in_memory());

    let tasks = (0..10).map(|i| {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .create_or_get_version(Upload::new("busy.bpmn", format!("<v{i}/>")))
                .await
                .unwrap()
        })
    });
    futures::future::join_all(tasks).await;

    let versions = store.all_versions("busy.bpmn").await.unwrap();
    let numbers: Vec<u32> = versions.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, (1..=10).rev().collect::<Vec<_>>());
    assert_eq!(versions.iter().filter(|v| v.is_current).count(), 1);
}

/// Reports every current row twice
struct DuplicatingStore(MemoryMetadataStore);

#[async_trait]
impl MetadataStore for DuplicatingStore {
    async fn select_current(&self, file_name: &str) -> MetadataResult<Vec<FileVersion>> {
        let rows = self.0.select_current(file_name).await?;
        Ok(rows.iter().chain(rows.iter()).cloned().collect())
    }

    async fn select_by_hash(
        &self,
        file_name: &str,
        hash: &ContentHash,
    ) -> MetadataResult<Vec<FileVersion>> {
        self.0.select_by_hash(file_name, hash).await
    }

    async fn select_by_number(
        &self,
        file_name: &str,
        version_number: u32,
    ) -> MetadataResult<Vec<FileVersion>> {
        self.0.select_by_number(file_name, version_number).await
    }

    async fn select_all(&self, file_name: &str) -> MetadataResult<Vec<FileVersion>> {
        let rows = self.0.select_all(file_name).await?;
        Ok(rows.iter().chain(rows.iter()).cloned().collect())
    }

    async fn max_version_number(&self, file_name: &str) -> MetadataResult<Option<u32>> {
        self.0.max_version_number(file_name).await
    }

    async fn insert_current(&self, version: NewVersion) -> MetadataResult<FileVersion> {
        self.0.insert_current(version).await
    }

    async fn clear_current(&self, file_name: &str) -> MetadataResult<u64> {
        self.0.clear_current(file_name).await
    }

    async fn mark_current(&self, file_name: &str, hash: &ContentHash) -> MetadataResult<u64> {
        self.0.mark_current(file_name, hash).await
    }
}

#[tokio::test]
async fn duplicate_rows_surface_as_invariant_violation() {
    let store = VersionStore::new(Arc::new(DuplicatingStore(MemoryMetadataStore::new())));
    store
        .create_or_get_version(Upload::new("a.bpmn", "one"))
        .await
        .unwrap();

    let err = store.current_version("a.bpmn").await.unwrap_err();
    assert!(err.is_invariant_violation());
    assert!(!err.is_backend());

    let err = store.all_versions("a.bpmn").await.unwrap_err();
    assert!(err.is_invariant_violation());
}

async fn sqlite_store() -> VersionStore {
    let metadata = SqliteMetadataStore::connect("sqlite::memory:", Duration::from_secs(5))
        .await
        .unwrap();
    VersionStore::new(Arc::new(metadata))
}

#[tokio::test]
async fn sqlite_upload_history_and_rollback() {
    let store = sqlite_store().await;

    let (v1, _) = store
        .create_or_get_version(Upload::new("application.bpmn", "<one/>").uploaded_by("bob"))
        .await
        .unwrap();
    let (v2, is_new) = store
        .create_or_get_version(Upload::new("application.bpmn", "<two/>"))
        .await
        .unwrap();
    assert!(is_new);
    assert_eq!(v2.version_number, 2);

    let (dup, is_new) = store
        .create_or_get_version(Upload::new("application.bpmn", " <one/> "))
        .await
        .unwrap();
    assert!(!is_new);
    assert_eq!(dup.version_number, 1);
    assert_eq!(dup.uploaded_by.as_deref(), Some("bob"));

    let rolled_back = store
        .set_version_as_current("application.bpmn", &v1.content_hash)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rolled_back.version_number, 1);
    assert!(store.previous_version("application.bpmn").await.unwrap().is_none());

    let history = store.all_versions("application.bpmn").await.unwrap();
    let summary: Vec<(u32, bool)> = history
        .iter()
        .map(|v| (v.version_number, v.is_current))
        .collect();
    assert_eq!(summary, vec![(2, false), (1, true)]);
}

#[tokio::test]
async fn sqlite_concurrent_first_uploads() {
    let store = Arc::new(sqlite_store().await);

    let tasks = (0..8).map(|_| {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .create_or_get_version(Upload::new("race.bpmn", "<same/>"))
                .await
                .unwrap()
                .1
        })
    });
    let created = futures::future::join_all(tasks)
        .await
        .into_iter()
        .filter(|r| *r.as_ref().unwrap())
        .count();
    assert_eq!(created, 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn versions_number_from_one_without_gaps(
        contents in prop::collection::vec("[a-z<>/ ]{1,12}", 1..12)
    ) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let store = VersionStore::in_memory();
            let mut distinct: Vec<ContentHash> = Vec::new();

            for content in &contents {
                let hash = ContentHasher::hash(content);
                let (v, is_new) = store
                    .create_or_get_version(Upload::new("p.bpmn", content.clone()))
                    .await
                    .unwrap();

                prop_assert_eq!(is_new, !distinct.contains(&hash));
                if is_new {
                    distinct.push(hash);
                    prop_assert_eq!(v.version_number as usize, distinct.len());
                }
                prop_assert_eq!(v.content_hash, hash);
            }

            let all = store.all_versions("p.bpmn").await.unwrap();
            prop_assert_eq!(all.len(), distinct.len());
            prop_assert_eq!(all.iter().filter(|v| v.is_current).count(), 1);
            Ok(())
        })?;
    }
}
