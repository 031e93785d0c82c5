//! SQLite metadata store
//!
//! Schema is created on connect. Unique indexes back the per-file hash and
//! version-number invariants; a partial unique index allows at most one
//! current row per file.

use crate::error::{MetadataError, MetadataResult};
use crate::metadata::MetadataStore;
use crate::model::{FileVersion, NewVersion};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use procdoc_artifact::ContentHash;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;

const SELECT_COLUMNS: &str = "SELECT file_name, content_hash, version_number, content, metadata, \
     uploaded_at, uploaded_by, is_current, change_summary FROM bpmn_file_versions";

/// Metadata store on a SQLite database
#[derive(Debug, Clone)]
pub struct SqliteMetadataStore {
    pool: Pool<Sqlite>,
}

#[derive(Debug, sqlx::FromRow)]
struct VersionRow {
    file_name: String,
    content_hash: String,
    version_number: i64,
    content: String,
    metadata: String,
    uploaded_at: DateTime<Utc>,
    uploaded_by: Option<String>,
    is_current: bool,
    change_summary: Option<String>,
}

impl TryFrom<VersionRow> for FileVersion {
    type Error = MetadataError;

    fn try_from(row: VersionRow) -> Result<Self, Self::Error> {
        let content_hash = ContentHash::from_str(&row.content_hash)
            .map_err(|e| MetadataError::corrupt(&row.file_name, format!("content_hash: {e}")))?;
        let version_number = u32::try_from(row.version_number).map_err(|_| {
            MetadataError::corrupt(
                &row.file_name,
                format!("version_number {} out of range", row.version_number),
            )
        })?;
        let metadata = serde_json::from_str(&row.metadata)
            .map_err(|e| MetadataError::corrupt(&row.file_name, format!("metadata: {e}")))?;
        Ok(Self {
            file_name: row.file_name,
            content_hash,
            version_number,
            content: row.content,
            metadata,
            uploaded_at: row.uploaded_at,
            uploaded_by: row.uploaded_by,
            is_current: row.is_current,
            change_summary: row.change_summary,
        })
    }
}

impl SqliteMetadataStore {
    /// Connect to `url` (e.g. `sqlite:procdoc.db` or `sqlite::memory:`) and
    /// create the schema if needed
    ///
    /// # Errors
    /// Returns error if the database cannot be opened or migrated
    pub async fn connect(url: &str, busy_timeout: Duration) -> MetadataResult<Self> {
        let opts = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(busy_timeout);

        // One connection: SQLite serializes writers anyway, and `:memory:`
        // databases are per-connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        tracing::debug!(url, "sqlite metadata store ready");
        Ok(store)
    }

    /// Get a reference to the connection pool
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS bpmn_file_versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                file_name TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                version_number INTEGER NOT NULL,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                uploaded_at TEXT NOT NULL,
                uploaded_by TEXT,
                is_current INTEGER NOT NULL DEFAULT 0,
                change_summary TEXT,
                UNIQUE(file_name, content_hash),
                UNIQUE(file_name, version_number)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"CREATE UNIQUE INDEX IF NOT EXISTS idx_bpmn_file_versions_one_current
              ON bpmn_file_versions(file_name) WHERE is_current = 1",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch(&self, sql: &str, file_name: &str) -> MetadataResult<Vec<FileVersion>> {
        sqlx::query_as::<_, VersionRow>(sql)
            .bind(file_name)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(FileVersion::try_from)
            .collect()
    }
}

fn map_unique_violation(err: sqlx::Error, file_name: &str) -> MetadataError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            MetadataError::conflict(file_name, db.message().to_string())
        }
        _ => MetadataError::Sqlx(err),
    }
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    async fn select_current(&self, file_name: &str) -> MetadataResult<Vec<FileVersion>> {
        self.fetch(
            &format!("{SELECT_COLUMNS} WHERE file_name = ? AND is_current = 1"),
            file_name,
        )
        .await
    }

    async fn select_by_hash(
        &self,
        file_name: &str,
        hash: &ContentHash,
    ) -> MetadataResult<Vec<FileVersion>> {
        sqlx::query_as::<_, VersionRow>(&format!(
            "{SELECT_COLUMNS} WHERE file_name = ? AND content_hash = ?"
        ))
        .bind(file_name)
        .bind(hash.to_hex())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(FileVersion::try_from)
        .collect()
    }

    async fn select_by_number(
        &self,
        file_name: &str,
        version_number: u32,
    ) -> MetadataResult<Vec<FileVersion>> {
        sqlx::query_as::<_, VersionRow>(&format!(
            "{SELECT_COLUMNS} WHERE file_name = ? AND version_number = ?"
        ))
        .bind(file_name)
        .bind(i64::from(version_number))
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(FileVersion::try_from)
        .collect()
    }

    async fn select_all(&self, file_name: &str) -> MetadataResult<Vec<FileVersion>> {
        self.fetch(
            &format!("{SELECT_COLUMNS} WHERE file_name = ? ORDER BY version_number DESC"),
            file_name,
        )
        .await
    }

    async fn max_version_number(&self, file_name: &str) -> MetadataResult<Option<u32>> {
        let max: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(version_number) FROM bpmn_file_versions WHERE file_name = ?",
        )
        .bind(file_name)
        .fetch_one(&self.pool)
        .await?;

        max.map(|n| {
            u32::try_from(n).map_err(|_| {
                MetadataError::corrupt(file_name, format!("version_number {n} out of range"))
            })
        })
        .transpose()
    }

    async fn insert_current(&self, version: NewVersion) -> MetadataResult<FileVersion> {
        let metadata = serde_json::to_string(&version.metadata)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE bpmn_file_versions SET is_current = 0 WHERE file_name = ? AND is_current = 1",
        )
        .bind(&version.file_name)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"INSERT INTO bpmn_file_versions
              (file_name, content_hash, version_number, content, metadata,
               uploaded_at, uploaded_by, is_current, change_summary)
              VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?)",
        )
        .bind(&version.file_name)
        .bind(version.content_hash.to_hex())
        .bind(i64::from(version.version_number))
        .bind(&version.content)
        .bind(metadata)
        .bind(version.uploaded_at)
        .bind(&version.uploaded_by)
        .bind(&version.change_summary)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, &version.file_name))?;

        tx.commit().await?;
        Ok(version.into_current())
    }

    async fn clear_current(&self, file_name: &str) -> MetadataResult<u64> {
        let result = sqlx::query(
            "UPDATE bpmn_file_versions SET is_current = 0 WHERE file_name = ? AND is_current = 1",
        )
        .bind(file_name)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn mark_current(&self, file_name: &str, hash: &ContentHash) -> MetadataResult<u64> {
        let result = sqlx::query(
            "UPDATE bpmn_file_versions SET is_current = 1 WHERE file_name = ? AND content_hash = ?",
        )
        .bind(file_name)
        .bind(hash.to_hex())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, file_name))?;
        Ok(result.rows_affected())
    }

    async fn swap_current(&self, file_name: &str, hash: &ContentHash) -> MetadataResult<u64> {
        let mut tx = self.pool.begin().await?;

        let cleared = sqlx::query(
            "UPDATE bpmn_file_versions SET is_current = 0 WHERE file_name = ? AND is_current = 1",
        )
        .bind(file_name)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let marked = sqlx::query(
            "UPDATE bpmn_file_versions SET is_current = 1 WHERE file_name = ? AND content_hash = ?",
        )
        .bind(file_name)
        .bind(hash.to_hex())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if marked == 0 {
            tx.rollback().await?;
            return Ok(0);
        }

        tx.commit().await?;
        Ok(cleared + marked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procdoc_artifact::ContentHasher;

    async fn memory_store() -> SqliteMetadataStore {
        SqliteMetadataStore::connect("sqlite::memory:", Duration::from_secs(5))
            .await
            .unwrap()
    }

    fn new_version(file: &str, content: &str, number: u32) -> NewVersion {
        NewVersion {
            file_name: file.to_string(),
            content_hash: ContentHasher::hash(content),
            version_number: number,
            content: content.to_string(),
            metadata: serde_json::json!({"lane": "credit"}),
            uploaded_at: Utc::now(),
            uploaded_by: Some("alice".to_string()),
            change_summary: None,
        }
    }

    #[tokio::test]
    async fn insert_and_read_back() {
        let store = memory_store().await;
        let inserted = store
            .insert_current(new_version("a.bpmn", "<v1/>", 1))
            .await
            .unwrap();

        let current = store.select_current("a.bpmn").await.unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].content_hash, inserted.content_hash);
        assert_eq!(current[0].metadata, serde_json::json!({"lane": "credit"}));
        assert_eq!(current[0].uploaded_by.as_deref(), Some("alice"));
        assert!(current[0].is_current);
    }

    #[tokio::test]
    async fn empty_lookups_are_not_errors() {
        let store = memory_store().await;
        assert!(store.select_current("none.bpmn").await.unwrap().is_empty());
        assert!(store
            .select_by_hash("none.bpmn", &ContentHasher::hash("x"))
            .await
            .unwrap()
            .is_empty());
        assert!(store.select_by_number("none.bpmn", 1).await.unwrap().is_empty());
        assert_eq!(store.max_version_number("none.bpmn").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_hash_is_conflict() {
        let store = memory_store().await;
        store.insert_current(new_version("a.bpmn", "<v1/>", 1)).await.unwrap();
        let err = store
            .insert_current(new_version("a.bpmn", "<v1/>", 2))
            .await
            .unwrap_err();
        assert!(matches!(err, MetadataError::Conflict { .. }));

        // The failed insert rolled back: version 1 is still current
        let current = store.select_current("a.bpmn").await.unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].version_number, 1);
    }

    #[tokio::test]
    async fn swap_moves_current_flag() {
        let store = memory_store().await;
        store.insert_current(new_version("a.bpmn", "<v1/>", 1)).await.unwrap();
        store.insert_current(new_version("a.bpmn", "<v2/>", 2)).await.unwrap();

        let changed = store
            .swap_current("a.bpmn", &ContentHasher::hash("<v1/>"))
            .await
            .unwrap();
        assert_eq!(changed, 2);

        let current = store.select_current("a.bpmn").await.unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].version_number, 1);
        assert_eq!(store.max_version_number("a.bpmn").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn swap_to_unknown_hash_rolls_back() {
        let store = memory_store().await;
        store.insert_current(new_version("a.bpmn", "<v1/>", 1)).await.unwrap();

        let changed = store
            .swap_current("a.bpmn", &ContentHasher::hash("missing"))
            .await
            .unwrap();
        assert_eq!(changed, 0);
        assert_eq!(store.select_current("a.bpmn").await.unwrap().len(), 1);
    }
}
