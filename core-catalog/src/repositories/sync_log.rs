//! Sync log repository trait and implementation
//!
//! The sync log is append-only: runs are recorded, never rewritten. Rows
//! store enums as text and counters as a JSON document, so reads go through
//! an intermediate row struct that parses into the domain type.

use crate::error::{CatalogError, Result};
use crate::models::{SyncLog, SyncLogId, SyncMeta, SyncStatus, SyncType};
use crate::repositories::{Page, PageRequest};
use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};

/// Sync log data access operations
#[async_trait]
pub trait SyncLogRepository: Send + Sync {
    /// Append a log entry
    ///
    /// Returns the stored row, or `None` when the insert did not produce
    /// one; callers treat `None` as a failed audit write.
    async fn insert(&self, log: &SyncLog) -> Result<Option<SyncLog>>;

    /// The most recent entry for a sync type
    async fn find_latest_by_type(&self, sync_type: SyncType) -> Result<Option<SyncLog>>;

    /// Entries for a sync type, newest first, with pagination
    async fn query_by_type(
        &self,
        sync_type: SyncType,
        page_request: PageRequest,
    ) -> Result<Page<SyncLog>>;

    /// Count entries for a sync type
    async fn count_by_type(&self, sync_type: SyncType) -> Result<i64>;
}

/// Database row shape for sync log entries
#[derive(Debug, Clone, sqlx::FromRow)]
struct SyncLogRow {
    id: String,
    sync_type: String,
    data_hash: String,
    status: String,
    metadata: String,
    created_at: i64,
}

impl TryFrom<SyncLogRow> for SyncLog {
    type Error = CatalogError;

    fn try_from(row: SyncLogRow) -> Result<Self> {
        let metadata: SyncMeta = serde_json::from_str(&row.metadata)?;

        Ok(SyncLog {
            id: SyncLogId::from_string(&row.id)?,
            sync_type: row.sync_type.parse()?,
            data_hash: row.data_hash,
            status: row.status.parse()?,
            metadata,
            created_at: row.created_at,
        })
    }
}

/// SQLite implementation of the sync log repository
pub struct SqliteSyncLogRepository {
    pool: SqlitePool,
}

impl SqliteSyncLogRepository {
    /// Create a new SQLite sync log repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncLogRepository for SqliteSyncLogRepository {
    async fn insert(&self, log: &SyncLog) -> Result<Option<SyncLog>> {
        let metadata = serde_json::to_string(&log.metadata)?;

        let row = query_as::<_, SyncLogRow>(
            r#"
            INSERT INTO sync_logs (id, sync_type, data_hash, status, metadata, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, sync_type, data_hash, status, metadata, created_at
            "#,
        )
        .bind(log.id.as_str())
        .bind(log.sync_type.as_str())
        .bind(&log.data_hash)
        .bind(log.status.as_str())
        .bind(&metadata)
        .bind(log.created_at)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SyncLog::try_from).transpose()
    }

    async fn find_latest_by_type(&self, sync_type: SyncType) -> Result<Option<SyncLog>> {
        // created_at has second precision; rowid breaks ties between
        // back-to-back runs.
        let row = query_as::<_, SyncLogRow>(
            r#"
            SELECT id, sync_type, data_hash, status, metadata, created_at
            FROM sync_logs
            WHERE sync_type = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(sync_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(SyncLog::try_from).transpose()
    }

    async fn query_by_type(
        &self,
        sync_type: SyncType,
        page_request: PageRequest,
    ) -> Result<Page<SyncLog>> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sync_logs WHERE sync_type = ?")
            .bind(sync_type.as_str())
            .fetch_one(&self.pool)
            .await?;

        let rows = query_as::<_, SyncLogRow>(
            r#"
            SELECT id, sync_type, data_hash, status, metadata, created_at
            FROM sync_logs
            WHERE sync_type = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(sync_type.as_str())
        .bind(page_request.limit as i64)
        .bind(page_request.offset as i64)
        .fetch_all(&self.pool)
        .await?;

        let logs = rows
            .into_iter()
            .map(SyncLog::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(logs, total.0 as u64, page_request))
    }

    async fn count_by_type(&self, sync_type: SyncType) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sync_logs WHERE sync_type = ?")
            .bind(sync_type.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    fn test_log(sync_type: SyncType, hash: &str) -> SyncLog {
        SyncLog::new(
            sync_type,
            hash,
            SyncStatus::Success,
            SyncMeta {
                fetched: 10,
                created: 10,
                ..SyncMeta::default()
            },
        )
    }

    #[tokio::test]
    async fn test_insert_returns_stored_row() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteSyncLogRepository::new(pool);

        let log = test_log(SyncType::Nomenclature, "hash-1");
        let stored = repo.insert(&log).await.unwrap().unwrap();

        assert_eq!(stored.id, log.id);
        assert_eq!(stored.sync_type, SyncType::Nomenclature);
        assert_eq!(stored.data_hash, "hash-1");
        assert_eq!(stored.metadata.created, 10);
    }

    #[tokio::test]
    async fn test_latest_prefers_later_insert_within_same_second() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteSyncLogRepository::new(pool);

        let first = test_log(SyncType::Stock, "hash-1");
        let mut second = test_log(SyncType::Stock, "hash-2");
        // Force identical timestamps to exercise the rowid tiebreak.
        second.created_at = first.created_at;

        repo.insert(&first).await.unwrap();
        repo.insert(&second).await.unwrap();

        let latest = repo.find_latest_by_type(SyncType::Stock).await.unwrap().unwrap();
        assert_eq!(latest.data_hash, "hash-2");
    }

    #[tokio::test]
    async fn test_latest_is_scoped_by_type() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteSyncLogRepository::new(pool);

        repo.insert(&test_log(SyncType::Prices, "price-hash"))
            .await
            .unwrap();
        repo.insert(&test_log(SyncType::Stock, "stock-hash"))
            .await
            .unwrap();

        let latest = repo.find_latest_by_type(SyncType::Prices).await.unwrap().unwrap();
        assert_eq!(latest.data_hash, "price-hash");

        let none = repo
            .find_latest_by_type(SyncType::Manufacturers)
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_query_by_type_pages_newest_first() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteSyncLogRepository::new(pool);

        for i in 0..5 {
            let mut log = test_log(SyncType::Nomenclature, &format!("hash-{}", i));
            log.created_at = 1_700_000_000 + i;
            repo.insert(&log).await.unwrap();
        }

        let page = repo
            .query_by_type(SyncType::Nomenclature, PageRequest::new(2, 0))
            .await
            .unwrap();

        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].data_hash, "hash-4");
        assert_eq!(page.items[1].data_hash, "hash-3");
        assert!(page.has_more());

        assert_eq!(
            repo.count_by_type(SyncType::Nomenclature).await.unwrap(),
            5
        );
    }

    #[tokio::test]
    async fn test_metadata_round_trips_through_json() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteSyncLogRepository::new(pool);

        let log = SyncLog::new(
            SyncType::MeasurementUnits,
            "hash-meta",
            SyncStatus::Ignored,
            SyncMeta::all_ignored(123),
        );
        repo.insert(&log).await.unwrap();

        let stored = repo
            .find_latest_by_type(SyncType::MeasurementUnits)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SyncStatus::Ignored);
        assert_eq!(stored.metadata, SyncMeta::all_ignored(123));
    }

    #[tokio::test]
    async fn test_corrupt_status_surfaces_as_error() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteSyncLogRepository::new(pool.clone());

        sqlx::query(
            r#"
            INSERT INTO sync_logs (id, sync_type, data_hash, status, metadata, created_at)
            VALUES (?, 'stock', 'h', 'exploded', '{}', 0)
            "#,
        )
        .bind(SyncLogId::new().as_str())
        .execute(&pool)
        .await
        .unwrap();

        let result = repo.find_latest_by_type(SyncType::Stock).await;
        assert!(matches!(
            result,
            Err(CatalogError::InvalidStoredValue { .. })
        ));
    }
}
