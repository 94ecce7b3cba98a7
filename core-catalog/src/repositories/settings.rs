//! Site settings repository trait and implementation
//!
//! Settings are versioned by insertion: every save appends a new row and
//! reads always take the newest one. The settings document is stored as
//! a JSON blob since its shape evolves with the site.

use crate::error::{CatalogError, Result};
use crate::models::{current_timestamp, SettingsRecord, SiteSettings};
use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};

/// Site settings data access operations
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Append a new settings revision and return the stored record
    async fn insert(&self, settings: &SiteSettings) -> Result<SettingsRecord>;

    /// The most recently saved settings, if any were ever saved
    async fn find_latest(&self) -> Result<Option<SettingsRecord>>;
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SettingsRow {
    id: i64,
    settings: String,
    created_at: i64,
}

impl TryFrom<SettingsRow> for SettingsRecord {
    type Error = CatalogError;

    fn try_from(row: SettingsRow) -> Result<Self> {
        Ok(SettingsRecord {
            id: row.id,
            settings: serde_json::from_str(&row.settings)?,
            created_at: row.created_at,
        })
    }
}

/// SQLite implementation of the settings repository
pub struct SqliteSettingsRepository {
    pool: SqlitePool,
}

impl SqliteSettingsRepository {
    /// Create a new SQLite settings repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for SqliteSettingsRepository {
    async fn insert(&self, settings: &SiteSettings) -> Result<SettingsRecord> {
        let payload = serde_json::to_string(settings)?;

        let row = query_as::<_, SettingsRow>(
            r#"
            INSERT INTO site_settings (settings, created_at)
            VALUES (?, ?)
            RETURNING id, settings, created_at
            "#,
        )
        .bind(&payload)
        .bind(current_timestamp())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_latest(&self) -> Result<Option<SettingsRecord>> {
        let row = query_as::<_, SettingsRow>(
            r#"
            SELECT id, settings, created_at
            FROM site_settings
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(SettingsRecord::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::models::{GuidsForSync, UnitGuids};

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteSettingsRepository::new(pool);

        let settings = SiteSettings {
            guids_for_sync: Some(GuidsForSync {
                warehouse: Some("wh-guid".to_string()),
                default_price_type: Some("price-guid".to_string()),
                units: Some(UnitGuids {
                    kilogram: Some("kg-guid".to_string()),
                    piece: Some("pc-guid".to_string()),
                }),
                ..GuidsForSync::default()
            }),
        };

        let stored = repo.insert(&settings).await.unwrap();
        assert!(stored.id > 0);
        assert_eq!(stored.settings, settings);

        let latest = repo.find_latest().await.unwrap().unwrap();
        assert_eq!(latest.id, stored.id);
        assert_eq!(latest.settings, settings);
    }

    #[tokio::test]
    async fn test_latest_wins_across_revisions() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteSettingsRepository::new(pool);

        let first = SiteSettings {
            guids_for_sync: Some(GuidsForSync {
                warehouse: Some("old".to_string()),
                ..GuidsForSync::default()
            }),
        };
        let second = SiteSettings {
            guids_for_sync: Some(GuidsForSync {
                warehouse: Some("new".to_string()),
                ..GuidsForSync::default()
            }),
        };

        repo.insert(&first).await.unwrap();
        repo.insert(&second).await.unwrap();

        let latest = repo.find_latest().await.unwrap().unwrap();
        let guids = latest.settings.guids_for_sync.unwrap();
        assert_eq!(guids.warehouse.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_empty_table_yields_none() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteSettingsRepository::new(pool);

        assert!(repo.find_latest().await.unwrap().is_none());
    }
}
