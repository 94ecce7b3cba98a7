//! Price repository trait and implementation
//!
//! Prices are register data: one current row per nomenclature item, no
//! change token, no deletion mark. Reconciliation compares whole rows.

use crate::error::{CatalogError, Result};
use crate::models::PriceEntry;
use crate::repositories::INSERT_CHUNK_ROWS;
use async_trait::async_trait;
use sqlx::{query_as, QueryBuilder, SqlitePool};

/// Price data access operations
#[async_trait]
pub trait PriceRepository: Send + Sync {
    /// Count all price rows
    async fn count(&self) -> Result<i64>;

    /// Load every stored price row
    async fn find_all(&self) -> Result<Vec<PriceEntry>>;

    /// Find the price row of a nomenclature item
    async fn find_by_nomenclature(&self, nomenclature_id: &str) -> Result<Option<PriceEntry>>;

    /// Insert a single price row
    async fn insert(&self, row: &PriceEntry) -> Result<()>;

    /// Insert many price rows inside one transaction
    async fn insert_batch(&self, rows: &[PriceEntry]) -> Result<()>;

    /// Rewrite the price row of a nomenclature item
    async fn update(&self, row: &PriceEntry) -> Result<()>;
}

/// SQLite implementation of the price repository
pub struct SqlitePriceRepository {
    pool: SqlitePool,
}

impl SqlitePriceRepository {
    /// Create a new SQLite price repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PriceRepository for SqlitePriceRepository {
    async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM prices")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    async fn find_all(&self) -> Result<Vec<PriceEntry>> {
        let rows = query_as::<_, PriceEntry>("SELECT * FROM prices")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn find_by_nomenclature(&self, nomenclature_id: &str) -> Result<Option<PriceEntry>> {
        let row = query_as::<_, PriceEntry>("SELECT * FROM prices WHERE nomenclature_id = ?")
            .bind(nomenclature_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn insert(&self, row: &PriceEntry) -> Result<()> {
        row.validate().map_err(|msg| CatalogError::InvalidInput {
            field: "price".to_string(),
            message: msg,
        })?;

        sqlx::query(
            r#"
            INSERT INTO prices (nomenclature_id, package_id, price, period, recorder)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.nomenclature_id)
        .bind(&row.package_id)
        .bind(row.price)
        .bind(row.period)
        .bind(&row.recorder)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_batch(&self, rows: &[PriceEntry]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        for row in rows {
            row.validate().map_err(|msg| CatalogError::InvalidInput {
                field: "price".to_string(),
                message: msg,
            })?;
        }

        let mut tx = self.pool.begin().await?;

        for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
            let mut builder = QueryBuilder::new(
                "INSERT INTO prices (nomenclature_id, package_id, price, period, recorder) ",
            );

            builder.push_values(chunk, |mut b, row| {
                b.push_bind(&row.nomenclature_id)
                    .push_bind(&row.package_id)
                    .push_bind(row.price)
                    .push_bind(row.period)
                    .push_bind(&row.recorder);
            });

            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn update(&self, row: &PriceEntry) -> Result<()> {
        row.validate().map_err(|msg| CatalogError::InvalidInput {
            field: "price".to_string(),
            message: msg,
        })?;

        let result = sqlx::query(
            r#"
            UPDATE prices SET package_id = ?, price = ?, period = ?, recorder = ?
            WHERE nomenclature_id = ?
            "#,
        )
        .bind(&row.package_id)
        .bind(row.price)
        .bind(row.period)
        .bind(&row.recorder)
        .bind(&row.nomenclature_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound {
                entity_type: "PriceEntry".to_string(),
                id: row.nomenclature_id.clone(),
            });
        }

        Ok(())
    }
}
