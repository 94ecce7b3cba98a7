//! Stock level repository trait and implementation
//!
//! Stock balances are register data keyed by nomenclature item, mirrored
//! wholesale from the warehouse balance register.

use crate::error::{CatalogError, Result};
use crate::models::StockLevel;
use crate::repositories::INSERT_CHUNK_ROWS;
use async_trait::async_trait;
use sqlx::{query_as, QueryBuilder, SqlitePool};

/// Stock data access operations
#[async_trait]
pub trait StockRepository: Send + Sync {
    /// Count all stock rows
    async fn count(&self) -> Result<i64>;

    /// Load every stored stock row
    async fn find_all(&self) -> Result<Vec<StockLevel>>;

    /// Find the stock row of a nomenclature item
    async fn find_by_nomenclature(&self, nomenclature_id: &str) -> Result<Option<StockLevel>>;

    /// Insert a single stock row
    async fn insert(&self, row: &StockLevel) -> Result<()>;

    /// Insert many stock rows inside one transaction
    async fn insert_batch(&self, rows: &[StockLevel]) -> Result<()>;

    /// Rewrite the stock row of a nomenclature item
    async fn update(&self, row: &StockLevel) -> Result<()>;
}

/// SQLite implementation of the stock repository
pub struct SqliteStockRepository {
    pool: SqlitePool,
}

impl SqliteStockRepository {
    /// Create a new SQLite stock repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StockRepository for SqliteStockRepository {
    async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stock_levels")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    async fn find_all(&self) -> Result<Vec<StockLevel>> {
        let rows = query_as::<_, StockLevel>("SELECT * FROM stock_levels")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn find_by_nomenclature(&self, nomenclature_id: &str) -> Result<Option<StockLevel>> {
        let row = query_as::<_, StockLevel>("SELECT * FROM stock_levels WHERE nomenclature_id = ?")
            .bind(nomenclature_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn insert(&self, row: &StockLevel) -> Result<()> {
        row.validate().map_err(|msg| CatalogError::InvalidInput {
            field: "stock".to_string(),
            message: msg,
        })?;

        sqlx::query(
            r#"
            INSERT INTO stock_levels (nomenclature_id, available, reserved_stock, reserved_orders)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&row.nomenclature_id)
        .bind(row.available)
        .bind(row.reserved_stock)
        .bind(row.reserved_orders)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_batch(&self, rows: &[StockLevel]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        for row in rows {
            row.validate().map_err(|msg| CatalogError::InvalidInput {
                field: "stock".to_string(),
                message: msg,
            })?;
        }

        let mut tx = self.pool.begin().await?;

        for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
            let mut builder = QueryBuilder::new(
                "INSERT INTO stock_levels (nomenclature_id, available, reserved_stock, reserved_orders) ",
            );

            builder.push_values(chunk, |mut b, row| {
                b.push_bind(&row.nomenclature_id)
                    .push_bind(row.available)
                    .push_bind(row.reserved_stock)
                    .push_bind(row.reserved_orders);
            });

            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn update(&self, row: &StockLevel) -> Result<()> {
        row.validate().map_err(|msg| CatalogError::InvalidInput {
            field: "stock".to_string(),
            message: msg,
        })?;

        let result = sqlx::query(
            r#"
            UPDATE stock_levels SET available = ?, reserved_stock = ?, reserved_orders = ?
            WHERE nomenclature_id = ?
            "#,
        )
        .bind(row.available)
        .bind(row.reserved_stock)
        .bind(row.reserved_orders)
        .bind(&row.nomenclature_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound {
                entity_type: "StockLevel".to_string(),
                id: row.nomenclature_id.clone(),
            });
        }

        Ok(())
    }
}
