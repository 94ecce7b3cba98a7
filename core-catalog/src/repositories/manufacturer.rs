//! Manufacturer repository trait and implementation

use crate::error::{CatalogError, Result};
use crate::models::Manufacturer;
use crate::repositories::{CatalogRepository, RowVersion, INSERT_CHUNK_ROWS};
use async_trait::async_trait;
use sqlx::{query_as, QueryBuilder, SqlitePool};

/// Manufacturer-specific read operations
#[async_trait]
pub trait ManufacturerRepository: CatalogRepository<Row = Manufacturer> {
    /// Find a manufacturer by its ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Manufacturer>>;

    /// All manufacturers, ordered by name
    async fn find_all(&self) -> Result<Vec<Manufacturer>>;
}

/// SQLite implementation of the manufacturer repository
pub struct SqliteManufacturerRepository {
    pool: SqlitePool,
}

impl SqliteManufacturerRepository {
    /// Create a new SQLite manufacturer repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for SqliteManufacturerRepository {
    type Row = Manufacturer;

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM manufacturers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    async fn versions(&self) -> Result<Vec<RowVersion>> {
        let versions =
            query_as::<_, RowVersion>("SELECT id, data_version, deletion_mark FROM manufacturers")
                .fetch_all(&self.pool)
                .await?;

        Ok(versions)
    }

    async fn insert(&self, row: &Manufacturer) -> Result<()> {
        row.validate().map_err(|msg| CatalogError::InvalidInput {
            field: "manufacturer".to_string(),
            message: msg,
        })?;

        sqlx::query(
            "INSERT INTO manufacturers (id, name, data_version, deletion_mark) VALUES (?, ?, ?, ?)",
        )
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.data_version)
        .bind(row.deletion_mark)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_batch(&self, rows: &[Manufacturer]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        for row in rows {
            row.validate().map_err(|msg| CatalogError::InvalidInput {
                field: "manufacturer".to_string(),
                message: msg,
            })?;
        }

        let mut tx = self.pool.begin().await?;

        for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
            let mut builder = QueryBuilder::new(
                "INSERT INTO manufacturers (id, name, data_version, deletion_mark) ",
            );

            builder.push_values(chunk, |mut b, row| {
                b.push_bind(&row.id)
                    .push_bind(&row.name)
                    .push_bind(&row.data_version)
                    .push_bind(row.deletion_mark);
            });

            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn update(&self, row: &Manufacturer) -> Result<()> {
        row.validate().map_err(|msg| CatalogError::InvalidInput {
            field: "manufacturer".to_string(),
            message: msg,
        })?;

        let result = sqlx::query(
            "UPDATE manufacturers SET name = ?, data_version = ?, deletion_mark = ? WHERE id = ?",
        )
        .bind(&row.name)
        .bind(&row.data_version)
        .bind(row.deletion_mark)
        .bind(&row.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound {
                entity_type: "Manufacturer".to_string(),
                id: row.id.clone(),
            });
        }

        Ok(())
    }

    async fn set_deletion_mark(&self, id: &str, deletion_mark: bool) -> Result<()> {
        let result = sqlx::query("UPDATE manufacturers SET deletion_mark = ? WHERE id = ?")
            .bind(deletion_mark)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound {
                entity_type: "Manufacturer".to_string(),
                id: id.to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl ManufacturerRepository for SqliteManufacturerRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Manufacturer>> {
        let row = query_as::<_, Manufacturer>("SELECT * FROM manufacturers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_all(&self) -> Result<Vec<Manufacturer>> {
        let rows = query_as::<_, Manufacturer>("SELECT * FROM manufacturers ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
