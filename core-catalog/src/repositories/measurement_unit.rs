//! Measurement unit repository trait and implementation

use crate::error::{CatalogError, Result};
use crate::models::MeasurementUnit;
use crate::repositories::{CatalogRepository, RowVersion, INSERT_CHUNK_ROWS};
use async_trait::async_trait;
use sqlx::{query_as, QueryBuilder, SqlitePool};

/// Measurement-unit-specific read operations
#[async_trait]
pub trait MeasurementUnitRepository: CatalogRepository<Row = MeasurementUnit> {
    /// Find a unit by its ID
    async fn find_by_id(&self, id: &str) -> Result<Option<MeasurementUnit>>;

    /// Units owned by a nomenclature item
    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<MeasurementUnit>>;
}

/// SQLite implementation of the measurement unit repository
pub struct SqliteMeasurementUnitRepository {
    pool: SqlitePool,
}

impl SqliteMeasurementUnitRepository {
    /// Create a new SQLite measurement unit repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for SqliteMeasurementUnitRepository {
    type Row = MeasurementUnit;

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM measurement_units")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    async fn versions(&self) -> Result<Vec<RowVersion>> {
        let versions = query_as::<_, RowVersion>(
            "SELECT id, data_version, deletion_mark FROM measurement_units",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(versions)
    }

    async fn insert(&self, row: &MeasurementUnit) -> Result<()> {
        row.validate().map_err(|msg| CatalogError::InvalidInput {
            field: "measurement_unit".to_string(),
            message: msg,
        })?;

        sqlx::query(
            r#"
            INSERT INTO measurement_units (
                id, owner_id, name, weight, numerator, denominator, data_version, deletion_mark
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.owner_id)
        .bind(&row.name)
        .bind(row.weight)
        .bind(row.numerator)
        .bind(row.denominator)
        .bind(&row.data_version)
        .bind(row.deletion_mark)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_batch(&self, rows: &[MeasurementUnit]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        for row in rows {
            row.validate().map_err(|msg| CatalogError::InvalidInput {
                field: "measurement_unit".to_string(),
                message: msg,
            })?;
        }

        let mut tx = self.pool.begin().await?;

        for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
            let mut builder = QueryBuilder::new(
                "INSERT INTO measurement_units (
                    id, owner_id, name, weight, numerator, denominator, data_version, deletion_mark
                ) ",
            );

            builder.push_values(chunk, |mut b, row| {
                b.push_bind(&row.id)
                    .push_bind(&row.owner_id)
                    .push_bind(&row.name)
                    .push_bind(row.weight)
                    .push_bind(row.numerator)
                    .push_bind(row.denominator)
                    .push_bind(&row.data_version)
                    .push_bind(row.deletion_mark);
            });

            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn update(&self, row: &MeasurementUnit) -> Result<()> {
        row.validate().map_err(|msg| CatalogError::InvalidInput {
            field: "measurement_unit".to_string(),
            message: msg,
        })?;

        let result = sqlx::query(
            r#"
            UPDATE measurement_units SET
                owner_id = ?, name = ?, weight = ?, numerator = ?, denominator = ?,
                data_version = ?, deletion_mark = ?
            WHERE id = ?
            "#,
        )
        .bind(&row.owner_id)
        .bind(&row.name)
        .bind(row.weight)
        .bind(row.numerator)
        .bind(row.denominator)
        .bind(&row.data_version)
        .bind(row.deletion_mark)
        .bind(&row.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound {
                entity_type: "MeasurementUnit".to_string(),
                id: row.id.clone(),
            });
        }

        Ok(())
    }

    async fn set_deletion_mark(&self, id: &str, deletion_mark: bool) -> Result<()> {
        let result = sqlx::query("UPDATE measurement_units SET deletion_mark = ? WHERE id = ?")
            .bind(deletion_mark)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound {
                entity_type: "MeasurementUnit".to_string(),
                id: id.to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl MeasurementUnitRepository for SqliteMeasurementUnitRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<MeasurementUnit>> {
        let row = query_as::<_, MeasurementUnit>("SELECT * FROM measurement_units WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<MeasurementUnit>> {
        let rows = query_as::<_, MeasurementUnit>(
            "SELECT * FROM measurement_units WHERE owner_id = ? ORDER BY name",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    fn test_unit(id: &str, owner: &str) -> MeasurementUnit {
        MeasurementUnit {
            id: id.to_string(),
            owner_id: Some(owner.to_string()),
            name: "кг".to_string(),
            weight: 1.0,
            numerator: 1.0,
            denominator: 1.0,
            data_version: "v1".to_string(),
            deletion_mark: false,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_by_owner() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteMeasurementUnitRepository::new(pool);

        repo.insert(&test_unit("u-1", "item-1")).await.unwrap();
        repo.insert(&test_unit("u-2", "item-1")).await.unwrap();
        repo.insert(&test_unit("u-3", "item-2")).await.unwrap();

        let owned = repo.find_by_owner("item-1").await.unwrap();
        assert_eq!(owned.len(), 2);
    }

    #[tokio::test]
    async fn test_update_changes_measures() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteMeasurementUnitRepository::new(pool);

        repo.insert(&test_unit("u-1", "item-1")).await.unwrap();

        let mut unit = test_unit("u-1", "item-1");
        unit.weight = 0.5;
        unit.numerator = 2.0;
        unit.data_version = "v2".to_string();
        repo.update(&unit).await.unwrap();

        let found = repo.find_by_id("u-1").await.unwrap().unwrap();
        assert_eq!(found.weight, 0.5);
        assert_eq!(found.numerator, 2.0);
        assert_eq!(found.data_version, "v2");
    }
}
