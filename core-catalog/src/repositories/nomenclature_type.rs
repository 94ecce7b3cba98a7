//! Nomenclature type repository trait and implementation

use crate::error::{CatalogError, Result};
use crate::models::NomenclatureType;
use crate::repositories::{CatalogRepository, RowVersion, INSERT_CHUNK_ROWS};
use async_trait::async_trait;
use sqlx::{query_as, QueryBuilder, SqlitePool};

/// Nomenclature-type-specific read operations
#[async_trait]
pub trait NomenclatureTypeRepository: CatalogRepository<Row = NomenclatureType> {
    /// Find a type by its ID
    async fn find_by_id(&self, id: &str) -> Result<Option<NomenclatureType>>;

    /// All types, ordered by name
    async fn find_all(&self) -> Result<Vec<NomenclatureType>>;
}

/// SQLite implementation of the nomenclature type repository
pub struct SqliteNomenclatureTypeRepository {
    pool: SqlitePool,
}

impl SqliteNomenclatureTypeRepository {
    /// Create a new SQLite nomenclature type repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for SqliteNomenclatureTypeRepository {
    type Row = NomenclatureType;

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM nomenclature_types")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    async fn versions(&self) -> Result<Vec<RowVersion>> {
        let versions = query_as::<_, RowVersion>(
            "SELECT id, data_version, deletion_mark FROM nomenclature_types",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(versions)
    }

    async fn insert(&self, row: &NomenclatureType) -> Result<()> {
        row.validate().map_err(|msg| CatalogError::InvalidInput {
            field: "nomenclature_type".to_string(),
            message: msg,
        })?;

        sqlx::query(
            r#"
            INSERT INTO nomenclature_types (
                id, parent_id, is_folder, name, description, data_version, deletion_mark
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.parent_id)
        .bind(row.is_folder)
        .bind(&row.name)
        .bind(&row.description)
        .bind(&row.data_version)
        .bind(row.deletion_mark)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_batch(&self, rows: &[NomenclatureType]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        for row in rows {
            row.validate().map_err(|msg| CatalogError::InvalidInput {
                field: "nomenclature_type".to_string(),
                message: msg,
            })?;
        }

        let mut tx = self.pool.begin().await?;

        for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
            let mut builder = QueryBuilder::new(
                "INSERT INTO nomenclature_types (
                    id, parent_id, is_folder, name, description, data_version, deletion_mark
                ) ",
            );

            builder.push_values(chunk, |mut b, row| {
                b.push_bind(&row.id)
                    .push_bind(&row.parent_id)
                    .push_bind(row.is_folder)
                    .push_bind(&row.name)
                    .push_bind(&row.description)
                    .push_bind(&row.data_version)
                    .push_bind(row.deletion_mark);
            });

            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn update(&self, row: &NomenclatureType) -> Result<()> {
        row.validate().map_err(|msg| CatalogError::InvalidInput {
            field: "nomenclature_type".to_string(),
            message: msg,
        })?;

        let result = sqlx::query(
            r#"
            UPDATE nomenclature_types SET
                parent_id = ?, is_folder = ?, name = ?, description = ?,
                data_version = ?, deletion_mark = ?
            WHERE id = ?
            "#,
        )
        .bind(&row.parent_id)
        .bind(row.is_folder)
        .bind(&row.name)
        .bind(&row.description)
        .bind(&row.data_version)
        .bind(row.deletion_mark)
        .bind(&row.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound {
                entity_type: "NomenclatureType".to_string(),
                id: row.id.clone(),
            });
        }

        Ok(())
    }

    async fn set_deletion_mark(&self, id: &str, deletion_mark: bool) -> Result<()> {
        let result = sqlx::query("UPDATE nomenclature_types SET deletion_mark = ? WHERE id = ?")
            .bind(deletion_mark)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound {
                entity_type: "NomenclatureType".to_string(),
                id: id.to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl NomenclatureTypeRepository for SqliteNomenclatureTypeRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<NomenclatureType>> {
        let row = query_as::<_, NomenclatureType>("SELECT * FROM nomenclature_types WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_all(&self) -> Result<Vec<NomenclatureType>> {
        let rows = query_as::<_, NomenclatureType>("SELECT * FROM nomenclature_types ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    fn test_type(id: &str, parent: Option<&str>) -> NomenclatureType {
        NomenclatureType {
            id: id.to_string(),
            parent_id: parent.map(String::from),
            is_folder: parent.is_none(),
            name: format!("Type {}", id),
            description: None,
            data_version: "v1".to_string(),
            deletion_mark: false,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_all() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteNomenclatureTypeRepository::new(pool);

        repo.insert(&test_type("root", None)).await.unwrap();
        repo.insert(&test_type("leaf", Some("root"))).await.unwrap();

        let all = repo.find_all().await.unwrap();
        assert_eq!(all.len(), 2);

        let leaf = repo.find_by_id("leaf").await.unwrap().unwrap();
        assert_eq!(leaf.parent_id.as_deref(), Some("root"));
    }

    #[tokio::test]
    async fn test_batch_then_reconcile_writes() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteNomenclatureTypeRepository::new(pool);

        let rows = vec![test_type("a", None), test_type("b", Some("a"))];
        repo.insert_batch(&rows).await.unwrap();

        let mut updated = rows[1].clone();
        updated.name = "Renamed".to_string();
        updated.data_version = "v2".to_string();
        repo.update(&updated).await.unwrap();
        repo.set_deletion_mark("a", true).await.unwrap();

        let versions = repo.versions().await.unwrap();
        let a = versions.iter().find(|v| v.id == "a").unwrap();
        let b = versions.iter().find(|v| v.id == "b").unwrap();
        assert!(a.deletion_mark);
        assert_eq!(b.data_version, "v2");
    }
}
