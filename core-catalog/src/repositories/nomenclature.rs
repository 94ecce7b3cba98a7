//! Nomenclature repository trait and implementation

use crate::error::{CatalogError, Result};
use crate::models::Nomenclature;
use crate::repositories::{
    CatalogRepository, Page, PageRequest, RowVersion, INSERT_CHUNK_ROWS,
};
use async_trait::async_trait;
use sqlx::{query_as, QueryBuilder, SqlitePool};

/// Nomenclature-specific read operations on top of [`CatalogRepository`]
#[async_trait]
pub trait NomenclatureRepository: CatalogRepository<Row = Nomenclature> {
    /// Find an item by its ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Nomenclature>>;

    /// Query items with pagination, ordered by name
    async fn query(&self, page_request: PageRequest) -> Result<Page<Nomenclature>>;

    /// Query the direct children of a group
    async fn query_by_parent(&self, parent_id: &str) -> Result<Vec<Nomenclature>>;
}

/// SQLite implementation of the nomenclature repository
pub struct SqliteNomenclatureRepository {
    pool: SqlitePool,
}

impl SqliteNomenclatureRepository {
    /// Create a new SQLite nomenclature repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for SqliteNomenclatureRepository {
    type Row = Nomenclature;

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM nomenclatures")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    async fn versions(&self) -> Result<Vec<RowVersion>> {
        let versions = query_as::<_, RowVersion>(
            "SELECT id, data_version, deletion_mark FROM nomenclatures",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(versions)
    }

    async fn insert(&self, row: &Nomenclature) -> Result<()> {
        row.validate().map_err(|msg| CatalogError::InvalidInput {
            field: "nomenclature".to_string(),
            message: msg,
        })?;

        sqlx::query(
            r#"
            INSERT INTO nomenclatures (
                id, parent_id, type_id, is_folder,
                name, code, description,
                data_version, deletion_mark,
                unit_id, base_unit, manufacturer_id,
                is_weight_goods, minimum_weight, show_on_website, cover_image
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.parent_id)
        .bind(&row.type_id)
        .bind(row.is_folder)
        .bind(&row.name)
        .bind(&row.code)
        .bind(&row.description)
        .bind(&row.data_version)
        .bind(row.deletion_mark)
        .bind(&row.unit_id)
        .bind(&row.base_unit)
        .bind(&row.manufacturer_id)
        .bind(row.is_weight_goods)
        .bind(row.minimum_weight)
        .bind(row.show_on_website)
        .bind(&row.cover_image)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_batch(&self, rows: &[Nomenclature]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        for row in rows {
            row.validate().map_err(|msg| CatalogError::InvalidInput {
                field: "nomenclature".to_string(),
                message: msg,
            })?;
        }

        let mut tx = self.pool.begin().await?;

        for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
            let mut builder = QueryBuilder::new(
                "INSERT INTO nomenclatures (
                    id, parent_id, type_id, is_folder,
                    name, code, description,
                    data_version, deletion_mark,
                    unit_id, base_unit, manufacturer_id,
                    is_weight_goods, minimum_weight, show_on_website, cover_image
                ) ",
            );

            builder.push_values(chunk, |mut b, row| {
                b.push_bind(&row.id)
                    .push_bind(&row.parent_id)
                    .push_bind(&row.type_id)
                    .push_bind(row.is_folder)
                    .push_bind(&row.name)
                    .push_bind(&row.code)
                    .push_bind(&row.description)
                    .push_bind(&row.data_version)
                    .push_bind(row.deletion_mark)
                    .push_bind(&row.unit_id)
                    .push_bind(&row.base_unit)
                    .push_bind(&row.manufacturer_id)
                    .push_bind(row.is_weight_goods)
                    .push_bind(row.minimum_weight)
                    .push_bind(row.show_on_website)
                    .push_bind(&row.cover_image);
            });

            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn update(&self, row: &Nomenclature) -> Result<()> {
        row.validate().map_err(|msg| CatalogError::InvalidInput {
            field: "nomenclature".to_string(),
            message: msg,
        })?;

        let result = sqlx::query(
            r#"
            UPDATE nomenclatures SET
                parent_id = ?, type_id = ?, is_folder = ?,
                name = ?, code = ?, description = ?,
                data_version = ?, deletion_mark = ?,
                unit_id = ?, base_unit = ?, manufacturer_id = ?,
                is_weight_goods = ?, minimum_weight = ?, show_on_website = ?, cover_image = ?
            WHERE id = ?
            "#,
        )
        .bind(&row.parent_id)
        .bind(&row.type_id)
        .bind(row.is_folder)
        .bind(&row.name)
        .bind(&row.code)
        .bind(&row.description)
        .bind(&row.data_version)
        .bind(row.deletion_mark)
        .bind(&row.unit_id)
        .bind(&row.base_unit)
        .bind(&row.manufacturer_id)
        .bind(row.is_weight_goods)
        .bind(row.minimum_weight)
        .bind(row.show_on_website)
        .bind(&row.cover_image)
        .bind(&row.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound {
                entity_type: "Nomenclature".to_string(),
                id: row.id.clone(),
            });
        }

        Ok(())
    }

    async fn set_deletion_mark(&self, id: &str, deletion_mark: bool) -> Result<()> {
        let result = sqlx::query("UPDATE nomenclatures SET deletion_mark = ? WHERE id = ?")
            .bind(deletion_mark)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound {
                entity_type: "Nomenclature".to_string(),
                id: id.to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl NomenclatureRepository for SqliteNomenclatureRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Nomenclature>> {
        let item = query_as::<_, Nomenclature>("SELECT * FROM nomenclatures WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    async fn query(&self, page_request: PageRequest) -> Result<Page<Nomenclature>> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM nomenclatures")
            .fetch_one(&self.pool)
            .await?;

        let items =
            query_as::<_, Nomenclature>("SELECT * FROM nomenclatures ORDER BY name LIMIT ? OFFSET ?")
                .bind(page_request.limit as i64)
                .bind(page_request.offset as i64)
                .fetch_all(&self.pool)
                .await?;

        Ok(Page::new(items, total.0 as u64, page_request))
    }

    async fn query_by_parent(&self, parent_id: &str) -> Result<Vec<Nomenclature>> {
        let items = query_as::<_, Nomenclature>(
            "SELECT * FROM nomenclatures WHERE parent_id = ? ORDER BY name",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}
