//! # Repository Pattern Implementation
//!
//! This module provides repository traits and implementations for data access.
//! Each mirrored catalog has a repository implementing the shared
//! [`CatalogRepository`] interface the sync engine reconciles through, and
//! the register data (prices, stock) has simpler keyed repositories.
//!
//! ## Architecture
//!
//! - Traits define the interface for each repository
//! - SQLite implementations use sqlx for async database access
//! - All operations return `Result<T>` for error handling
//! - Pagination is supported via the `Page<T>` wrapper
//!
//! ## Available Repositories
//!
//! - `NomenclatureRepository` - Products and product groups
//! - `NomenclatureTypeRepository` - Product categories
//! - `ManufacturerRepository` - Manufacturers (flat)
//! - `MeasurementUnitRepository` - Packaging/measurement units
//! - `PriceRepository` - Current price per nomenclature item
//! - `StockRepository` - Warehouse balances per nomenclature item
//! - `SyncLogRepository` - Append-only sync audit trail
//! - `SettingsRepository` - Versioned site settings documents

use crate::models::CatalogRow;
use crate::Result;
use async_trait::async_trait;

pub mod manufacturer;
pub mod measurement_unit;
pub mod nomenclature;
pub mod nomenclature_type;
pub mod pagination;
pub mod price;
pub mod settings;
pub mod stock;
pub mod sync_log;

pub use manufacturer::{ManufacturerRepository, SqliteManufacturerRepository};
pub use measurement_unit::{MeasurementUnitRepository, SqliteMeasurementUnitRepository};
pub use nomenclature::{NomenclatureRepository, SqliteNomenclatureRepository};
pub use nomenclature_type::{NomenclatureTypeRepository, SqliteNomenclatureTypeRepository};
pub use pagination::{Page, PageRequest};
pub use price::{PriceRepository, SqlitePriceRepository};
pub use settings::{SettingsRepository, SqliteSettingsRepository};
pub use stock::{SqliteStockRepository, StockRepository};
pub use sync_log::{SqliteSyncLogRepository, SyncLogRepository};

/// Rows per INSERT statement during an initial bulk load. The whole load runs
/// in one transaction; chunking keeps each statement's bind-parameter count
/// inside SQLite's limits.
pub const INSERT_CHUNK_ROWS: usize = 100;

/// Version fingerprint of a stored catalog row, used to decide per-row
/// reconciliation actions without loading full rows
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RowVersion {
    pub id: String,
    pub data_version: String,
    pub deletion_mark: bool,
}

/// Write interface shared by every catalog-shaped repository
///
/// The sync engine drives initial loads and incremental reconciliation
/// through this trait; entity-specific read methods live on the concrete
/// repository traits.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Row type this repository persists
    type Row: CatalogRow + Clone + Send + Sync;

    /// Count all rows, deletion-marked ones included
    async fn count(&self) -> Result<i64>;

    /// Load the version fingerprint of every stored row
    async fn versions(&self) -> Result<Vec<RowVersion>>;

    /// Insert a single row
    async fn insert(&self, row: &Self::Row) -> Result<()>;

    /// Insert many rows inside one transaction, chunked at
    /// [`INSERT_CHUNK_ROWS`] per statement
    async fn insert_batch(&self, rows: &[Self::Row]) -> Result<()>;

    /// Rewrite every column of an existing row
    async fn update(&self, row: &Self::Row) -> Result<()>;

    /// Flip only the deletion mark of an existing row
    async fn set_deletion_mark(&self, id: &str, deletion_mark: bool) -> Result<()>;
}
