//! # Catalog Source Contract
//!
//! Defines the boundary between the sync engine and whatever system the
//! catalogs are mirrored from. Provider crates implement [`CatalogSource`]
//! and hand back the neutral record types in this module; the engine never
//! sees wire formats.
//!
//! Every fetch returns the full current snapshot for its entity type. A
//! source that cannot produce the snapshot must return an error rather than
//! an empty list, so the orchestrator's fetch step fails loudly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a catalog source can produce
#[derive(Error, Debug)]
pub enum SourceError {
    /// The request never produced a usable response (network, timeout)
    #[error("Request failed: {0}")]
    Request(String),

    /// The source answered with an explicit error payload
    #[error("Source rejected the query: {code}: {message}")]
    Rejected { code: String, message: String },

    /// The response arrived but could not be decoded
    #[error("Malformed source payload: {0}")]
    Malformed(String),
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// A scalar additional-property value as the source delivers it
///
/// Property values arrive untyped; the variant order matters for untagged
/// deserialization (booleans before numbers before text).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyScalar {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl PropertyScalar {
    /// The boolean value, if this scalar is a flag
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            PropertyScalar::Flag(value) => Some(*value),
            _ => None,
        }
    }
}

/// One additional-property row attached to a nomenclature record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyValue {
    /// Property definition this value belongs to (guid)
    pub property_id: String,
    pub value: PropertyScalar,
}

/// Raw nomenclature record
///
/// Reference fields are raw guid strings; the zero guid and the empty
/// string both mean "no reference" and are resolved during normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NomenclatureRecord {
    pub id: String,
    pub parent_id: String,
    pub type_id: String,
    pub is_folder: bool,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub unit_id: String,
    pub manufacturer_id: Option<String>,
    /// Sold by weight
    pub use_weight: bool,
    pub data_version: String,
    pub deletion_mark: bool,
    pub properties: Vec<PropertyValue>,
}

/// Raw attached-file record for nomenclature cover images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachedFileRecord {
    pub id: String,
    /// Nomenclature item the file belongs to
    pub owner_id: String,
    /// Storage path as the source reports it, backslash separators
    pub path: String,
}

/// Raw nomenclature type record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NomenclatureTypeRecord {
    pub id: String,
    pub parent_id: String,
    pub is_folder: bool,
    pub name: String,
    pub description: Option<String>,
    pub data_version: String,
    pub deletion_mark: bool,
}

/// Raw manufacturer record; the source query already excludes folders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturerRecord {
    pub id: String,
    pub name: String,
    pub data_version: String,
    pub deletion_mark: bool,
}

/// Raw measurement unit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementUnitRecord {
    pub id: String,
    /// Owning nomenclature item
    pub owner_id: String,
    pub name: String,
    /// Unit weight in kilograms
    pub weight: f64,
    pub numerator: f64,
    pub denominator: f64,
    pub data_version: String,
    pub deletion_mark: bool,
}

/// Raw price register row from the latest-slice query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub nomenclature_id: String,
    pub package_id: String,
    pub price: f64,
    /// Source datetime string, `YYYY-MM-DDTHH:MM:SS`
    pub period: String,
    /// Document reference that recorded the price
    pub recorder: String,
}

/// Raw stock register row with warehouse balances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub nomenclature_id: String,
    pub available: f64,
    pub reserved_stock: f64,
    pub reserved_orders: f64,
}

/// Full-snapshot fetch operations against the external catalog system
///
/// Register fetches take the configured guid their server-side filter
/// needs; catalog fetches are parameterless because their filters are
/// fixed.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// All nomenclature items that are not deletion-marked at the source
    async fn fetch_nomenclature(&self) -> SourceResult<Vec<NomenclatureRecord>>;

    /// Attached image files for nomenclature items
    async fn fetch_nomenclature_files(&self) -> SourceResult<Vec<AttachedFileRecord>>;

    /// All nomenclature types, including deletion-marked ones
    async fn fetch_nomenclature_types(&self) -> SourceResult<Vec<NomenclatureTypeRecord>>;

    /// All manufacturers (folders excluded at the source)
    async fn fetch_manufacturers(&self) -> SourceResult<Vec<ManufacturerRecord>>;

    /// All packaging/measurement units
    async fn fetch_measurement_units(&self) -> SourceResult<Vec<MeasurementUnitRecord>>;

    /// Latest price slice for the given price type
    async fn fetch_prices(&self, price_type_id: &str) -> SourceResult<Vec<PriceRecord>>;

    /// Free-stock balances for the given warehouse
    async fn fetch_stock(&self, warehouse_id: &str) -> SourceResult<Vec<StockRecord>>;
}
