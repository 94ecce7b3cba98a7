//! # Catalog Domain Models
//!
//! Typed rows for the mirrored 1C catalogs, the sync audit log, and the
//! versioned site settings document.
//!
//! ## Overview
//!
//! All catalog identifiers are the source-assigned GUID strings; the mirror
//! never invents ids of its own. Hierarchical catalogs carry an optional
//! `parent_id` and an opaque `data_version` change token that is compared for
//! equality only. Deletion is always the mirrored `deletion_mark` flag, never
//! a removed row.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for a sync log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncLogId(Uuid);

impl SyncLogId {
    /// Create a new random sync log ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a sync log ID from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID
    pub fn from_string(s: &str) -> crate::Result<Self> {
        Ok(Self(Uuid::parse_str(s).map_err(|e| {
            crate::CatalogError::InvalidStoredValue {
                field: "sync_log.id".to_string(),
                message: e.to_string(),
            }
        })?))
    }

    /// Get the string representation of this ID
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for SyncLogId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SyncLogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SyncLogId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

// ============================================================================
// Sync Enums
// ============================================================================

/// Catalog entity types the engine can synchronize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncType {
    Nomenclature,
    Prices,
    Manufacturers,
    MeasurementUnits,
    NomenclatureTypes,
    Stock,
}

impl SyncType {
    /// Every sync type, in the order `sync all` runs them: referenced
    /// catalogs first, then nomenclature, then the register data.
    pub const ALL: [SyncType; 6] = [
        SyncType::NomenclatureTypes,
        SyncType::Manufacturers,
        SyncType::MeasurementUnits,
        SyncType::Nomenclature,
        SyncType::Prices,
        SyncType::Stock,
    ];

    /// Get the string representation (matches the stored column value)
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncType::Nomenclature => "nomenclature",
            SyncType::Prices => "prices",
            SyncType::Manufacturers => "manufacturers",
            SyncType::MeasurementUnits => "measurement-units",
            SyncType::NomenclatureTypes => "nomenclature-types",
            SyncType::Stock => "stock",
        }
    }

    /// Stable index of this type, used for per-type bookkeeping tables
    pub fn index(&self) -> usize {
        match self {
            SyncType::Nomenclature => 0,
            SyncType::Prices => 1,
            SyncType::Manufacturers => 2,
            SyncType::MeasurementUnits => 3,
            SyncType::NomenclatureTypes => 4,
            SyncType::Stock => 5,
        }
    }
}

impl FromStr for SyncType {
    type Err = crate::CatalogError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "nomenclature" => Ok(SyncType::Nomenclature),
            "prices" => Ok(SyncType::Prices),
            "manufacturers" => Ok(SyncType::Manufacturers),
            "measurement-units" => Ok(SyncType::MeasurementUnits),
            "nomenclature-types" => Ok(SyncType::NomenclatureTypes),
            "stock" => Ok(SyncType::Stock),
            _ => Err(crate::CatalogError::InvalidStoredValue {
                field: "sync_type".to_string(),
                message: format!("unknown sync type: {}", s),
            }),
        }
    }
}

impl std::fmt::Display for SyncType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome recorded for a sync run
///
/// Failed runs abort before logging, so the engine itself only ever writes
/// `Success` and `Ignored`; `Error` completes the stored vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Error,
    Ignored,
}

impl SyncStatus {
    /// Get the string representation (matches the stored column value)
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Error => "error",
            SyncStatus::Ignored => "ignored",
        }
    }
}

impl FromStr for SyncStatus {
    type Err = crate::CatalogError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "success" => Ok(SyncStatus::Success),
            "error" => Ok(SyncStatus::Error),
            "ignored" => Ok(SyncStatus::Ignored),
            _ => Err(crate::CatalogError::InvalidStoredValue {
                field: "sync_status".to_string(),
                message: format!("unknown sync status: {}", s),
            }),
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Base measurement unit a nomenclature item is sold in, resolved during
/// normalization by comparing the unit reference against the configured
/// kilogram/piece GUIDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BaseUnit {
    Kilogram,
    Piece,
}

// ============================================================================
// Sync Log
// ============================================================================

/// Per-run counters embedded in a sync log entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncMeta {
    /// Records returned by the source for this run
    pub fetched: u64,
    /// Rows inserted
    pub created: u64,
    /// Rows rewritten because their data version changed
    pub updated: u64,
    /// Rows whose deletion mark was flipped
    pub marked_deleted: u64,
    /// Records skipped without touching the store
    pub ignored: u64,
}

impl SyncMeta {
    /// Counters for a run that fetched `count` records and has written
    /// nothing yet
    pub fn with_fetched(count: u64) -> Self {
        Self {
            fetched: count,
            ..Self::default()
        }
    }

    /// Counters for a short-circuited run: everything fetched, everything
    /// ignored
    pub fn all_ignored(count: u64) -> Self {
        Self {
            fetched: count,
            ignored: count,
            ..Self::default()
        }
    }
}

/// One entry in the append-only sync audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLog {
    pub id: SyncLogId,
    pub sync_type: SyncType,
    /// Content hash of the full payload fetched for this run
    pub data_hash: String,
    pub status: SyncStatus,
    pub metadata: SyncMeta,
    /// Unix timestamp (seconds)
    pub created_at: i64,
}

impl SyncLog {
    /// Create a log entry for a run that just finished
    pub fn new(sync_type: SyncType, data_hash: impl Into<String>, status: SyncStatus, metadata: SyncMeta) -> Self {
        Self {
            id: SyncLogId::new(),
            sync_type,
            data_hash: data_hash.into(),
            status,
            metadata,
            created_at: current_timestamp(),
        }
    }
}

// ============================================================================
// Catalog Rows
// ============================================================================

/// Common view over catalog-shaped rows used by leveling and reconciliation
pub trait CatalogRow {
    /// Source-assigned GUID string
    fn id(&self) -> &str;
    /// Parent reference within the same catalog, if any
    fn parent_id(&self) -> Option<&str>;
    /// Opaque change token; equality comparison only
    fn data_version(&self) -> &str;
    /// Mirrored soft-delete flag
    fn deletion_mark(&self) -> bool;
}

/// A product or product group from `Catalog_Номенклатура`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Nomenclature {
    pub id: String,
    pub parent_id: Option<String>,
    /// Nomenclature type reference
    pub type_id: Option<String>,
    pub is_folder: bool,
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
    pub data_version: String,
    pub deletion_mark: bool,
    /// Measurement unit reference
    pub unit_id: Option<String>,
    /// Resolved base unit, when the unit reference matches a configured GUID
    pub base_unit: Option<BaseUnit>,
    pub manufacturer_id: Option<String>,
    /// Sold by weight rather than by piece
    pub is_weight_goods: bool,
    /// Minimum non-divisible weight for weighed goods
    pub minimum_weight: Option<f64>,
    pub show_on_website: bool,
    /// Path of the attached cover image, forward slashes
    pub cover_image: Option<String>,
}

impl Nomenclature {
    /// Validate row invariants before persistence
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id must not be empty".to_string());
        }
        Ok(())
    }
}

impl CatalogRow for Nomenclature {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    fn data_version(&self) -> &str {
        &self.data_version
    }

    fn deletion_mark(&self) -> bool {
        self.deletion_mark
    }
}

/// A nomenclature type (product category) from `Catalog_ВидыНоменклатуры`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NomenclatureType {
    pub id: String,
    pub parent_id: Option<String>,
    pub is_folder: bool,
    pub name: String,
    pub description: Option<String>,
    pub data_version: String,
    pub deletion_mark: bool,
}

impl NomenclatureType {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id must not be empty".to_string());
        }
        Ok(())
    }
}

impl CatalogRow for NomenclatureType {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    fn data_version(&self) -> &str {
        &self.data_version
    }

    fn deletion_mark(&self) -> bool {
        self.deletion_mark
    }
}

/// A manufacturer from `Catalog_Производители`; the source query excludes
/// folders, so the catalog is flat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Manufacturer {
    pub id: String,
    pub name: String,
    pub data_version: String,
    pub deletion_mark: bool,
}

impl Manufacturer {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id must not be empty".to_string());
        }
        Ok(())
    }
}

impl CatalogRow for Manufacturer {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        None
    }

    fn data_version(&self) -> &str {
        &self.data_version
    }

    fn deletion_mark(&self) -> bool {
        self.deletion_mark
    }
}

/// A packaging/measurement unit from `Catalog_УпаковкиЕдиницыИзмерения`,
/// owned by a nomenclature item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MeasurementUnit {
    pub id: String,
    /// Owning nomenclature reference
    pub owner_id: Option<String>,
    pub name: String,
    /// Unit weight in kilograms
    pub weight: f64,
    pub numerator: f64,
    pub denominator: f64,
    pub data_version: String,
    pub deletion_mark: bool,
}

impl MeasurementUnit {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id must not be empty".to_string());
        }
        Ok(())
    }
}

impl CatalogRow for MeasurementUnit {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        None
    }

    fn data_version(&self) -> &str {
        &self.data_version
    }

    fn deletion_mark(&self) -> bool {
        self.deletion_mark
    }
}

// ============================================================================
// Register Rows
// ============================================================================

/// Current price of a nomenclature item, taken from the price register
/// slice; register rows carry no data version and no deletion mark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PriceEntry {
    pub nomenclature_id: String,
    pub package_id: Option<String>,
    pub price: f64,
    /// Unix timestamp the price became effective, if the source supplied one
    pub period: Option<i64>,
    /// Document that recorded the price
    pub recorder: Option<String>,
}

impl PriceEntry {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.nomenclature_id.trim().is_empty() {
            return Err("nomenclature_id must not be empty".to_string());
        }
        Ok(())
    }
}

/// Warehouse balances for a nomenclature item from the free-stock register
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StockLevel {
    pub nomenclature_id: String,
    pub available: f64,
    pub reserved_stock: f64,
    pub reserved_orders: f64,
}

impl StockLevel {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.nomenclature_id.trim().is_empty() {
            return Err("nomenclature_id must not be empty".to_string());
        }
        Ok(())
    }

    /// Quantity that can still be sold
    pub fn sellable(&self) -> f64 {
        self.available - self.reserved_stock - self.reserved_orders
    }
}

// ============================================================================
// Site Settings
// ============================================================================

/// Stored settings document; every field is optional in storage, the sync
/// engine validates the exact shape it needs at run time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guids_for_sync: Option<GuidsForSync>,
}

/// GUID constants the sync engine resolves against source data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuidsForSync {
    /// Warehouse used for the stock balance filter
    pub warehouse: Option<String>,
    /// Price type used for the price register slice
    pub default_price_type: Option<String>,
    pub units: Option<UnitGuids>,
    pub nomenclature: Option<NomenclatureGuids>,
    pub user: Option<UserGuids>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnitGuids {
    pub kilogram: Option<String>,
    pub piece: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NomenclatureGuids {
    /// Additional-property GUID for the minimum non-divisible weight
    pub minimum_weight: Option<String>,
    /// Additional-property GUID for storefront visibility
    pub show_on_website: Option<String>,
}

/// User-directory property GUIDs carried for the storefront; the engine does
/// not run a user sync, but the settings contract keeps the full set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserGuids {
    pub show_on_website: Option<String>,
    pub site_password: Option<String>,
    pub site_role: Option<String>,
    pub role_admin_value: Option<String>,
    pub role_employee_value: Option<String>,
}

/// A stored settings document with its storage metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsRecord {
    pub id: i64,
    pub settings: SiteSettings,
    /// Unix timestamp (seconds)
    pub created_at: i64,
}

/// Current unix timestamp in seconds
pub(crate) fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_type_round_trip() {
        for sync_type in SyncType::ALL {
            let parsed: SyncType = sync_type.as_str().parse().unwrap();
            assert_eq!(parsed, sync_type);
        }
    }

    #[test]
    fn test_sync_type_rejects_unknown() {
        let result = "users".parse::<SyncType>();
        assert!(result.is_err());
    }

    #[test]
    fn test_sync_type_serde_matches_as_str() {
        let json = serde_json::to_string(&SyncType::MeasurementUnits).unwrap();
        assert_eq!(json, "\"measurement-units\"");

        let json = serde_json::to_string(&SyncType::NomenclatureTypes).unwrap();
        assert_eq!(json, "\"nomenclature-types\"");
    }

    #[test]
    fn test_sync_status_round_trip() {
        for status in [SyncStatus::Success, SyncStatus::Error, SyncStatus::Ignored] {
            let parsed: SyncStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_sync_log_id_round_trip() {
        let id = SyncLogId::new();
        let parsed = SyncLogId::from_string(&id.as_str()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_sync_log_id_rejects_garbage() {
        assert!(SyncLogId::from_string("not-a-uuid").is_err());
    }

    #[test]
    fn test_sync_meta_defaults_to_zero() {
        let meta = SyncMeta::default();
        assert_eq!(meta.fetched, 0);
        assert_eq!(meta.created, 0);
        assert_eq!(meta.updated, 0);
        assert_eq!(meta.marked_deleted, 0);
        assert_eq!(meta.ignored, 0);
    }

    #[test]
    fn test_sync_meta_all_ignored() {
        let meta = SyncMeta::all_ignored(42);
        assert_eq!(meta.fetched, 42);
        assert_eq!(meta.ignored, 42);
        assert_eq!(meta.created, 0);
    }

    #[test]
    fn test_sync_meta_json_shape() {
        let meta = SyncMeta {
            fetched: 10,
            created: 3,
            updated: 2,
            marked_deleted: 1,
            ignored: 0,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["fetched"], 10);
        assert_eq!(json["markedDeleted"], 1);

        // Older log rows may miss counters added later; they decode as zero.
        let partial: SyncMeta = serde_json::from_str(r#"{"fetched": 5}"#).unwrap();
        assert_eq!(partial.fetched, 5);
        assert_eq!(partial.created, 0);
    }

    #[test]
    fn test_sync_log_new_fills_identity() {
        let log = SyncLog::new(
            SyncType::Nomenclature,
            "abc123",
            SyncStatus::Success,
            SyncMeta::with_fetched(7),
        );
        assert_eq!(log.sync_type, SyncType::Nomenclature);
        assert_eq!(log.data_hash, "abc123");
        assert!(log.created_at > 0);
        assert_eq!(log.metadata.fetched, 7);
    }

    #[test]
    fn test_catalog_row_accessors() {
        let item = Nomenclature {
            id: "item-1".to_string(),
            parent_id: Some("group-1".to_string()),
            type_id: None,
            is_folder: false,
            name: "Sugar".to_string(),
            code: Some("00042".to_string()),
            description: None,
            data_version: "AAA=".to_string(),
            deletion_mark: false,
            unit_id: None,
            base_unit: Some(BaseUnit::Kilogram),
            manufacturer_id: None,
            is_weight_goods: true,
            minimum_weight: Some(0.1),
            show_on_website: true,
            cover_image: None,
        };

        assert_eq!(CatalogRow::id(&item), "item-1");
        assert_eq!(CatalogRow::parent_id(&item), Some("group-1"));
        assert_eq!(CatalogRow::data_version(&item), "AAA=");
        assert!(!CatalogRow::deletion_mark(&item));
    }

    #[test]
    fn test_manufacturer_is_flat() {
        let maker = Manufacturer {
            id: "maker-1".to_string(),
            name: "Acme".to_string(),
            data_version: "v1".to_string(),
            deletion_mark: false,
        };
        assert_eq!(CatalogRow::parent_id(&maker), None);
    }

    #[test]
    fn test_validate_rejects_empty_id() {
        let maker = Manufacturer {
            id: "   ".to_string(),
            name: "Acme".to_string(),
            data_version: "v1".to_string(),
            deletion_mark: false,
        };
        assert!(maker.validate().is_err());
    }

    #[test]
    fn test_stock_sellable() {
        let stock = StockLevel {
            nomenclature_id: "item-1".to_string(),
            available: 10.0,
            reserved_stock: 2.5,
            reserved_orders: 1.5,
        };
        assert!((stock.sellable() - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_site_settings_partial_document() {
        let json = r#"{
            "guidsForSync": {
                "warehouse": "w-1",
                "units": { "kilogram": "kg-1" }
            }
        }"#;
        let settings: SiteSettings = serde_json::from_str(json).unwrap();
        let guids = settings.guids_for_sync.unwrap();
        assert_eq!(guids.warehouse.as_deref(), Some("w-1"));
        assert_eq!(guids.units.unwrap().kilogram.as_deref(), Some("kg-1"));
        assert!(guids.user.is_none());
    }

    #[test]
    fn test_site_settings_camel_case_round_trip() {
        let settings = SiteSettings {
            guids_for_sync: Some(GuidsForSync {
                warehouse: Some("w-1".to_string()),
                default_price_type: Some("pt-1".to_string()),
                units: None,
                nomenclature: Some(NomenclatureGuids {
                    minimum_weight: Some("p-min".to_string()),
                    show_on_website: None,
                }),
                user: None,
            }),
        };

        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["guidsForSync"]["defaultPriceType"], "pt-1");
        assert_eq!(json["guidsForSync"]["nomenclature"]["minimumWeight"], "p-min");

        let back: SiteSettings = serde_json::from_value(json).unwrap();
        assert_eq!(back, settings);
    }
}
