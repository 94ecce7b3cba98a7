//! # Catalog Sync Module
//!
//! Orchestrates snapshot synchronization with the external catalog system.
//!
//! ## Overview
//!
//! This module turns full catalog snapshots into mirror-table writes:
//! - Fetching snapshots through the [`CatalogSource`] abstraction
//! - Fingerprinting payloads to skip unchanged runs
//! - Normalizing raw records into mirror rows
//! - Ordering hierarchical catalogs so parents land before children
//! - Reconciling per row against stored versions and deletion marks
//! - Recording every run in the append-only sync log
//!
//! ## Components
//!
//! - **Sync Engine** (`engine`): Orchestrates the whole run per sync type
//! - **Catalog Source** (`source`): Fetch trait and raw record types the engine consumes
//! - **Normalizer** (`normalizer`): Raw record to mirror row conversion
//! - **Hierarchy** (`hierarchy`): Breadth-first level separation of parent/child catalogs
//! - **Guids** (`guids`): Validated guid contract resolved from stored settings
//! - **Fingerprint** (`fingerprint`): Payload hashing for change detection

pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod guids;
pub mod hierarchy;
pub mod normalizer;
pub mod source;

pub use error::{Result, SyncError};
pub use engine::{Role, SyncEngine, SyncReport};
pub use fingerprint::payload_fingerprint;
pub use guids::SyncGuids;
pub use hierarchy::{separate_into_levels, HierarchyLevel};
pub use source::{
    AttachedFileRecord, CatalogSource, ManufacturerRecord, MeasurementUnitRecord,
    NomenclatureRecord, NomenclatureTypeRecord, PriceRecord, PropertyScalar, PropertyValue,
    SourceError, SourceResult, StockRecord,
};
