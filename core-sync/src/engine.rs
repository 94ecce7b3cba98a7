//! # Sync Engine
//!
//! Orchestrates snapshot synchronization between the external catalog
//! system and the local mirror database.
//!
//! ## Overview
//!
//! The `SyncEngine` is the central orchestrator for sync operations. For
//! each sync type it:
//! - Resolves the guid contract from the stored settings document
//!   (nomenclature, prices and stock depend on it)
//! - Fetches the full snapshot through a [`CatalogSource`]
//! - Fingerprints the raw payload and compares it with the latest
//!   recorded run
//! - Applies the snapshot as an initial load or an incremental
//!   reconciliation
//! - Records the outcome in the append-only sync log
//!
//! ## Workflow
//!
//! ### Initial load
//! An empty store takes the whole normalized snapshot in one chunked
//! transaction; every inserted row counts as created.
//!
//! ### Incremental reconciliation
//! A populated store is walked hierarchy level by hierarchy level so
//! parents land before their children. Rows absent from the store are
//! inserted, rows whose data version changed are rewritten, and rows
//! whose deletion mark flipped get the flag updated in place. The
//! version and deletion-mark checks are independent of each other.
//!
//! A run whose payload hash matches the latest recorded run writes an
//! `ignored` log entry and changes no catalog rows. Failed runs record
//! nothing at all.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{CatalogSource, Role, SyncEngine};
//! use core_catalog::models::SyncType;
//! use std::sync::Arc;
//!
//! # async fn example(pool: sqlx::SqlitePool, source: Arc<dyn CatalogSource>) -> core_sync::Result<()> {
//! let engine = SyncEngine::new(pool, source);
//!
//! let log = engine.sync(Role::Admin, SyncType::Nomenclature, false).await?;
//! println!("created {} rows", log.metadata.created);
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, SyncError};
use crate::fingerprint::payload_fingerprint;
use crate::guids::SyncGuids;
use crate::hierarchy::separate_into_levels;
use crate::normalizer::{
    attach_cover_images, dedupe_prices, dedupe_stock, normalize_manufacturers,
    normalize_measurement_units, normalize_nomenclature, normalize_nomenclature_types,
    normalize_prices, normalize_stock,
};
use crate::source::CatalogSource;
use core_catalog::models::{
    CatalogRow, PriceEntry, SettingsRecord, SiteSettings, StockLevel, SyncLog, SyncMeta,
    SyncStatus, SyncType,
};
use core_catalog::repositories::{
    CatalogRepository, Page, PageRequest, PriceRepository, RowVersion, SettingsRepository,
    SqliteManufacturerRepository, SqliteMeasurementUnitRepository, SqliteNomenclatureRepository,
    SqliteNomenclatureTypeRepository, SqlitePriceRepository, SqliteSettingsRepository,
    SqliteStockRepository, SqliteSyncLogRepository, StockRepository, SyncLogRepository,
};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

/// Caller role attached to sync and settings requests
///
/// Mirrors the role vocabulary of the storefront the mirror serves; the
/// configured role property on a user resolves to one of these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    /// Whether this role may trigger syncs and write settings
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Outcome of one sync type within a [`SyncEngine::sync_all`] run
#[derive(Debug)]
pub struct SyncReport {
    pub sync_type: SyncType,
    pub outcome: Result<SyncLog>,
}

/// Pre-write decision for a fetched snapshot
enum Decision {
    /// The payload hash matches the latest recorded run
    Unchanged,
    /// The snapshot must be applied against `stored_rows` existing rows
    Apply { stored_rows: i64 },
}

/// Central orchestrator for catalog synchronization
///
/// Owns the source connection and one repository per mirrored table.
/// Runs of the same sync type serialize on a per-type lock; different
/// types can run concurrently.
pub struct SyncEngine {
    source: Arc<dyn CatalogSource>,
    nomenclature: SqliteNomenclatureRepository,
    nomenclature_types: SqliteNomenclatureTypeRepository,
    manufacturers: SqliteManufacturerRepository,
    measurement_units: SqliteMeasurementUnitRepository,
    prices: SqlitePriceRepository,
    stock: SqliteStockRepository,
    sync_logs: SqliteSyncLogRepository,
    settings: SqliteSettingsRepository,
    /// One lock per sync type, indexed by [`SyncType::index`]
    type_locks: [Mutex<()>; 6],
}

impl SyncEngine {
    /// Create an engine over a database pool and a catalog source
    pub fn new(pool: SqlitePool, source: Arc<dyn CatalogSource>) -> Self {
        Self {
            source,
            nomenclature: SqliteNomenclatureRepository::new(pool.clone()),
            nomenclature_types: SqliteNomenclatureTypeRepository::new(pool.clone()),
            manufacturers: SqliteManufacturerRepository::new(pool.clone()),
            measurement_units: SqliteMeasurementUnitRepository::new(pool.clone()),
            prices: SqlitePriceRepository::new(pool.clone()),
            stock: SqliteStockRepository::new(pool.clone()),
            sync_logs: SqliteSyncLogRepository::new(pool.clone()),
            settings: SqliteSettingsRepository::new(pool),
            type_locks: std::array::from_fn(|_| Mutex::new(())),
        }
    }

    /// Run one sync type end to end
    ///
    /// Fetches the full snapshot from the source, decides between an
    /// initial load, an incremental reconciliation and an ignored run,
    /// and records the outcome in the sync log.
    ///
    /// # Arguments
    ///
    /// * `role` - Caller role; only administrators may trigger syncs
    /// * `sync_type` - Which catalog or register to synchronize
    /// * `force_incremental` - Reconcile per row even when the payload
    ///   hash is unchanged or the store is empty
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The caller is not an administrator
    /// - No settings document is stored, or it is missing a sync guid
    ///   (nomenclature, prices and stock only)
    /// - The source fetch fails or returns malformed records
    /// - The snapshot contains a hierarchy cycle
    /// - The database rejects a write, or the final log row is not
    ///   recorded
    ///
    /// No log entry is written when the run fails.
    #[instrument(skip(self), fields(sync_type = %sync_type, force = force_incremental))]
    pub async fn sync(
        &self,
        role: Role,
        sync_type: SyncType,
        force_incremental: bool,
    ) -> Result<SyncLog> {
        if !role.is_admin() {
            warn!("Rejected sync request lacking the administrator role");
            return Err(SyncError::Forbidden);
        }

        // Concurrent runs of the same type serialize here; runs of
        // different types proceed in parallel.
        let _guard = self.type_locks[sync_type.index()].lock().await;
        info!("Starting sync run");

        let result = match sync_type {
            SyncType::Nomenclature => self.sync_nomenclature(force_incremental).await,
            SyncType::NomenclatureTypes => self.sync_nomenclature_types(force_incremental).await,
            SyncType::Manufacturers => self.sync_manufacturers(force_incremental).await,
            SyncType::MeasurementUnits => self.sync_measurement_units(force_incremental).await,
            SyncType::Prices => self.sync_prices(force_incremental).await,
            SyncType::Stock => self.sync_stock(force_incremental).await,
        };

        match &result {
            Ok(log) => info!(
                "Sync run finished with status {}: {} created, {} updated, {} marked deleted, {} ignored",
                log.status,
                log.metadata.created,
                log.metadata.updated,
                log.metadata.marked_deleted,
                log.metadata.ignored
            ),
            Err(e) => error!("Sync run failed: {}", e),
        }

        result
    }

    /// Run every sync type in dependency order
    ///
    /// Referenced catalogs run before nomenclature, register data last.
    /// A failed type never stops the remaining ones; the returned
    /// reports carry one outcome per type in run order.
    #[instrument(skip(self), fields(force = force_incremental))]
    pub async fn sync_all(&self, role: Role, force_incremental: bool) -> Vec<SyncReport> {
        info!("Starting sync of all catalog types");

        let mut reports = Vec::with_capacity(SyncType::ALL.len());
        for sync_type in SyncType::ALL {
            let outcome = self.sync(role, sync_type, force_incremental).await;
            if let Err(e) = &outcome {
                warn!(
                    "{} sync failed, continuing with the remaining types: {}",
                    sync_type, e
                );
            }
            reports.push(SyncReport { sync_type, outcome });
        }

        reports
    }

    /// Page through the audit trail of one sync type, newest first
    pub async fn history(
        &self,
        sync_type: SyncType,
        page_request: PageRequest,
    ) -> Result<Page<SyncLog>> {
        Ok(self.sync_logs.query_by_type(sync_type, page_request).await?)
    }

    /// Total recorded runs for one sync type
    pub async fn history_total(&self, sync_type: SyncType) -> Result<i64> {
        Ok(self.sync_logs.count_by_type(sync_type).await?)
    }

    /// Latest stored settings document, if any
    pub async fn latest_settings(&self) -> Result<Option<SettingsRecord>> {
        Ok(self.settings.find_latest().await?)
    }

    /// Store a new settings revision
    ///
    /// Earlier revisions stay in place; the newest one wins. Requires
    /// the administrator role.
    pub async fn save_settings(
        &self,
        role: Role,
        settings: &SiteSettings,
    ) -> Result<SettingsRecord> {
        if !role.is_admin() {
            warn!("Rejected settings write lacking the administrator role");
            return Err(SyncError::Forbidden);
        }
        Ok(self.settings.insert(settings).await?)
    }

    /// Load the newest settings document and validate the guid contract
    async fn resolve_guids(&self) -> Result<SyncGuids> {
        let record = self
            .settings
            .find_latest()
            .await?
            .ok_or(SyncError::SettingsNotFound)?;
        SyncGuids::from_settings(&record.settings)
    }

    async fn sync_nomenclature(&self, force_incremental: bool) -> Result<SyncLog> {
        // Guid resolution runs before any fetch so a misconfigured site
        // fails fast without touching the source.
        let guids = self.resolve_guids().await?;

        let records = self.source.fetch_nomenclature().await?;
        let files = self.source.fetch_nomenclature_files().await?;
        debug!(
            "Fetched {} nomenclature records and {} attached files",
            records.len(),
            files.len()
        );

        self.run_catalog_snapshot(
            SyncType::Nomenclature,
            &self.nomenclature,
            records,
            force_incremental,
            move |records| {
                let mut rows = normalize_nomenclature(records, &guids)?;
                attach_cover_images(&mut rows, &files);
                Ok(rows)
            },
        )
        .await
    }

    async fn sync_nomenclature_types(&self, force_incremental: bool) -> Result<SyncLog> {
        let records = self.source.fetch_nomenclature_types().await?;
        debug!("Fetched {} nomenclature type records", records.len());

        self.run_catalog_snapshot(
            SyncType::NomenclatureTypes,
            &self.nomenclature_types,
            records,
            force_incremental,
            normalize_nomenclature_types,
        )
        .await
    }

    async fn sync_manufacturers(&self, force_incremental: bool) -> Result<SyncLog> {
        let records = self.source.fetch_manufacturers().await?;
        debug!("Fetched {} manufacturer records", records.len());

        self.run_catalog_snapshot(
            SyncType::Manufacturers,
            &self.manufacturers,
            records,
            force_incremental,
            normalize_manufacturers,
        )
        .await
    }

    async fn sync_measurement_units(&self, force_incremental: bool) -> Result<SyncLog> {
        let records = self.source.fetch_measurement_units().await?;
        debug!("Fetched {} measurement unit records", records.len());

        self.run_catalog_snapshot(
            SyncType::MeasurementUnits,
            &self.measurement_units,
            records,
            force_incremental,
            normalize_measurement_units,
        )
        .await
    }

    async fn sync_prices(&self, force_incremental: bool) -> Result<SyncLog> {
        let guids = self.resolve_guids().await?;

        let records = self.source.fetch_prices(&guids.default_price_type).await?;
        debug!("Fetched {} price records", records.len());

        let data_hash = payload_fingerprint(&records)?;
        let fetched = records.len() as u64;

        match self
            .decide(SyncType::Prices, &data_hash, force_incremental, self.prices.count())
            .await?
        {
            Decision::Unchanged => {
                info!("Snapshot hash matches the latest recorded run, skipping");
                self.record_log(
                    SyncType::Prices,
                    data_hash,
                    SyncStatus::Ignored,
                    SyncMeta::all_ignored(fetched),
                )
                .await
            }
            Decision::Apply { stored_rows } => {
                let entries = dedupe_prices(normalize_prices(records)?);
                let mut meta = SyncMeta::with_fetched(fetched);
                self.apply_price_rows(entries, stored_rows, force_incremental, &mut meta)
                    .await?;
                self.record_log(SyncType::Prices, data_hash, SyncStatus::Success, meta)
                    .await
            }
        }
    }

    async fn sync_stock(&self, force_incremental: bool) -> Result<SyncLog> {
        let guids = self.resolve_guids().await?;

        let records = self.source.fetch_stock(&guids.warehouse).await?;
        debug!("Fetched {} stock records", records.len());

        let data_hash = payload_fingerprint(&records)?;
        let fetched = records.len() as u64;

        match self
            .decide(SyncType::Stock, &data_hash, force_incremental, self.stock.count())
            .await?
        {
            Decision::Unchanged => {
                info!("Snapshot hash matches the latest recorded run, skipping");
                self.record_log(
                    SyncType::Stock,
                    data_hash,
                    SyncStatus::Ignored,
                    SyncMeta::all_ignored(fetched),
                )
                .await
            }
            Decision::Apply { stored_rows } => {
                let levels = dedupe_stock(normalize_stock(records)?);
                let mut meta = SyncMeta::with_fetched(fetched);
                self.apply_stock_rows(levels, stored_rows, force_incremental, &mut meta)
                    .await?;
                self.record_log(SyncType::Stock, data_hash, SyncStatus::Success, meta)
                    .await
            }
        }
    }

    /// Shared driver for the four catalog-shaped sync types
    ///
    /// Fingerprints the raw records, short-circuits unchanged snapshots
    /// into an ignored log entry, and otherwise normalizes and applies
    /// the snapshot before recording the run.
    async fn run_catalog_snapshot<R, Rec, N>(
        &self,
        sync_type: SyncType,
        repo: &R,
        records: Vec<Rec>,
        force_incremental: bool,
        normalize: N,
    ) -> Result<SyncLog>
    where
        R: CatalogRepository,
        Rec: Serialize,
        N: FnOnce(Vec<Rec>) -> Result<Vec<R::Row>>,
    {
        let data_hash = payload_fingerprint(&records)?;
        let fetched = records.len() as u64;

        match self
            .decide(sync_type, &data_hash, force_incremental, repo.count())
            .await?
        {
            Decision::Unchanged => {
                info!("Snapshot hash matches the latest recorded run, skipping");
                self.record_log(
                    sync_type,
                    data_hash,
                    SyncStatus::Ignored,
                    SyncMeta::all_ignored(fetched),
                )
                .await
            }
            Decision::Apply { stored_rows } => {
                let rows = normalize(records)?;
                let mut meta = SyncMeta::with_fetched(fetched);
                self.apply_catalog_rows(repo, rows, stored_rows, force_incremental, &mut meta)
                    .await?;
                self.record_log(sync_type, data_hash, SyncStatus::Success, meta)
                    .await
            }
        }
    }

    /// Compare the payload hash with the latest recorded run and count
    /// the stored rows; the two reads are independent and run
    /// concurrently
    async fn decide<F>(
        &self,
        sync_type: SyncType,
        data_hash: &str,
        force_incremental: bool,
        count: F,
    ) -> Result<Decision>
    where
        F: Future<Output = core_catalog::Result<i64>>,
    {
        let (latest, stored_rows) =
            tokio::try_join!(self.sync_logs.find_latest_by_type(sync_type), count)?;

        let unchanged = latest.is_some_and(|log| log.data_hash == data_hash);
        if unchanged && !force_incremental {
            return Ok(Decision::Unchanged);
        }
        Ok(Decision::Apply { stored_rows })
    }

    /// Apply a normalized catalog snapshot to its mirror table
    async fn apply_catalog_rows<R>(
        &self,
        repo: &R,
        rows: Vec<R::Row>,
        stored_rows: i64,
        force_incremental: bool,
        meta: &mut SyncMeta,
    ) -> Result<()>
    where
        R: CatalogRepository,
    {
        if stored_rows == 0 && !force_incremental {
            info!("Store is empty, loading the full snapshot in one transaction");
            repo.insert_batch(&rows).await?;
            meta.created = rows.len() as u64;
            return Ok(());
        }

        let stored: HashMap<String, RowVersion> = repo
            .versions()
            .await?
            .into_iter()
            .map(|version| (version.id.clone(), version))
            .collect();
        debug!(
            "Reconciling {} fetched rows against {} stored rows",
            rows.len(),
            stored.len()
        );

        for level in separate_into_levels(rows)? {
            for row in level.items {
                match stored.get(row.id()) {
                    None => {
                        repo.insert(&row).await?;
                        meta.created += 1;
                    }
                    Some(current) => {
                        if current.data_version != row.data_version() {
                            repo.update(&row).await?;
                            meta.updated += 1;
                        }
                        // The deletion-mark check is independent of the
                        // version check; one row can take both a rewrite
                        // and a flag flip in the same run.
                        if current.deletion_mark != row.deletion_mark() {
                            repo.set_deletion_mark(row.id(), row.deletion_mark()).await?;
                            meta.marked_deleted += 1;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Apply deduplicated price entries keyed by nomenclature item
    async fn apply_price_rows(
        &self,
        entries: Vec<PriceEntry>,
        stored_rows: i64,
        force_incremental: bool,
        meta: &mut SyncMeta,
    ) -> Result<()> {
        if stored_rows == 0 && !force_incremental {
            info!("Price store is empty, loading the full snapshot in one transaction");
            self.prices.insert_batch(&entries).await?;
            meta.created = entries.len() as u64;
            return Ok(());
        }

        let stored: HashMap<String, PriceEntry> = self
            .prices
            .find_all()
            .await?
            .into_iter()
            .map(|entry| (entry.nomenclature_id.clone(), entry))
            .collect();

        for entry in entries {
            match stored.get(&entry.nomenclature_id) {
                None => {
                    self.prices.insert(&entry).await?;
                    meta.created += 1;
                }
                Some(current) if *current != entry => {
                    self.prices.update(&entry).await?;
                    meta.updated += 1;
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Apply deduplicated stock levels keyed by nomenclature item
    async fn apply_stock_rows(
        &self,
        levels: Vec<StockLevel>,
        stored_rows: i64,
        force_incremental: bool,
        meta: &mut SyncMeta,
    ) -> Result<()> {
        if stored_rows == 0 && !force_incremental {
            info!("Stock store is empty, loading the full snapshot in one transaction");
            self.stock.insert_batch(&levels).await?;
            meta.created = levels.len() as u64;
            return Ok(());
        }

        let stored: HashMap<String, StockLevel> = self
            .stock
            .find_all()
            .await?
            .into_iter()
            .map(|level| (level.nomenclature_id.clone(), level))
            .collect();

        for level in levels {
            match stored.get(&level.nomenclature_id) {
                None => {
                    self.stock.insert(&level).await?;
                    meta.created += 1;
                }
                Some(current) if *current != level => {
                    self.stock.update(&level).await?;
                    meta.updated += 1;
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Write the final log row; a run whose log row is not returned by
    /// the insert counts as failed
    async fn record_log(
        &self,
        sync_type: SyncType,
        data_hash: String,
        status: SyncStatus,
        metadata: SyncMeta,
    ) -> Result<SyncLog> {
        let log = SyncLog::new(sync_type, data_hash, status, metadata);
        self.sync_logs
            .insert(&log)
            .await?
            .ok_or(SyncError::LogNotRecorded)
    }
}

// =============================================================================
// Tests
// =============================================================================
