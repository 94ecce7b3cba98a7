//! # Catalog Sync Service
//!
//! Service façade wiring the sync engine to its concrete dependencies: the
//! SQLite catalog pool and the 1C OData source. Embedders construct a
//! [`SyncService`] once and call its methods; everything behind it (HTTP
//! transport, migrations, repositories) is assembled here.
//!
//! ## Components
//!
//! - **Service** (`lib`): [`SyncService`] façade over the sync engine
//! - **Config** (`config`): [`ServiceConfig`] builder and environment loading
//! - **Logging** (`logging`): `tracing` subscriber setup
//! - **Error** (`error`): [`ServiceError`] aggregating the workspace error types
//!
//! ## Usage
//!
//! ```ignore
//! use core_service::{ServiceConfig, SyncService};
//!
//! let config = ServiceConfig::from_env()?;
//! let service = SyncService::connect(config).await?;
//! let reports = service.sync_all(core_service::Role::Admin, false).await;
//! ```

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use error::{Result, ServiceError};
pub use logging::{init_logging, LogFormat, LoggingConfig};

// The façade's vocabulary is the workspace's: re-export the types callers
// need to drive it without depending on the inner crates directly.
pub use core_catalog::models::{SettingsRecord, SiteSettings, SyncLog, SyncStatus, SyncType};
pub use core_catalog::repositories::{Page, PageRequest};
pub use core_sync::{Role, SyncReport};

use std::sync::Arc;

use core_catalog::db::{create_pool, DatabaseConfig};
use core_sync::{CatalogSource, SyncEngine};
use provider_odata::{ODataCatalogSource, ODataClient, ReqwestTransport};
use sqlx::SqlitePool;
use tracing::info;

/// Primary façade exposed to host applications.
///
/// Cheap to clone; all clones share the engine and its connection pool.
#[derive(Clone)]
pub struct SyncService {
    engine: Arc<SyncEngine>,
}

impl SyncService {
    /// Create a service from explicit dependencies.
    ///
    /// Useful for tests and for embedders that manage their own pool or
    /// source implementation. [`SyncService::connect`] is the usual entry
    /// point.
    pub fn new(pool: SqlitePool, source: Arc<dyn CatalogSource>) -> Self {
        Self {
            engine: Arc::new(SyncEngine::new(pool, source)),
        }
    }

    /// Open the database and build the OData source from configuration.
    ///
    /// Runs pending migrations and verifies connectivity before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the database
    /// cannot be opened.
    pub async fn connect(config: ServiceConfig) -> Result<Self> {
        config.validate()?;

        let pool = create_pool(DatabaseConfig::new(&config.database_path)).await?;

        let transport = Arc::new(ReqwestTransport::with_timeout(config.http_timeout));
        let client = ODataClient::new(transport, config.odata_base_url, config.odata_auth_header)
            .with_max_retries(config.max_retries);
        let source = Arc::new(ODataCatalogSource::new(client));

        info!("Sync service initialized");
        Ok(Self::new(pool, source))
    }

    /// Run one sync type.
    ///
    /// See [`SyncEngine::sync`] for the run semantics.
    pub async fn sync(
        &self,
        role: Role,
        sync_type: SyncType,
        force_incremental: bool,
    ) -> Result<SyncLog> {
        Ok(self.engine.sync(role, sync_type, force_incremental).await?)
    }

    /// Run every sync type in dependency order, collecting per-type outcomes.
    pub async fn sync_all(&self, role: Role, force_incremental: bool) -> Vec<SyncReport> {
        self.engine.sync_all(role, force_incremental).await
    }

    /// Page through recorded runs for one sync type, newest first.
    pub async fn history(
        &self,
        sync_type: SyncType,
        page_request: PageRequest,
    ) -> Result<Page<SyncLog>> {
        Ok(self.engine.history(sync_type, page_request).await?)
    }

    /// Total recorded runs for one sync type.
    pub async fn history_total(&self, sync_type: SyncType) -> Result<i64> {
        Ok(self.engine.history_total(sync_type).await?)
    }

    /// Latest stored settings document, if any.
    pub async fn latest_settings(&self) -> Result<Option<SettingsRecord>> {
        Ok(self.engine.latest_settings().await?)
    }

    /// Store a new settings revision. Requires the administrator role.
    pub async fn save_settings(&self, role: Role, settings: &SiteSettings) -> Result<SettingsRecord> {
        Ok(self.engine.save_settings(role, settings).await?)
    }
}
