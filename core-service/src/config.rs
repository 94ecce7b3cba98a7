//! # Service Configuration Module
//!
//! Configuration for wiring the catalog mirror to a 1C installation.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `ServiceConfig` instance holding everything [`SyncService::connect`]
//! needs: the mirror database path and the OData endpoint credentials. It
//! enforces fail-fast validation so a misconfigured service never reaches
//! the first sync run.
//!
//! [`SyncService::connect`]: crate::SyncService::connect
//!
//! ## Usage
//!
//! ```no_run
//! use core_service::ServiceConfig;
//! use std::time::Duration;
//!
//! let config = ServiceConfig::builder()
//!     .database_path("/var/lib/catalog/mirror.db")
//!     .odata_base_url("https://erp.example/base/odata/standard.odata")
//!     .odata_auth_header("Basic dXNlcjpwYXNz")
//!     .http_timeout(Duration::from_secs(60))
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! Deployments that configure through the environment use
//! [`ServiceConfig::from_env`], which reads `CATALOG_DATABASE_PATH`,
//! `ODATA_API_URL` and `ODATA_API_AUTH_HEADER`.

use crate::error::{Result, ServiceError};
use std::path::PathBuf;
use std::time::Duration;

/// Default HTTP request timeout against the OData endpoint
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default retry ceiling for transient OData failures
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Service configuration for the catalog sync facade.
///
/// Use [`ServiceConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Path to the SQLite mirror database file
    pub database_path: PathBuf,

    /// OData service root of the 1C installation
    pub odata_base_url: String,

    /// Full `Authorization` header value, sent verbatim
    pub odata_auth_header: String,

    /// Per-request HTTP timeout
    pub http_timeout: Duration,

    /// Retry ceiling for transient OData failures
    pub max_retries: u32,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("database_path", &self.database_path)
            .field("odata_base_url", &self.odata_base_url)
            .field("odata_auth_header", &"[REDACTED]")
            .field("http_timeout", &self.http_timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl ServiceConfig {
    /// Creates a new builder for constructing a `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Builds a configuration from environment variables.
    ///
    /// Reads `CATALOG_DATABASE_PATH`, `ODATA_API_URL` and
    /// `ODATA_API_AUTH_HEADER`; timeout and retries keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error naming the first missing variable.
    pub fn from_env() -> Result<Self> {
        let database_path = require_env("CATALOG_DATABASE_PATH")?;
        let base_url = require_env("ODATA_API_URL")?;
        let auth_header = require_env("ODATA_API_AUTH_HEADER")?;

        Self::builder()
            .database_path(database_path)
            .odata_base_url(base_url)
            .odata_auth_header(auth_header)
            .build()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ServiceError::Config(
                "Database path cannot be empty".to_string(),
            ));
        }

        if !self.odata_base_url.starts_with("http://")
            && !self.odata_base_url.starts_with("https://")
        {
            return Err(ServiceError::Config(
                "OData base URL must start with http:// or https://".to_string(),
            ));
        }

        if self.odata_auth_header.is_empty() {
            return Err(ServiceError::Config(
                "OData authorization header cannot be empty".to_string(),
            ));
        }

        if self.http_timeout.is_zero() {
            return Err(ServiceError::Config(
                "HTTP timeout must be greater than zero".to_string(),
            ));
        }

        if self.max_retries == 0 {
            return Err(ServiceError::Config(
                "Retry ceiling must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| ServiceError::Config(format!("{} is not set", name)))
}

/// Builder for constructing [`ServiceConfig`] instances.
///
/// Validates required fields on [`build()`](ServiceConfigBuilder::build)
/// and produces actionable error messages when something is missing.
#[derive(Default)]
pub struct ServiceConfigBuilder {
    database_path: Option<PathBuf>,
    odata_base_url: Option<String>,
    odata_auth_header: Option<String>,
    http_timeout: Option<Duration>,
    max_retries: Option<u32>,
}

impl ServiceConfigBuilder {
    /// Sets the mirror database path.
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the OData service root URL.
    ///
    /// A trailing slash is tolerated; the provider trims it.
    pub fn odata_base_url(mut self, url: impl Into<String>) -> Self {
        self.odata_base_url = Some(url.into());
        self
    }

    /// Sets the `Authorization` header value sent with every OData request.
    ///
    /// The value goes on the wire verbatim, so it must already carry the
    /// scheme, e.g. `Basic dXNlcjpwYXNz`.
    pub fn odata_auth_header(mut self, header: impl Into<String>) -> Self {
        self.odata_auth_header = Some(header.into());
        self
    }

    /// Sets the per-request HTTP timeout.
    ///
    /// Default: 30 seconds.
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// Sets the retry ceiling for transient OData failures.
    ///
    /// Default: 3 attempts.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Builds the final `ServiceConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error with an actionable message if a required
    /// field is missing or a value is invalid.
    pub fn build(self) -> Result<ServiceConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            ServiceError::Config(
                "Database path is required. Use .database_path() to set it.".to_string(),
            )
        })?;

        let odata_base_url = self.odata_base_url.ok_or_else(|| {
            ServiceError::Config(
                "OData base URL is required. Use .odata_base_url() to set it.".to_string(),
            )
        })?;

        let odata_auth_header = self.odata_auth_header.ok_or_else(|| {
            ServiceError::Config(
                "OData authorization header is required. Use .odata_auth_header() to set it."
                    .to_string(),
            )
        })?;

        let config = ServiceConfig {
            database_path,
            odata_base_url,
            odata_auth_header,
            http_timeout: self.http_timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT),
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
        };

        config.validate()?;

        Ok(config)
    }
}
