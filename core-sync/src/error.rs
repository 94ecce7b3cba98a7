use core_catalog::CatalogError;
use thiserror::Error;

use crate::source::SourceError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Caller lacks the administrator role required for sync operations")]
    Forbidden,

    #[error("No site settings have been saved")]
    SettingsNotFound,

    #[error("Missing sync guid in settings: {path}")]
    MissingGuid { path: &'static str },

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Catalog store error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Hierarchy cycle detected at item {id}")]
    HierarchyCycle { id: String },

    #[error("Failed to normalize record {id}: {reason}")]
    Normalize { id: String, reason: String },

    #[error("Failed to fingerprint payload: {0}")]
    Fingerprint(String),

    #[error("Sync finished but its log entry was not recorded")]
    LogNotRecorded,
}

pub type Result<T> = std::result::Result<T, SyncError>;
