//! Error types for the 1C OData provider

use core_sync::source::SourceError;
use thiserror::Error;

/// 1C OData provider errors
#[derive(Error, Debug)]
pub enum ODataError {
    /// The request never produced a usable response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success HTTP status
    #[error("OData request failed (status {status_code}): {message}")]
    Status { status_code: u16, message: String },

    /// The server embedded an `odata.error` payload in the response body
    #[error("OData query rejected [{code}]: {message}")]
    Rejected { code: String, message: String },

    /// The response body could not be decoded
    #[error("Failed to decode OData response: {0}")]
    Decode(String),
}

/// Result type for OData operations
pub type Result<T> = std::result::Result<T, ODataError>;

impl From<ODataError> for SourceError {
    fn from(error: ODataError) -> Self {
        match error {
            ODataError::Transport(message) => SourceError::Request(message),
            ODataError::Status {
                status_code,
                message,
            } => SourceError::Request(format!("status {}: {}", status_code, message)),
            ODataError::Rejected { code, message } => SourceError::Rejected { code, message },
            ODataError::Decode(message) => SourceError::Malformed(message),
        }
    }
}
