//! HTTP transport seam for the OData client
//!
//! The client reaches 1C through this trait so tests can swap the network
//! out for a mock. 1C OData reads are plain GETs; the URL carries the whole
//! query and the headers carry authorization.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::error::{ODataError, Result};

/// Raw HTTP response as the transport hands it back
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Minimal GET transport
///
/// Implementations report connection-level failures as errors and leave
/// status-code handling to the caller.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: String, headers: Vec<(String, String)>) -> Result<HttpResponse>;
}

/// Reqwest-backed transport
///
/// Provides connection pooling and TLS via reqwest. Retry lives in the
/// OData client, not here.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with the default 30 second timeout
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a transport with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent("catalog-sync/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }

    /// Wrap an already configured reqwest client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: String, headers: Vec<(String, String)>) -> Result<HttpResponse> {
        let mut request = self.client.get(&url);
        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ODataError::Transport("Request timed out".to_string())
            } else if e.is_connect() {
                ODataError::Transport(format!("Connection failed: {}", e))
            } else {
                ODataError::Transport(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ODataError::Transport(e.to_string()))?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}
