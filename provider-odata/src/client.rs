//! 1C OData protocol client
//!
//! Owns URL construction, retry, and envelope decoding. Query options are
//! concatenated without URL-encoding: 1C's OData dialect rejects encoded
//! `$filter` expressions, so the strings go on the wire as written.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{ODataError, Result};
use crate::transport::{HttpResponse, HttpTransport};
use crate::types::Envelope;

/// Default retry ceiling for transient failures
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Query options for one OData read
///
/// Rendered in a fixed order after `$format=json`. Values are used raw;
/// callers write `$filter` expressions exactly as 1C expects them.
#[derive(Debug, Clone, Default)]
pub struct ODataQuery {
    filter: Option<String>,
    select: Option<String>,
    expand: Option<String>,
    order_by: Option<String>,
    top: Option<u32>,
    skip: Option<u32>,
}

impl ODataQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn select(mut self, select: impl Into<String>) -> Self {
        self.select = Some(select.into());
        self
    }

    pub fn expand(mut self, expand: impl Into<String>) -> Self {
        self.expand = Some(expand.into());
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn top(mut self, top: u32) -> Self {
        self.top = Some(top);
        self
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Render the query string, `$format=json` first
    fn to_query_string(&self) -> String {
        let mut params = String::from("$format=json");
        if let Some(filter) = &self.filter {
            params.push_str("&$filter=");
            params.push_str(filter);
        }
        if let Some(select) = &self.select {
            params.push_str("&$select=");
            params.push_str(select);
        }
        if let Some(expand) = &self.expand {
            params.push_str("&$expand=");
            params.push_str(expand);
        }
        if let Some(order_by) = &self.order_by {
            params.push_str("&$orderby=");
            params.push_str(order_by);
        }
        if let Some(top) = self.top {
            params.push_str(&format!("&$top={}", top));
        }
        if let Some(skip) = self.skip {
            params.push_str(&format!("&$skip={}", skip));
        }
        params
    }
}

/// Client for one 1C OData service root
///
/// The `Authorization` header value is sent verbatim on every request; 1C
/// installations commonly hand out prepared Basic credentials.
pub struct ODataClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    auth_header: String,
    max_retries: u32,
}

impl ODataClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        base_url: impl Into<String>,
        auth_header: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: auth_header.into(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Override the retry ceiling
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn build_url(&self, path: &str, query: &ODataQuery) -> String {
        format!("{}/{}?{}", self.base_url, path, query.to_query_string())
    }

    /// Fetch one entity collection
    ///
    /// Decodes the response envelope and surfaces an embedded `odata.error`
    /// as [`ODataError::Rejected`]. 1C reports query errors inside an HTTP
    /// 200, so the envelope check runs on every successful response.
    #[instrument(skip(self, query), fields(path = %path))]
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        query: ODataQuery,
    ) -> Result<Vec<T>> {
        let url = self.build_url(path, &query);
        let response = self.execute_with_retry(url, self.max_retries).await?;
        Self::decode(response)
    }

    /// Execute the request with exponential backoff on transient failures
    ///
    /// HTTP 429, 5xx, and transport errors retry; other statuses return
    /// immediately.
    #[instrument(skip(self), fields(url = %url))]
    async fn execute_with_retry(&self, url: String, max_retries: u32) -> Result<HttpResponse> {
        let mut attempt = 0;

        loop {
            let headers = vec![("Authorization".to_string(), self.auth_header.clone())];

            match self.transport.get(url.clone(), headers).await {
                Ok(response) => {
                    let status = response.status;

                    if status == 200 {
                        debug!("OData request succeeded: status={}", status);
                        return Ok(response);
                    } else if status == 429 || (status >= 500 && status < 600) {
                        // Rate limit or server error - retry with backoff
                        attempt += 1;
                        if attempt >= max_retries {
                            warn!(
                                "OData request failed after {} attempts: status={}",
                                max_retries, status
                            );
                            return Err(ODataError::Status {
                                status_code: status,
                                message: format!("Request failed after {} retries", max_retries),
                            });
                        }

                        let backoff_ms = 100u64 * 2u64.pow(attempt);
                        warn!(
                            "OData request failed (attempt {}/{}): status={}, retrying in {}ms",
                            attempt, max_retries, status, backoff_ms
                        );
                        tokio::time::sleep(tokio::time::Duration::from_millis(backoff_ms)).await;
                    } else {
                        // Client error - don't retry
                        warn!("OData request failed: status={}", status);
                        return Err(ODataError::Status {
                            status_code: status,
                            message: String::from_utf8_lossy(&response.body).to_string(),
                        });
                    }
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_retries {
                        warn!("OData request failed after {} attempts: {}", max_retries, e);
                        return Err(e);
                    }

                    let backoff_ms = 100u64 * 2u64.pow(attempt);
                    warn!(
                        "OData request failed (attempt {}/{}): {}, retrying in {}ms",
                        attempt, max_retries, e, backoff_ms
                    );
                    tokio::time::sleep(tokio::time::Duration::from_millis(backoff_ms)).await;
                }
            }
        }
    }

    fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<Vec<T>> {
        let envelope: Envelope<T> = serde_json::from_slice(&response.body)
            .map_err(|e| ODataError::Decode(format!("Failed to parse OData envelope: {}", e)))?;

        if let Some(error) = envelope.error {
            return Err(ODataError::Rejected {
                code: error.code,
                message: error.message.value,
            });
        }

        envelope.value.ok_or_else(|| {
            ODataError::Decode("Response carries neither value nor odata.error".to_string())
        })
    }
}
