//! # 1C OData Provider
//!
//! [`CatalogSource`](core_sync::source::CatalogSource) implementation
//! backed by the standard OData service of a 1C installation.
//!
//! ## Components
//!
//! - **Connector** (`connector`): The seven snapshot fetches with their fixed paths and filters
//! - **Client** (`client`): URL construction, retry, and envelope decoding
//! - **Types** (`types`): Wire entities with the exact 1C field names
//! - **Transport** (`transport`): GET seam over reqwest, mockable in tests
//!
//! ## Protocol notes
//!
//! Every request carries `$format=json` and the configured `Authorization`
//! value verbatim. Query options are concatenated without URL-encoding
//! because 1C's dialect rejects encoded `$filter` expressions. A body
//! containing `odata.error` is an error even under HTTP 200.

pub mod client;
pub mod connector;
pub mod error;
pub mod transport;
pub mod types;

pub use client::{ODataClient, ODataQuery};
pub use connector::ODataCatalogSource;
pub use error::ODataError;
pub use transport::{HttpTransport, ReqwestTransport};
