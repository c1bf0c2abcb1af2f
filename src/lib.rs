#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

//! Fetches the default X.509-SVID of the calling workload from the
//! [SPIFFE Workload API](https://github.com/spiffe/spiffe/blob/main/standards/SPIFFE_Workload_API.md)
//! and reports the two facts most consumers need: the SPIFFE ID and the expiration of the
//! leaf certificate.
//!
//! The entry point is [`SvidFetcher`]. It performs one connect/fetch/release cycle per call,
//! with no caching, retry or background refresh.
//!
//! ```no_run
//! use svid_info::{resolve_endpoint_address, SvidFetcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // SPIFFE_ENDPOINT_SOCKET, or unix:/tmp/spire-agent/public/api.sock when unset
//! let address = resolve_endpoint_address();
//!
//! let info = SvidFetcher::new().fetch(&address).await?;
//!
//! println!("{} expires at {}", info.spiffe_id(), info.expires_at());
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **`tracing`** (default): emit diagnostics as `tracing` events.
//! - **`logging`**: emit diagnostics as `log` records (used when `tracing` is disabled).
//! - **`cli`** (default): build the `svid-info` command-line tool.

mod observability;
mod prelude;

pub mod bundle;
pub mod cert;
pub mod constants;
pub mod endpoint;
pub mod fetcher;
pub mod spiffe_id;
pub mod svid;
pub mod svid_info;
pub mod transport;
pub mod workload_api;

// -----------------------
// Re-exports
// -----------------------

pub use crate::{
    bundle::x509::{X509Bundle, X509BundleError, X509BundleSet},
    endpoint::{Endpoint, EndpointError},
    fetcher::{fetch_svid_info, Connect, FetchX509Context, GrpcConnector, SvidFetcher},
    fetcher::{SvidFetchError, SvidFetchErrorKind},
    spiffe_id::{SpiffeId, SpiffeIdError, TrustDomain},
    svid::x509::{X509Svid, X509SvidError},
    svid_info::SvidInfo,
    workload_api::client::WorkloadApiClient,
    workload_api::endpoint::{
        resolve_endpoint_address, resolve_endpoint_address_with, EndpointAddress,
    },
    workload_api::error::WorkloadApiError,
    workload_api::x509_context::X509Context,
};
