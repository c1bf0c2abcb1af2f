//! One-shot retrieval of the workload's default X.509-SVID summary.
//!
//! [`SvidFetcher::fetch`] runs one connect/fetch/release cycle against the Workload API:
//!
//! 1. parse the [`EndpointAddress`] into an [`Endpoint`] and open a client bound to it,
//! 2. fetch the [`X509Context`],
//! 3. select the default SVID and check that its chain has a leaf,
//! 4. reduce it to an [`SvidInfo`].
//!
//! The client is dropped before `fetch` returns, on success and on every error path. Nothing
//! is cached between calls and failures are never retried.
//!
//! The connection step is abstracted by [`Connect`] and the fetch step by
//! [`FetchX509Context`], so alternative transports can be plugged in with
//! [`SvidFetcher::with_connector`].

mod error;

use std::future::Future;

pub use error::{SvidFetchError, SvidFetchErrorKind};

use crate::endpoint::Endpoint;
use crate::prelude::{debug, error, info};
use crate::workload_api::endpoint::EndpointAddress;
use crate::workload_api::error::WorkloadApiError;
use crate::workload_api::x509_context::X509Context;
use crate::{SvidInfo, WorkloadApiClient, X509SvidError};

/// Opens a Workload API client bound to an [`Endpoint`].
///
/// The returned client is owned by a single fetch and dropped when it ends; implementations
/// release their resources in `Drop`.
pub trait Connect {
    /// Client produced by this connector.
    type Client: FetchX509Context + Send + Sync;

    /// Opens a client for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkloadApiError`] if no client can be built for the endpoint.
    fn connect(&self, endpoint: &Endpoint) -> Result<Self::Client, WorkloadApiError>;
}

/// Fetches the X.509 context of the calling workload.
pub trait FetchX509Context {
    /// Performs one `FetchX509SVID` round trip and returns the parsed context.
    fn fetch_x509_context(
        &self,
    ) -> impl Future<Output = Result<X509Context, WorkloadApiError>> + Send;
}

impl FetchX509Context for WorkloadApiClient {
    fn fetch_x509_context(
        &self,
    ) -> impl Future<Output = Result<X509Context, WorkloadApiError>> + Send {
        WorkloadApiClient::fetch_x509_context(self)
    }
}

/// [`Connect`] implementation backed by a `tonic` channel to the Workload API.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrpcConnector;

impl Connect for GrpcConnector {
    type Client = WorkloadApiClient;

    fn connect(&self, endpoint: &Endpoint) -> Result<Self::Client, WorkloadApiError> {
        WorkloadApiClient::new(endpoint.clone())
    }
}

/// Fetches the SPIFFE ID and expiration of the workload's default X.509-SVID.
///
/// Stateless across calls: concurrent calls each open and drop their own client.
#[derive(Debug, Clone, Default)]
pub struct SvidFetcher<C = GrpcConnector> {
    connector: C,
}

impl SvidFetcher {
    /// Creates a fetcher that talks gRPC to the Workload API.
    pub fn new() -> Self {
        Self {
            connector: GrpcConnector,
        }
    }
}

impl<C: Connect> SvidFetcher<C> {
    /// Creates a fetcher using `connector` to open Workload API clients.
    pub fn with_connector(connector: C) -> Self {
        Self { connector }
    }

    /// Fetches the default X.509-SVID from the Workload API at `address` and returns its
    /// SPIFFE ID and leaf certificate expiration.
    ///
    /// No timeout is applied; wrap the call in `tokio::time::timeout` to bound it.
    ///
    /// # Errors
    ///
    /// - [`SvidFetchError::InvalidEndpoint`] if `address` is not a valid endpoint URI or no
    ///   transport can be built for it.
    /// - [`SvidFetchError::ContextFetchFailed`] if the Workload API is unreachable, denies the
    ///   request, returns no SVID, or returns material that cannot be parsed.
    /// - [`SvidFetchError::EmptyCertificateChain`] if the default SVID has no certificate.
    /// - [`SvidFetchError::UnexpectedFailure`] for anything else.
    pub async fn fetch(&self, address: &EndpointAddress) -> Result<SvidInfo, SvidFetchError> {
        debug!("Using Workload API address {}", address);

        match self.fetch_svid_info(address).await {
            Ok(svid_info) => {
                info!("Resolved SPIFFE ID: {}", svid_info.spiffe_id());
                info!("X.509-SVID expires at {}", svid_info.expires_at());
                Ok(svid_info)
            }
            Err(e) => {
                error!("Failed to fetch X.509-SVID ({:?}): {}", e.kind(), e);
                Err(e)
            }
        }
    }

    async fn fetch_svid_info(&self, address: &EndpointAddress) -> Result<SvidInfo, SvidFetchError> {
        let client = self.connect(address)?;

        debug!("Fetching X.509 context");
        let context = client
            .fetch_x509_context()
            .await
            .map_err(classify_fetch_error)?;
        drop(client);

        svid_info_from_context(&context)
    }

    fn connect(&self, address: &EndpointAddress) -> Result<C::Client, SvidFetchError> {
        let invalid_endpoint = |source| SvidFetchError::InvalidEndpoint {
            address: address.to_string(),
            source,
        };

        let endpoint = Endpoint::parse(address.as_str())
            .map_err(|e| invalid_endpoint(WorkloadApiError::Endpoint(e)))?;

        self.connector.connect(&endpoint).map_err(|e| match e {
            WorkloadApiError::Endpoint(_) | WorkloadApiError::Transport(_) => invalid_endpoint(e),
            other => SvidFetchError::unexpected(other),
        })
    }
}

/// Fetches the default X.509-SVID summary from the Workload API at `address` over gRPC.
///
/// Shorthand for `SvidFetcher::new().fetch(address)`.
///
/// # Errors
///
/// See [`SvidFetcher::fetch`].
pub async fn fetch_svid_info(address: &EndpointAddress) -> Result<SvidInfo, SvidFetchError> {
    SvidFetcher::new().fetch(address).await
}

fn classify_fetch_error(e: WorkloadApiError) -> SvidFetchError {
    match e {
        WorkloadApiError::X509Svid(X509SvidError::EmptyChain) => {
            SvidFetchError::EmptyCertificateChain
        }
        WorkloadApiError::EmptyResponse
        | WorkloadApiError::NoIdentityIssued
        | WorkloadApiError::PermissionDenied(_)
        | WorkloadApiError::Transport(_)
        | WorkloadApiError::X509Svid(_)
        | WorkloadApiError::X509Bundle(_)
        | WorkloadApiError::SpiffeId(_) => SvidFetchError::ContextFetchFailed { source: e },
        other => SvidFetchError::unexpected(other),
    }
}

fn svid_info_from_context(context: &X509Context) -> Result<SvidInfo, SvidFetchError> {
    let svid = context
        .default_svid()
        .ok_or(SvidFetchError::ContextFetchFailed {
            source: WorkloadApiError::EmptyResponse,
        })?;

    if svid.cert_chain().is_empty() {
        return Err(SvidFetchError::EmptyCertificateChain);
    }
    let expires_at = svid.leaf().not_after().map_err(SvidFetchError::unexpected)?;

    Ok(SvidInfo::new(svid.spiffe_id().clone(), expires_at))
}
