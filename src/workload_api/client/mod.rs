//! Workload API client for fetching SPIFFE X.509 material.
//!
//! A single workload may be issued **multiple SVIDs** by the SPIFFE Workload API. When this
//! happens, the agent may attach an optional **hint** to each SVID to help distinguish identities.
//! Hints are **not part of the cryptographic material** and have no security meaning.

mod header;
mod x509;

use tonic::service::interceptor::InterceptedService;
use tonic::transport::Channel;

use crate::endpoint::Endpoint;
use crate::transport::connect_lazy;
use crate::workload_api::client::header::MetadataAdder;
use crate::workload_api::error::WorkloadApiError;
use crate::workload_api::pb::workload::spiffe_workload_api_client::SpiffeWorkloadApiClient;

/// Client for the SPIFFE Workload API.
///
/// The underlying channel connects lazily: building a client never touches the network, and
/// an unreachable agent surfaces as an error from the first fetch. Dropping the client
/// releases the channel.
#[derive(Debug, Clone)]
pub struct WorkloadApiClient {
    endpoint: Endpoint,
    client: SpiffeWorkloadApiClient<InterceptedService<Channel, MetadataAdder>>,
}

impl WorkloadApiClient {
    /// Creates a client bound to a parsed [`Endpoint`].
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadApiError::Transport`] if no channel can be built for the endpoint
    /// (e.g. a `unix:` endpoint on a platform without Unix domain sockets).
    pub fn new(endpoint: Endpoint) -> Result<Self, WorkloadApiError> {
        let channel = connect_lazy(&endpoint)?;
        Ok(Self::new_with_channel(endpoint, channel))
    }

    /// Creates a client for the given endpoint string.
    ///
    /// Examples:
    /// - `unix:/tmp/spire-agent/public/api.sock` or `unix:///tmp/spire-agent/public/api.sock`
    /// - `tcp:127.0.0.1:8081` or `tcp://127.0.0.1:8081`
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadApiError::Endpoint`] if the string is not a valid endpoint URI, or
    /// [`WorkloadApiError::Transport`] if no channel can be built for it.
    pub fn connect_to(endpoint: impl AsRef<str>) -> Result<Self, WorkloadApiError> {
        let endpoint = Endpoint::parse(endpoint.as_ref())?;
        Self::new(endpoint)
    }

    /// Creates a client from an existing gRPC channel.
    ///
    /// The provided channel must be configured to reach the given endpoint.
    pub fn new_with_channel(endpoint: Endpoint, channel: Channel) -> Self {
        Self {
            endpoint,
            client: SpiffeWorkloadApiClient::with_interceptor(channel, MetadataAdder),
        }
    }

    /// Returns the configured Workload API endpoint.
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Extracts the first message from a streaming gRPC response.
    ///
    /// Returns `WorkloadApiError::EmptyResponse` if the stream ends without yielding a message.
    async fn first_message<T>(mut stream: tonic::Streaming<T>) -> Result<T, WorkloadApiError> {
        stream
            .message()
            .await?
            .ok_or(WorkloadApiError::EmptyResponse)
    }
}
