//! gRPC channel connector for Workload API endpoints.
//!
//! Supported transports:
//! - `unix:///path` (Unix domain sockets; Unix platforms only)
//! - `tcp://1.2.3.4:port`
//!
//! Channels are built lazily: no connection is attempted until the first request is
//! issued, so an unreachable agent surfaces as a gRPC status on that request.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
#[cfg(unix)]
use std::path::PathBuf;
#[cfg(unix)]
use std::sync::Arc;

#[cfg(unix)]
use hyper_util::rt::TokioIo;
#[cfg(unix)]
use tokio::net::UnixStream;
use tonic::transport::{Channel, Endpoint as TonicEndpoint};
#[cfg(unix)]
use tonic::transport::Uri;
#[cfg(unix)]
use tower::service_fn;

use crate::endpoint::Endpoint;
use crate::transport::TransportError;

// tonic requires an HTTP URI even when the connector ignores it.
#[cfg(unix)]
const TONIC_DUMMY_URI: &str = "http://[::]:50051";

/// Builds a lazily-connecting `tonic` gRPC channel for `endpoint`.
///
/// Must be called from within a Tokio runtime.
///
/// ## Errors
///
/// Returns [`TransportError`] if the endpoint transport is unsupported on the current
/// platform or the tonic endpoint could not be constructed.
pub fn connect_lazy(endpoint: &Endpoint) -> Result<Channel, TransportError> {
    match endpoint {
        Endpoint::Unix(path) => connect_unix(path),
        Endpoint::Tcp { host, port } => connect_tcp(*host, *port),
    }
}

fn connect_tcp(host: IpAddr, port: u16) -> Result<Channel, TransportError> {
    let uri = format!("http://{}", SocketAddr::new(host, port));
    Ok(TonicEndpoint::try_from(uri)?.connect_lazy())
}

#[cfg(not(unix))]
fn connect_unix(_path: &Path) -> Result<Channel, TransportError> {
    Err(TransportError::UnsupportedEndpointTransport { scheme: "unix" })
}

#[cfg(unix)]
fn connect_unix(path: &Path) -> Result<Channel, TransportError> {
    let path: Arc<PathBuf> = Arc::new(path.to_path_buf());

    let channel = TonicEndpoint::try_from(TONIC_DUMMY_URI)?.connect_with_connector_lazy(
        service_fn(move |_: Uri| {
            let path = Arc::clone(&path);
            async move {
                let stream = UnixStream::connect(path.as_path()).await?;
                Ok::<_, std::io::Error>(TokioIo::new(stream))
            }
        }),
    );

    Ok(channel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_channel_for_missing_unix_socket_without_connecting() {
        let endpoint = Endpoint::parse("unix:/nonexistent/spire-agent/api.sock").unwrap();
        assert!(connect_lazy(&endpoint).is_ok());
    }

    #[tokio::test]
    async fn builds_channel_for_tcp_ipv6_endpoint() {
        let endpoint = Endpoint::parse("tcp://[::1]:8081").unwrap();
        assert!(connect_lazy(&endpoint).is_ok());
    }
}
