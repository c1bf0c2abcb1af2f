//! Workload API endpoint parsing and validation.
//!
//! An [`Endpoint`] is the validated, connectable form of an
//! [`EndpointAddress`](crate::workload_api::endpoint::EndpointAddress). Only the two transports
//! defined by the SPIFFE Workload Endpoint standard are accepted: `unix:` and `tcp:`.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

const TCP_SCHEME: &str = "tcp";
const UNIX_SCHEME: &str = "unix";

/// Parsed Workload API endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// UNIX domain socket endpoint.
    Unix(PathBuf),

    /// TCP endpoint (host must be an IP address).
    Tcp {
        /// IP address of the endpoint.
        host: IpAddr,
        /// TCP port of the endpoint.
        port: u16,
    },
}

/// Errors returned by [`Endpoint::parse`].
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum EndpointError {
    /// The input could not be parsed as a valid URI.
    #[error("endpoint socket is not a valid URI")]
    Parse(#[from] url::ParseError),

    /// The URI scheme is not supported.
    #[error("endpoint socket URI scheme must be unix: or tcp:")]
    InvalidScheme,

    /// User info (`user:pass@...`) is not allowed.
    #[error("endpoint socket URI must not include user info")]
    HasUserInfo,

    /// Query values are not allowed.
    #[error("endpoint socket URI must not include query values")]
    HasQuery,

    /// Fragments are not allowed.
    #[error("endpoint socket URI must not include a fragment")]
    HasFragment,

    /// UNIX endpoints must not include an authority/host.
    #[error("unix: endpoint socket URI must not include an authority")]
    UnixAuthorityNotAllowed,

    /// UNIX endpoints must include a non-empty absolute path.
    #[error("unix: endpoint socket URI must include a path")]
    UnixMissingPath,

    /// TCP endpoints must use an IP address (not a hostname).
    #[error("tcp: endpoint socket URI host must be an IP address")]
    TcpHostNotIp,

    /// TCP endpoints must include a port.
    #[error("tcp: endpoint socket URI must include a port")]
    TcpMissingPort,

    /// TCP endpoints must not include a non-empty path.
    #[error("tcp: endpoint socket URI must not include a path")]
    TcpUnexpectedPath,
}

impl Endpoint {
    /// Parses and validates a Workload API endpoint URI.
    ///
    /// ## Accepted formats
    ///
    /// - `unix:///path/to/socket`
    /// - `unix:/path/to/socket`
    /// - `tcp://1.2.3.4:8081`
    /// - `tcp:1.2.3.4:8081`
    ///
    /// ## Errors
    ///
    /// Returns an [`EndpointError`] if the input is not a valid URI, uses a scheme other than
    /// `unix` or `tcp`, carries user info, query values or a fragment, or does not satisfy
    /// the rules of its scheme.
    pub fn parse(input: &str) -> Result<Self, EndpointError> {
        let normalized = normalize_endpoint_uri(input);
        let url = Url::parse(&normalized)?;

        if !url.username().is_empty() || url.password().is_some() {
            return Err(EndpointError::HasUserInfo);
        }
        if url.query().is_some() {
            return Err(EndpointError::HasQuery);
        }
        if url.fragment().is_some() {
            return Err(EndpointError::HasFragment);
        }

        match url.scheme() {
            UNIX_SCHEME => {
                if url.host_str().is_some_and(|h| !h.is_empty()) {
                    return Err(EndpointError::UnixAuthorityNotAllowed);
                }

                // `unix:tmp/sock` lands here with a relative path.
                let path = url.path();
                if path.is_empty() || path == "/" || !path.starts_with('/') {
                    return Err(EndpointError::UnixMissingPath);
                }

                Ok(Self::Unix(PathBuf::from(path)))
            }

            TCP_SCHEME => {
                let host = match url.host() {
                    Some(url::Host::Ipv4(ipv4)) => IpAddr::V4(ipv4),
                    Some(url::Host::Ipv6(ipv6)) => IpAddr::V6(ipv6),
                    // Non-special schemes keep IPv4 literals as opaque domains.
                    Some(url::Host::Domain(domain)) => {
                        IpAddr::from_str(domain).map_err(|_| EndpointError::TcpHostNotIp)?
                    }
                    None => return Err(EndpointError::TcpHostNotIp),
                };
                let port = url.port().ok_or(EndpointError::TcpMissingPort)?;

                let path = url.path();
                if !path.is_empty() && path != "/" {
                    return Err(EndpointError::TcpUnexpectedPath);
                }

                Ok(Self::Tcp { host, port })
            }

            _ => Err(EndpointError::InvalidScheme),
        }
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
            Self::Tcp { host, port } => write!(f, "tcp://{}", SocketAddr::new(*host, *port)),
        }
    }
}

fn normalize_endpoint_uri(input: &str) -> String {
    // Accept the shorthand `unix:/path` by rewriting it into a valid URL.
    if let Some(rest) = input.strip_prefix("unix:/") {
        if !rest.starts_with('/') {
            return format!("unix:///{rest}");
        }
    }

    // Accept the shorthand `tcp:IP:PORT` by rewriting it into a valid URL.
    if let Some(rest) = input.strip_prefix("tcp:") {
        if !rest.starts_with("//") {
            return format!("tcp://{rest}");
        }
    }

    input.to_owned()
}
